use bytes::{Buf, Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// A response body that is either a loaded asset or the downstream
    /// handler's body.
    ///
    /// Asset and 404 responses carry their full contents as a single data
    /// frame; delegated responses forward the inner body's frames unchanged.
    #[project = AssetBodyProj]
    #[allow(missing_docs)]
    pub enum AssetBody<B> {
        /// File contents read at response-build time.
        Loaded {
            data: Option<Bytes>,
        },
        /// Downstream response body, forwarded as-is.
        Passthrough {
            #[pin]
            inner: B,
        },
    }
}

impl<B> AssetBody<B> {
    /// Creates a body holding already-read asset contents.
    pub fn loaded(data: Bytes) -> Self {
        Self::Loaded { data: Some(data) }
    }

    /// Creates a body forwarding the downstream handler's body.
    pub fn passthrough(inner: B) -> Self {
        Self::Passthrough { inner }
    }
}

impl<B> Body for AssetBody<B>
where
    B: Body,
    B::Data: Buf,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            AssetBodyProj::Loaded { data } => {
                Poll::Ready(data.take().map(|data| Ok(Frame::data(data))))
            }
            AssetBodyProj::Passthrough { inner } => {
                // Forward frames, converting data to Bytes
                match inner.poll_frame(cx) {
                    Poll::Pending => Poll::Pending,
                    Poll::Ready(None) => Poll::Ready(None),
                    Poll::Ready(Some(Ok(frame))) => {
                        let frame = frame.map_data(|data| {
                            let mut bytes = BytesMut::with_capacity(data.remaining());
                            let mut chunk = data;
                            while chunk.has_remaining() {
                                let slice = chunk.chunk();
                                bytes.extend_from_slice(slice);
                                chunk.advance(slice.len());
                            }
                            bytes.freeze()
                        });
                        Poll::Ready(Some(Ok(frame)))
                    }
                    Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(io::Error::other(e.into())))),
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            AssetBody::Loaded { data } => data.is_none(),
            AssetBody::Passthrough { inner } => inner.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            AssetBody::Loaded { data } => {
                SizeHint::with_exact(data.as_ref().map_or(0, |data| data.len() as u64))
            }
            AssetBody::Passthrough { inner } => inner.size_hint(),
        }
    }
}
