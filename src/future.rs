use crate::body::AssetBody;
use bytes::Bytes;
use http::{HeaderValue, Response, StatusCode, header};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

const NOT_FOUND_BODY: &str = "Not Found";

pin_project! {
    /// Future for static asset service responses.
    ///
    /// Asset hits and rejected paths are answered without polling the
    /// downstream handler; everything else resolves to the inner service's
    /// future with the body wrapped for type unification.
    #[project = ResponseFutureProj]
    #[allow(missing_docs)]
    pub enum ResponseFuture<F, B> {
        /// Response built by the middleware itself.
        Prepared {
            response: Option<Response<AssetBody<B>>>,
        },
        /// Delegated to the downstream handler.
        Downstream {
            #[pin]
            future: F,
        },
    }
}

impl<F, B> ResponseFuture<F, B> {
    /// A response the middleware answered itself.
    pub(crate) fn prepared(response: Response<AssetBody<B>>) -> Self {
        Self::Prepared {
            response: Some(response),
        }
    }

    /// The `404 Not Found` rejection for illegal paths.
    pub(crate) fn not_found() -> Self {
        let mut response = Response::new(AssetBody::loaded(Bytes::from_static(
            NOT_FOUND_BODY.as_bytes(),
        )));
        *response.status_mut() = StatusCode::NOT_FOUND;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response.headers_mut().insert(
            header::CONTENT_LENGTH,
            HeaderValue::from(NOT_FOUND_BODY.len() as u64),
        );
        Self::prepared(response)
    }

    /// Delegates to the downstream handler's future.
    pub(crate) fn downstream(future: F) -> Self {
        Self::Downstream { future }
    }
}

impl<F, B, E> Future for ResponseFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<AssetBody<B>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            ResponseFutureProj::Prepared { response } => {
                let response = response.take().expect("future polled after completion");
                Poll::Ready(Ok(response))
            }
            ResponseFutureProj::Downstream { future } => match future.poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
                Poll::Ready(Ok(response)) => {
                    Poll::Ready(Ok(response.map(AssetBody::passthrough)))
                }
            },
        }
    }
}
