use crate::asset::ServeableAsset;
use crate::body::AssetBody;
use crate::config::AssetConfig;
use crate::future::ResponseFuture;
use crate::resolve::AssetResolver;
use http::{Request, Response};
use std::io;
use std::task::{Context, Poll};
use tower::Service;

/// A Tower service that serves static assets ahead of a wrapped handler.
#[derive(Debug, Clone)]
pub struct StaticAssetsService<S> {
    inner: S,
    resolver: AssetResolver,
}

impl<S> StaticAssetsService<S> {
    /// Creates a new service wrapping the given downstream handler.
    pub fn new(inner: S, resolver: AssetResolver) -> Self {
        Self { inner, resolver }
    }

    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the inner service.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes this service, returning the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for StaticAssetsService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = Response<AssetBody<ResBody>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let path_info = req.uri().path();

        if is_illegal_path(path_info) {
            tracing::debug!("rejecting illegal asset path {}", path_info);
            return ResponseFuture::not_found();
        }

        let accepts_gzip = req
            .headers()
            .get(http::header::ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(accepts_gzip);

        if let Some(asset) = self.resolver.resolve(path_info, accepts_gzip) {
            match serve(&asset, self.resolver.config()) {
                Ok(response) => {
                    tracing::debug!(
                        "serving {} from {}",
                        asset.logical_path(),
                        asset.filesystem_path().display()
                    );
                    return ResponseFuture::prepared(response);
                }
                Err(error) => {
                    // Resolution raced a deploy or permission change; the
                    // downstream handler decides what to do with the path.
                    tracing::debug!(
                        "resolved asset {} became unreadable ({}), delegating",
                        asset.logical_path(),
                        error
                    );
                }
            }
        }

        ResponseFuture::downstream(self.inner.call(req))
    }
}

/// Builds the 200 response for a resolved asset.
fn serve<B>(asset: &ServeableAsset, config: &AssetConfig) -> io::Result<Response<AssetBody<B>>> {
    let headers = asset.headers(config)?;
    let data = asset.read_body()?;

    let mut response = Response::new(AssetBody::loaded(data));
    *response.headers_mut() = headers;
    Ok(response)
}

/// Checks for parent-directory traversal and hidden-file segments.
///
/// Any `/`-separated segment that starts with a period is rejected, which
/// covers both `..` traversal and dotfiles. Periods embedded later in a
/// segment (`a.b.c`, `file...name`) are legitimate.
fn is_illegal_path(path_info: &str) -> bool {
    path_info.split('/').any(|segment| segment.starts_with('.'))
}

/// Parses the Accept-Encoding header and returns whether the client accepts
/// a gzip-encoded body.
///
/// The header value is expected to be comma-separated encodings with
/// optional quality values (e.g., "gzip, br;q=1.0, zstd;q=0.8"); an entry
/// with quality 0 is an explicit refusal.
fn accepts_gzip(header: &str) -> bool {
    header.split(',').any(|part| {
        let (encoding, quality) = parse_encoding_with_quality(part.trim());
        quality > 0.0
            && (encoding.eq_ignore_ascii_case("gzip") || encoding.eq_ignore_ascii_case("x-gzip"))
    })
}

/// Parses an encoding entry like "gzip" or "gzip;q=0.8" into (encoding, quality).
fn parse_encoding_with_quality(s: &str) -> (&str, f32) {
    let mut parts = s.splitn(2, ';');
    let encoding = parts.next().unwrap_or("").trim();

    let quality = parts
        .next()
        .and_then(|q| {
            let q = q.trim();
            if q.starts_with("q=") || q.starts_with("Q=") {
                q[2..].parse::<f32>().ok()
            } else {
                None
            }
        })
        .unwrap_or(1.0);

    (encoding, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::CacheLifetime;
    use crate::policy::NullCompilationPolicy;
    use bytes::Bytes;
    use http::{StatusCode, header};
    use http_body_util::{BodyExt, Full};
    use std::convert::Infallible;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn write_file(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = File::create(path).unwrap();
        file.write_all(contents).unwrap();
    }

    async fn downstream_handler(
        _req: Request<()>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let mut response = Response::new(Full::new(Bytes::from("downstream response")));
        *response.status_mut() = StatusCode::IM_A_TEAPOT;
        Ok(response)
    }

    fn resolver(root: &Path) -> AssetResolver {
        AssetResolver::new(
            root,
            Arc::new(NullCompilationPolicy),
            AssetConfig::new(),
            None,
        )
    }

    fn asset_service(
        root: &Path,
    ) -> StaticAssetsService<
        impl Service<Request<()>, Response = Response<Full<Bytes>>, Error = Infallible> + Clone,
    > {
        StaticAssetsService::new(tower::service_fn(downstream_handler), resolver(root))
    }

    fn request(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    fn gzip_request(uri: &str) -> Request<()> {
        Request::builder()
            .uri(uri)
            .header(header::ACCEPT_ENCODING, "gzip, deflate, br")
            .body(())
            .unwrap()
    }

    async fn body_bytes<B>(body: AssetBody<B>) -> Bytes
    where
        B: http_body::Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        body.collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_asset_with_cache_headers() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "assets/application.css", b"body {}");

        let response = asset_service(dir.path())
            .oneshot(request("/assets/application.css"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/css"
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=31536000"
        );
        assert_eq!(
            response.headers().get(header::LAST_MODIFIED).unwrap(),
            "Mon, 10 Jan 2005 10:00:00 GMT"
        );
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "7");
        assert_eq!(body_bytes(response.into_body()).await, "body {}");
    }

    #[tokio::test]
    async fn test_serves_gzip_variant_to_gzip_capable_clients() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "assets/application.css", b"body { color: red }");
        write_file(dir.path(), "assets/application.css.gz", b"gzgz");

        let response = asset_service(dir.path())
            .oneshot(gzip_request("/assets/application.css"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_ENCODING).unwrap(),
            "gzip"
        );
        assert_eq!(
            response.headers().get(header::VARY).unwrap(),
            "Accept-Encoding"
        );
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "4");
        assert_eq!(body_bytes(response.into_body()).await, "gzgz");
    }

    #[tokio::test]
    async fn test_serves_plain_file_to_non_gzip_clients() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "assets/application.css", b"body { color: red }");
        write_file(dir.path(), "assets/application.css.gz", b"gzgz");

        let response = asset_service(dir.path())
            .oneshot(request("/assets/application.css"))
            .await
            .unwrap();

        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
        assert_eq!(
            response.headers().get(header::VARY).unwrap(),
            "Accept-Encoding"
        );
        assert_eq!(
            body_bytes(response.into_body()).await,
            "body { color: red }"
        );
    }

    #[tokio::test]
    async fn test_delegates_unresolved_paths_downstream() {
        let dir = TempDir::new().unwrap();

        let response = asset_service(dir.path())
            .oneshot(request("/missing.css"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(
            body_bytes(response.into_body()).await,
            "downstream response"
        );
    }

    #[tokio::test]
    async fn test_delegates_paths_without_static_extension() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "api", b"not an asset");

        let response = asset_service(dir.path())
            .oneshot(request("/api"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_rejects_illegal_paths_without_calling_downstream() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "secret.txt", b"secret");

        let called = Arc::new(AtomicBool::new(false));
        let called_by_handler = called.clone();
        let inner = tower::service_fn(move |_req: Request<()>| {
            called_by_handler.store(true, Ordering::SeqCst);
            async { Ok::<_, Infallible>(Response::new(Full::new(Bytes::new()))) }
        });

        let service = StaticAssetsService::new(inner, resolver(dir.path()));
        for path in ["/../secret.txt", "/.htaccess", "/a/.b", "/a/../b"] {
            let response = service.clone().oneshot(request(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {path:?}");
            assert_eq!(body_bytes(response.into_body()).await, "Not Found");
        }
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_embedded_periods_are_not_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "file...name.js", b"js");

        let response = asset_service(dir.path())
            .oneshot(request("/file...name.js"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response.into_body()).await, "js");
    }

    #[tokio::test]
    async fn test_config_mutation_visible_through_cloned_service() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "data.csv", b"a,b");

        let service = asset_service(dir.path());
        let clone = service.clone();

        let response = clone.clone().oneshot(request("/data.csv")).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);

        service.resolver.config().add_static_extension("csv");
        let response = clone.oneshot(request("/data.csv")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_max_age_fallback_applies_to_served_assets() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "robots.txt", b"User-agent: *");

        let service = StaticAssetsService::new(
            tower::service_fn(downstream_handler),
            AssetResolver::new(
                dir.path(),
                Arc::new(NullCompilationPolicy),
                AssetConfig::new(),
                Some(CacheLifetime::Seconds(300)),
            ),
        );

        let response = service.oneshot(request("/robots.txt")).await.unwrap();
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=300"
        );
    }

    #[test]
    fn test_is_illegal_path() {
        assert!(is_illegal_path("/../secret"));
        assert!(is_illegal_path("../secret"));
        assert!(is_illegal_path(".htaccess"));
        assert!(is_illegal_path("/.top-secret"));
        assert!(is_illegal_path("/assets/.shhh.txt"));
        assert!(is_illegal_path("/a/../b"));
    }

    #[test]
    fn test_legal_paths_with_embedded_periods() {
        assert!(!is_illegal_path("/a.b.c"));
        assert!(!is_illegal_path("/file...name.js"));
        assert!(!is_illegal_path("/assets/application.css"));
        assert!(!is_illegal_path("/"));
    }

    #[test]
    fn test_accepts_gzip_token_matching() {
        assert!(accepts_gzip("gzip"));
        assert!(accepts_gzip("GZIP"));
        assert!(accepts_gzip("x-gzip"));
        assert!(accepts_gzip("deflate, gzip, br"));
        assert!(accepts_gzip("gzip;q=0.5"));
    }

    #[test]
    fn test_accepts_gzip_rejects_non_tokens() {
        assert!(!accepts_gzip("gzipped"));
        assert!(!accepts_gzip("notgzip"));
        assert!(!accepts_gzip("deflate, br"));
        assert!(!accepts_gzip("identity"));
        assert!(!accepts_gzip(""));
    }

    #[test]
    fn test_accepts_gzip_quality_zero_is_refusal() {
        assert!(!accepts_gzip("gzip;q=0"));
        assert!(!accepts_gzip("gzip;q=0.0"));
        assert!(accepts_gzip("deflate;q=0, gzip"));
    }
}
