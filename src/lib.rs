//! Static asset serving middleware for Tower.
//!
//! This crate provides a Tower layer that intercepts requests for static
//! files and serves them straight from an asset root with caching and
//! compression headers, before the request ever reaches the wrapped service.
//!
//! # Example
//!
//! ```ignore
//! use http_static_assets::StaticAssetsLayer;
//! use tower::ServiceBuilder;
//!
//! let service = ServiceBuilder::new()
//!     .layer(StaticAssetsLayer::new("public")?)
//!     .service(my_service);
//! ```
//!
//! # Serving Rules
//!
//! A request is answered by the middleware only when all of the following
//! hold; otherwise it is delegated to the wrapped service unchanged:
//! - No path segment starts with a period (`..` traversal and dotfiles are
//!   answered with a plain `404 Not Found` instead)
//! - The path, the path plus `.html`, or the path plus `/index.html` is a
//!   readable file under the asset root (first match wins; a trailing slash
//!   is ignored, and `/`, the empty path, and `/index` all mean
//!   `/index.html`)
//! - The matched path carries a recognized static extension (the set is
//!   configurable at runtime through [`AssetConfig`])
//! - The configured [`AssetCompilationPolicy`] does not claim the path for a
//!   request-time asset pipeline
//!
//! # Response Headers
//!
//! Served responses carry:
//! - `Content-Type` from the logical path's extension
//! - `Cache-Control: public, max-age=...`: a year under the
//!   precompiled-assets prefix, a month for `/favicon.ico`, otherwise the
//!   configured fallback (default: a day)
//! - A fixed, old `Last-Modified` for the year- and month-long classes
//! - `Vary: Accept-Encoding` whenever a precompressed `.gz` sibling exists
//! - `Content-Encoding: gzip` when the sibling is actually selected, which
//!   happens only for clients whose `Accept-Encoding` accepts gzip
//! - `Content-Length` of the exact file being sent

#![deny(missing_docs)]

mod asset;
mod body;
mod config;
mod future;
mod layer;
mod policy;
mod resolve;
mod service;

pub use asset::{CacheLifetime, ServeableAsset};
pub use body::AssetBody;
pub use config::{AssetConfig, DEFAULT_PRECOMPILED_ASSETS_PREFIX, DEFAULT_STATIC_EXTENSIONS};
pub use future::ResponseFuture;
pub use layer::{BlankAssetRoot, StaticAssetsLayer};
pub use policy::{AssetCompilationPolicy, NullCompilationPolicy, PipelineCompilationPolicy};
pub use resolve::AssetResolver;
pub use service::StaticAssetsService;
