use crate::asset::CacheLifetime;
use crate::config::AssetConfig;
use crate::policy::{AssetCompilationPolicy, NullCompilationPolicy};
use crate::resolve::AssetResolver;
use crate::service::StaticAssetsService;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tower::Layer;

/// Error returned when a layer is constructed with a blank asset root.
#[derive(Debug, Error)]
#[error("asset root must be a non-blank path")]
pub struct BlankAssetRoot;

/// A Tower layer that serves static assets in front of wrapped services.
///
/// Requests resolving to a file under the asset root are answered directly
/// with cache and encoding headers; everything else reaches the wrapped
/// service untouched.
#[derive(Debug, Clone)]
pub struct StaticAssetsLayer {
    asset_root: PathBuf,
    policy: Arc<dyn AssetCompilationPolicy>,
    config: AssetConfig,
    max_age_fallback: Option<CacheLifetime>,
}

impl StaticAssetsLayer {
    /// Creates a layer serving assets from `asset_root`.
    ///
    /// A blank or whitespace-only root is rejected here rather than on the
    /// first request; a layer with no real root would silently delegate
    /// everything.
    pub fn new(asset_root: impl Into<PathBuf>) -> Result<Self, BlankAssetRoot> {
        let asset_root = asset_root.into();
        if asset_root.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(BlankAssetRoot);
        }
        Ok(Self {
            asset_root,
            policy: Arc::new(NullCompilationPolicy),
            config: AssetConfig::new(),
            max_age_fallback: None,
        })
    }

    /// Sets the cache lifetime for assets outside the precompiled subdirectory
    /// that are not the root favicon.
    ///
    /// The default is [`CacheLifetime::Day`].
    pub fn max_age_fallback(mut self, lifetime: CacheLifetime) -> Self {
        self.max_age_fallback = Some(lifetime);
        self
    }

    /// Sets the compilation policy consulted before serving.
    ///
    /// The default [`NullCompilationPolicy`] never vetoes. Hosts with a
    /// request-time asset pipeline supply a
    /// [`PipelineCompilationPolicy`](crate::PipelineCompilationPolicy).
    pub fn compilation_policy(mut self, policy: impl AssetCompilationPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Replaces the settings registry, e.g. to share one across layers.
    pub fn with_config(mut self, config: AssetConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the settings registry read by services this layer produces.
    ///
    /// Mutations made through the returned handle are visible to already
    /// constructed services.
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }
}

impl<S> Layer<S> for StaticAssetsLayer {
    type Service = StaticAssetsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        StaticAssetsService::new(
            inner,
            AssetResolver::new(
                self.asset_root.clone(),
                self.policy.clone(),
                self.config.clone(),
                self.max_age_fallback,
            ),
        )
    }
}
