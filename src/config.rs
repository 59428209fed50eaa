use std::sync::{Arc, PoisonError, RwLock};

/// Extensions recognized as static assets out of the box.
pub const DEFAULT_STATIC_EXTENSIONS: &[&str] = &[
    "css", "js", "html", "htm", "txt", "ico", "png", "jpg", "jpeg", "gif", "pdf", "svg", "zip",
    "gz", "eps", "psd", "ai", "woff", "woff2", "ttf", "eot", "otf", "swf",
];

/// Default path prefix for assets produced by a precompile pipeline.
pub const DEFAULT_PRECOMPILED_ASSETS_PREFIX: &str = "/assets";

/// Shared settings registry for the asset middleware.
///
/// Holds the set of recognized static extensions and the precompiled-assets
/// path prefix. Each setting has a default and can be read, replaced, or
/// reset at any time. The registry is a cheap clonable handle; clones share
/// the same underlying settings, so mutations made through one handle are
/// visible to every service holding another.
///
/// Mutation is intended for startup and test setup. Steady-state request
/// handling only reads.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    inner: Arc<RwLock<Settings>>,
}

#[derive(Debug)]
struct Settings {
    static_extensions: Vec<String>,
    precompiled_assets_prefix: String,
}

impl Settings {
    fn with_defaults() -> Self {
        Self {
            // Copied out of the constants; a reset never aliases a value a
            // caller may still mutate.
            static_extensions: DEFAULT_STATIC_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            precompiled_assets_prefix: DEFAULT_PRECOMPILED_ASSETS_PREFIX.to_string(),
        }
    }
}

impl AssetConfig {
    /// Creates a registry seeded with the default settings.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Settings::with_defaults())),
        }
    }

    /// Returns the currently recognized static extensions.
    pub fn static_extensions(&self) -> Vec<String> {
        self.read().static_extensions.clone()
    }

    /// Replaces the recognized static extension set.
    pub fn set_static_extensions<I, T>(&self, extensions: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.write().static_extensions = extensions.into_iter().map(Into::into).collect();
    }

    /// Adds a single extension to the recognized set.
    pub fn add_static_extension(&self, extension: impl Into<String>) {
        self.write().static_extensions.push(extension.into());
    }

    /// Restores the default static extension set.
    pub fn reset_static_extensions(&self) {
        self.write().static_extensions = Settings::with_defaults().static_extensions;
    }

    /// Returns the precompiled-assets path prefix.
    pub fn precompiled_assets_prefix(&self) -> String {
        self.read().precompiled_assets_prefix.clone()
    }

    /// Replaces the precompiled-assets path prefix.
    pub fn set_precompiled_assets_prefix(&self, prefix: impl Into<String>) {
        self.write().precompiled_assets_prefix = prefix.into();
    }

    /// Restores the default precompiled-assets path prefix.
    pub fn reset_precompiled_assets_prefix(&self) {
        self.write().precompiled_assets_prefix = Settings::with_defaults().precompiled_assets_prefix;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Settings> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Settings> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::new()
    }
}
