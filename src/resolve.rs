use crate::asset::{CacheLifetime, ServeableAsset};
use crate::config::AssetConfig;
use crate::policy::AssetCompilationPolicy;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extension appended to extensionless candidates and directory indexes.
const DEFAULT_STATIC_EXTENSION: &str = ".html";

/// Maps request paths to servable files under an asset root.
///
/// Resolution re-probes the filesystem on every call; nothing is cached
/// between requests, so a fresh deploy is visible immediately.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    asset_root: PathBuf,
    policy: Arc<dyn AssetCompilationPolicy>,
    config: AssetConfig,
    max_age_fallback: Option<CacheLifetime>,
}

impl AssetResolver {
    /// Creates a resolver over `asset_root`.
    pub fn new(
        asset_root: impl Into<PathBuf>,
        policy: Arc<dyn AssetCompilationPolicy>,
        config: AssetConfig,
        max_age_fallback: Option<CacheLifetime>,
    ) -> Self {
        Self {
            asset_root: asset_root.into(),
            policy,
            config,
            max_age_fallback,
        }
    }

    /// Returns the settings registry this resolver reads from.
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Resolves `path_info` to a [`ServeableAsset`], or `None` when no
    /// matching static file should be served.
    ///
    /// Candidates are tried in order: the path as given, the path with the
    /// default extension appended, then the path as a directory with an
    /// `index.html` inside. An exact file match therefore beats extension
    /// inference, which beats directory-index fallback. Root index aliases
    /// (``""``, `/`, `/index`) map straight to `/index.html` with no
    /// fallback chain.
    ///
    /// Not-found is a normal `None`, never an error; the same goes for files
    /// that exist but cannot be opened.
    pub fn resolve(&self, path_info: &str, accepts_gzip: bool) -> Option<ServeableAsset> {
        let trimmed = path_info.strip_suffix('/').unwrap_or(path_info);

        let mut hit = None;
        for candidate in candidate_logical_paths(trimmed) {
            let file_path = self.join_under_root(&candidate);
            if is_readable_file(&file_path) {
                hit = Some((candidate, file_path));
                break;
            }
        }
        let (logical_path, file_path) = hit?;

        if !has_static_extension(&logical_path, &self.config.static_extensions()) {
            return None;
        }

        if self.policy.compiles(&logical_path) {
            tracing::debug!("asset pipeline compiles {}, not serving statically", logical_path);
            return None;
        }

        let gzipped_path = gzip_sibling(&file_path);
        let has_encoding_variant = is_readable_file(&gzipped_path);

        let (filesystem_path, is_gzip_selected) = if accepts_gzip && has_encoding_variant {
            (gzipped_path, true)
        } else {
            (file_path, false)
        };

        Some(ServeableAsset::new(
            filesystem_path,
            logical_path,
            has_encoding_variant,
            is_gzip_selected,
            self.max_age_fallback,
        ))
    }

    fn join_under_root(&self, logical_path: &str) -> PathBuf {
        // Logical paths carry a leading slash; joining an absolute path
        // would replace the root entirely.
        self.asset_root.join(logical_path.trim_start_matches('/'))
    }
}

/// Ordered candidate logical paths for a trailing-slash-trimmed request path.
fn candidate_logical_paths(trimmed: &str) -> Vec<String> {
    if matches!(trimmed, "" | "/" | "/index") {
        return vec![format!("/index{DEFAULT_STATIC_EXTENSION}")];
    }
    vec![
        trimmed.to_string(),
        format!("{trimmed}{DEFAULT_STATIC_EXTENSION}"),
        format!("{trimmed}/index{DEFAULT_STATIC_EXTENSION}"),
    ]
}

/// Whether the path's extension is in the recognized set, ignoring case.
fn has_static_extension(logical_path: &str, extensions: &[String]) -> bool {
    let Some(extension) = Path::new(logical_path).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|recognized| recognized.eq_ignore_ascii_case(extension))
}

/// Whether `path` is an existing regular file the process can open.
fn is_readable_file(path: &Path) -> bool {
    fs::File::open(path)
        .and_then(|file| file.metadata())
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

/// The path of the precompressed sibling, `<path>.gz`.
fn gzip_sibling(path: &Path) -> PathBuf {
    let mut sibling = path.to_path_buf().into_os_string();
    sibling.push(".gz");
    PathBuf::from(sibling)
}
