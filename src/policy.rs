use std::fmt;

/// Decides whether a logical path is produced by a dynamic asset pipeline
/// instead of being served from disk.
///
/// The resolver queries the policy once per resolution with the winning
/// logical path; a `true` answer vetoes static serving so the middleware
/// never shadows a pipeline-generated asset.
pub trait AssetCompilationPolicy: fmt::Debug + Send + Sync {
    /// Returns true if the asset at `logical_path` is dynamically compiled.
    fn compiles(&self, logical_path: &str) -> bool;
}

/// Policy for hosts without an asset pipeline: nothing is ever compiled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCompilationPolicy;

impl AssetCompilationPolicy for NullCompilationPolicy {
    fn compiles(&self, _logical_path: &str) -> bool {
        false
    }
}

/// Policy for hosts with a request-time asset pipeline.
///
/// A path is considered compiled when the pipeline is active and the path
/// lies under the pipeline's subdirectory. Both facts are supplied by the
/// integration layer at construction; the pipeline is typically active in
/// development and inactive in production, where assets are precompiled to
/// disk ahead of time.
#[derive(Debug, Clone)]
pub struct PipelineCompilationPolicy {
    active: bool,
    pipeline_prefix: String,
}

impl PipelineCompilationPolicy {
    /// Creates a policy with the given active flag and pipeline path prefix.
    pub fn new(active: bool, pipeline_prefix: impl Into<String>) -> Self {
        Self {
            active,
            pipeline_prefix: pipeline_prefix.into(),
        }
    }

    /// Returns whether the pipeline is active.
    pub fn active(&self) -> bool {
        self.active
    }

    fn on_pipeline_path(&self, logical_path: &str) -> bool {
        path_within_prefix(logical_path, &self.pipeline_prefix)
    }
}

impl AssetCompilationPolicy for PipelineCompilationPolicy {
    fn compiles(&self, logical_path: &str) -> bool {
        self.active && self.on_pipeline_path(logical_path)
    }
}

/// Prefix match with a segment boundary: the path must equal the prefix or
/// continue with a `/` right after it, so `/assets-old/x` is not under
/// `/assets`.
pub(crate) fn path_within_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_policy_never_compiles() {
        let policy = NullCompilationPolicy;
        assert!(!policy.compiles("/assets/application.css"));
        assert!(!policy.compiles("/index.html"));
    }

    #[test]
    fn test_pipeline_policy_compiles_when_active_and_on_path() {
        let policy = PipelineCompilationPolicy::new(true, "/assets");
        assert!(policy.compiles("/assets/application.css"));
        assert!(policy.compiles("/assets/deep/nested.js"));
    }

    #[test]
    fn test_pipeline_policy_ignores_paths_outside_prefix() {
        let policy = PipelineCompilationPolicy::new(true, "/assets");
        assert!(!policy.compiles("/robots.txt"));
        assert!(!policy.compiles("/assets-old/application.css"));
    }

    #[test]
    fn test_pipeline_policy_inactive_never_compiles() {
        let policy = PipelineCompilationPolicy::new(false, "/assets");
        assert!(!policy.compiles("/assets/application.css"));
    }

    #[test]
    fn test_path_within_prefix_boundaries() {
        assert!(path_within_prefix("/assets", "/assets"));
        assert!(path_within_prefix("/assets/x.css", "/assets"));
        assert!(!path_within_prefix("/assetsx.css", "/assets"));
        assert!(!path_within_prefix("/other/assets/x.css", "/assets"));
    }
}
