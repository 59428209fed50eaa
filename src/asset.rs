use crate::config::AssetConfig;
use crate::policy::path_within_prefix;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, header};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Old last-modified dates encourage caching via browser heuristics. Sent
/// with year- and month-long cached assets.
const CACHE_FRIENDLY_LAST_MODIFIED: &str = "Mon, 10 Jan 2005 10:00:00 GMT";

const SECONDS_IN_DAY: u32 = 24 * 60 * 60;
const SECONDS_IN_MONTH: u32 = 31 * SECONDS_IN_DAY;
const SECONDS_IN_YEAR: u32 = 365 * SECONDS_IN_DAY;

/// How long a served asset may be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLifetime {
    /// One day (86 400 seconds). The default fallback class.
    Day,
    /// One 31-day month (2 678 400 seconds).
    Month,
    /// One 365-day year (31 536 000 seconds).
    Year,
    /// An explicit lifetime in seconds.
    Seconds(u32),
}

impl CacheLifetime {
    /// Returns the lifetime in seconds.
    pub fn as_secs(self) -> u32 {
        match self {
            CacheLifetime::Day => SECONDS_IN_DAY,
            CacheLifetime::Month => SECONDS_IN_MONTH,
            CacheLifetime::Year => SECONDS_IN_YEAR,
            CacheLifetime::Seconds(secs) => secs,
        }
    }
}

/// A resolved static asset, ready to be turned into a response.
///
/// Produced by [`AssetResolver::resolve`](crate::AssetResolver::resolve) for
/// paths that map to a readable file with a recognized static extension.
/// Immutable; built fresh on every request.
#[derive(Debug, Clone)]
pub struct ServeableAsset {
    filesystem_path: PathBuf,
    logical_path: String,
    has_encoding_variant: bool,
    is_gzip_selected: bool,
    max_age_fallback: Option<CacheLifetime>,
}

impl ServeableAsset {
    pub(crate) fn new(
        filesystem_path: PathBuf,
        logical_path: String,
        has_encoding_variant: bool,
        is_gzip_selected: bool,
        max_age_fallback: Option<CacheLifetime>,
    ) -> Self {
        Self {
            filesystem_path,
            logical_path,
            has_encoding_variant,
            is_gzip_selected,
            max_age_fallback,
        }
    }

    /// The exact file that will be read, possibly the `.gz` variant.
    pub fn filesystem_path(&self) -> &Path {
        &self.filesystem_path
    }

    /// The normalized request path used for classification, e.g.
    /// `/foo/index.html` for a request to `/foo/`.
    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    /// Whether a readable `.gz` sibling of the logical asset exists,
    /// regardless of which file was selected.
    pub fn has_encoding_variant(&self) -> bool {
        self.has_encoding_variant
    }

    /// Whether [`filesystem_path`](Self::filesystem_path) points at the gzip
    /// variant.
    pub fn is_gzip_selected(&self) -> bool {
        self.is_gzip_selected
    }

    /// Builds the response headers for this asset.
    ///
    /// The file at `filesystem_path` is stat'ed for `Content-Length`; an
    /// asset that disappeared or became unreadable since resolution surfaces
    /// here as an error, which callers treat the same as a missed resolution.
    pub fn headers(&self, config: &AssetConfig) -> io::Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let mime = mime_guess::from_path(&self.logical_path).first_or_octet_stream();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(mime.as_ref()).map_err(io::Error::other)?,
        );

        let (lifetime_secs, cache_friendly_last_modified) = self.cache_class(config);
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_str(&format!("public, max-age={lifetime_secs}"))
                .map_err(io::Error::other)?,
        );
        if cache_friendly_last_modified {
            headers.insert(
                header::LAST_MODIFIED,
                HeaderValue::from_static(CACHE_FRIENDLY_LAST_MODIFIED),
            );
        }

        if self.has_encoding_variant {
            headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        }
        if self.is_gzip_selected {
            headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }

        let size = fs::metadata(&self.filesystem_path)?.len();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));

        Ok(headers)
    }

    /// Reads the full contents of the selected file.
    pub fn read_body(&self) -> io::Result<Bytes> {
        Ok(Bytes::from(fs::read(&self.filesystem_path)?))
    }

    /// Classifies the logical path into a cache lifetime, and whether the
    /// cache-friendly sentinel `Last-Modified` should be sent.
    fn cache_class(&self, config: &AssetConfig) -> (u32, bool) {
        if path_within_prefix(&self.logical_path, &config.precompiled_assets_prefix()) {
            (SECONDS_IN_YEAR, true)
        } else if self.logical_path == "/favicon.ico" {
            (SECONDS_IN_MONTH, true)
        } else {
            let lifetime = self
                .max_age_fallback
                .unwrap_or(CacheLifetime::Day)
                .as_secs();
            (lifetime, false)
        }
    }
}

// Equality covers the four descriptive fields; the max-age fallback is
// serving configuration, not identity.
impl PartialEq for ServeableAsset {
    fn eq(&self, other: &Self) -> bool {
        self.filesystem_path == other.filesystem_path
            && self.logical_path == other.logical_path
            && self.has_encoding_variant == other.has_encoding_variant
            && self.is_gzip_selected == other.is_gzip_selected
    }
}

impl Eq for ServeableAsset {}
