//! Identification of the image to process.

use std::fmt;

use crate::config::SourceConfig;
use crate::error::ConfigError;

const GCS_SCHEME: &str = "gs://";

/// Bucket and key of the source image in Cloud Storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    bucket: String,
    key: String,
}

impl ImageReference {
    /// Create a reference, accepting a bucket written as `gs://bucket`
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self, ConfigError> {
        let bucket = bucket.into();
        let key = key.into();
        let bucket = bucket
            .strip_prefix(GCS_SCHEME)
            .unwrap_or(&bucket)
            .trim_end_matches('/')
            .to_string();

        if bucket.is_empty() || bucket.contains('/') {
            return Err(ConfigError::InvalidUri {
                uri: format!("{}{}/{}", GCS_SCHEME, bucket, key),
                reason: "bucket name must be a single non-empty segment".to_string(),
            });
        }
        if key.is_empty() {
            return Err(ConfigError::InvalidUri {
                uri: format!("{}{}/", GCS_SCHEME, bucket),
                reason: "object key is empty".to_string(),
            });
        }

        Ok(Self { bucket, key })
    }

    /// Parse a `gs://bucket/key` URI as passed by a storage trigger
    pub fn parse_uri(uri: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let rest = uri
            .strip_prefix(GCS_SCHEME)
            .ok_or_else(|| invalid("expected gs:// scheme"))?;
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| invalid("missing object key"))?;

        if bucket.is_empty() {
            return Err(invalid("missing bucket name"));
        }
        if key.is_empty() {
            return Err(invalid("missing object key"));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, ConfigError> {
        Self::new(config.bucket.clone(), config.key.clone())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Spreadsheet title for this image: the key without its final extension
    pub fn title(&self) -> String {
        strip_extension(&self.key).to_string()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", GCS_SCHEME, self.bucket, self.key)
    }
}

/// Remove a trailing `.<ext>` where `<ext>` is one or more non-dot characters.
///
/// Only the last dot is considered. A trailing dot with nothing after it is
/// left alone.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}
