// s3://bucket/key addressing

use object_store::path::Path as ObjectPath;
use std::fmt;

use crate::errors::{StorageError, StorageResult};

pub const S3_SCHEME: &str = "s3://";

/// True iff `path` starts with the literal `s3://` scheme.
pub fn is_s3_path(path: &str) -> bool {
    path.starts_with(S3_SCHEME)
}

/// Store location for a literal key.
///
/// The key is used verbatim (no percent-encoding), so keys read back from a
/// listing address the same objects. One leading or trailing `/` is ignored;
/// empty, `.` and `..` segments are rejected.
pub fn object_key(key: &str) -> StorageResult<ObjectPath> {
    Ok(ObjectPath::parse(key)?)
}

/// Key component of an `s3://bucket/key` URI.
pub fn parse_s3_key(uri: &str) -> StorageResult<String> {
    S3Uri::parse(uri).map(|parsed| parsed.key)
}

/// Bucket plus key; the bucket is always the first path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    pub bucket: String,
    pub key: String,
}

impl S3Uri {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Split `s3://bucket/some/key` into bucket and key.
    ///
    /// A URI with no key (`s3://bucket`) parses with an empty key.
    pub fn parse(uri: &str) -> StorageResult<Self> {
        let rest = uri
            .strip_prefix(S3_SCHEME)
            .ok_or_else(|| StorageError::InvalidUri(format!("'{}' does not start with {}", uri, S3_SCHEME)))?;

        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(StorageError::InvalidUri(format!("'{}' has no bucket", uri)));
        }
        Ok(Self::new(bucket, key))
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}
