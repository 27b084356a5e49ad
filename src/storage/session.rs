// Async upload helpers
//
// Every call opens its own short-lived client through a `StoreConnector`
// and drops it when the upload finishes; nothing is pooled across calls.

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::{ObjectStore, PutPayload};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::uri::object_key;
use crate::errors::StorageResult;

/// Opens a client for one bucket
pub trait StoreConnector: Send + Sync {
    fn connect(&self, bucket: &str) -> StorageResult<Arc<dyn ObjectStore>>;
}

/// Reads `AWS_REGION`, `AWS_SECRET_ACCESS_KEY` and `AWS_ACCESS_KEY_ID`
/// at connect time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConnector;

impl StoreConnector for EnvConnector {
    fn connect(&self, bucket: &str) -> StorageResult<Arc<dyn ObjectStore>> {
        let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
        if let Ok(region) = std::env::var("AWS_REGION") {
            builder = builder.with_region(region);
        }
        if let Ok(secret) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            builder = builder.with_secret_access_key(secret);
        }
        if let Ok(key_id) = std::env::var("AWS_ACCESS_KEY_ID") {
            builder = builder.with_access_key_id(key_id);
        }
        Ok(Arc::new(builder.build()?))
    }
}

/// Async uploads into one bucket
pub struct S3Session<C = EnvConnector> {
    bucket: String,
    connector: C,
}

impl S3Session<EnvConnector> {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self::with_connector(bucket, EnvConnector)
    }
}

impl<C: StoreConnector> S3Session<C> {
    pub fn with_connector(bucket: impl Into<String>, connector: C) -> Self {
        Self {
            bucket: bucket.into(),
            connector,
        }
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    /// Upload a local file's contents.
    pub async fn upload_file(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        let contents = tokio::fs::read(local_path).await?;
        self.put(&self.bucket, key, PutPayload::from(contents)).await
    }

    pub async fn upload_bytes(&self, key: &str, data: impl Into<Bytes>) -> StorageResult<()> {
        self.put(&self.bucket, key, PutPayload::from(data.into())).await
    }

    pub async fn upload_json<T: Serialize + ?Sized>(&self, document: &T, key: &str) -> StorageResult<()> {
        let body = serde_json::to_vec(document)?;
        self.put(&self.bucket, key, PutPayload::from(body)).await
    }

    /// Upload text to any bucket, not just the session's own.
    pub async fn upload_string_to_bucket(&self, bucket: &str, key: &str, text: &str) -> StorageResult<()> {
        self.put(bucket, key, PutPayload::from(text.as_bytes().to_vec()))
            .await
    }

    async fn put(&self, bucket: &str, key: &str, payload: PutPayload) -> StorageResult<()> {
        let store = self.connector.connect(bucket)?;
        store.put(&object_key(key)?, payload).await?;
        tracing::debug!("Uploaded s3://{}/{}", bucket, key);
        Ok(())
    }
}
