// Blocking object store helper bound to one bucket
//
// Each call drives the async object_store client to completion on a
// private current-thread runtime, so this type must not be used from
// inside an async task (use `S3Session` there).

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use walkdir::WalkDir;

use super::uri::{object_key, S3Uri};
use crate::errors::{StorageError, StorageResult};

/// Synchronous list/load/upload/copy/delete over one bucket
pub struct S3Storage {
    bucket: String,
    store: Arc<dyn ObjectStore>,
    runtime: Runtime,
}

impl S3Storage {
    /// Connect to `bucket` using credentials and region from the environment.
    pub fn new(bucket: impl Into<String>) -> StorageResult<Self> {
        let bucket = bucket.into();
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(&bucket)
            .build()?;
        Self::with_store(bucket, Arc::new(store))
    }

    /// Wrap an existing store (any `ObjectStore` implementation).
    pub fn with_store(bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> StorageResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::Runtime(e.to_string()))?;
        Ok(Self {
            bucket: bucket.into(),
            store,
            runtime,
        })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    /// `s3://{bucket}/{key}`
    pub fn s3_uri(&self, key: &str) -> String {
        S3Uri::new(self.bucket.as_str(), key).to_string()
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    // Listing

    /// Keys under `prefix` ending in any of `extensions` (case-insensitive).
    /// An empty extension list matches every key.
    ///
    /// The prefix matches whole path segments: `data` lists `data/a.txt`
    /// but not `database.txt`. Returned keys can be passed back to any
    /// other method unchanged.
    pub fn list_files_with_ext(&self, prefix: &str, extensions: &[&str]) -> StorageResult<Vec<String>> {
        Ok(self
            .list_matching(prefix, extensions)?
            .into_iter()
            .map(|location| location.to_string())
            .collect())
    }

    fn list_matching(&self, prefix: &str, extensions: &[&str]) -> StorageResult<Vec<ObjectPath>> {
        let mut locations = self.list_objects(prefix)?;
        locations.retain(|location| matches_extension_ignore_case(location.as_ref(), extensions));
        Ok(locations)
    }

    fn list_objects(&self, prefix: &str) -> StorageResult<Vec<ObjectPath>> {
        let prefix_path = list_prefix(prefix)?;
        let objects: Vec<_> = self.block_on(async {
            self.store
                .list(prefix_path.as_ref())
                .try_collect::<Vec<_>>()
                .await
        })?;
        let mut locations: Vec<ObjectPath> = objects.into_iter().map(|meta| meta.location).collect();
        locations.sort();
        Ok(locations)
    }

    // Download

    /// Download `key` into `local_dir` (created if needed), named after the
    /// key's last segment.
    pub fn download_object(&self, local_dir: &Path, key: &str) -> StorageResult<PathBuf> {
        fs::create_dir_all(local_dir)?;
        let file_name = key.rsplit('/').next().unwrap_or(key);
        let destination = local_dir.join(file_name);
        let bytes = self.load_bytes(key)?;
        fs::write(&destination, &bytes)?;
        tracing::debug!("Downloaded {} to {}", self.s3_uri(key), destination.display());
        Ok(destination)
    }

    /// Download every key into `local_dir`; returns key -> local path.
    pub fn download_all(&self, local_dir: &Path, keys: &[String]) -> StorageResult<BTreeMap<String, PathBuf>> {
        keys.iter()
            .map(|key| Ok((key.clone(), self.download_object(local_dir, key)?)))
            .collect()
    }

    /// False only when the store reports the object as absent; any other
    /// failure is returned as an error.
    pub fn file_exists(&self, key: &str) -> StorageResult<bool> {
        let location = object_key(key)?;
        match self.block_on(self.store.head(&location)) {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load_bytes(&self, key: &str) -> StorageResult<Bytes> {
        self.get(&object_key(key)?)
    }

    fn get(&self, location: &ObjectPath) -> StorageResult<Bytes> {
        let bytes = self.block_on(async {
            let result = self.store.get(location).await?;
            result.bytes().await
        })?;
        Ok(bytes)
    }

    pub fn load_text(&self, key: &str) -> StorageResult<String> {
        Ok(String::from_utf8(self.load_bytes(key)?.to_vec())?)
    }

    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<T> {
        Ok(serde_json::from_slice(&self.load_bytes(key)?)?)
    }

    /// Load a value stored with [`upload_object`](Self::upload_object).
    pub fn load_object<T: DeserializeOwned>(&self, key: &str) -> StorageResult<T> {
        Ok(bincode::deserialize(&self.load_bytes(key)?)?)
    }

    // Upload

    /// Upload a local file. Returns `Ok(false)` (and logs) when the local
    /// file does not exist.
    pub fn upload_file(&self, key: &str, local_path: &Path) -> StorageResult<bool> {
        let contents = match fs::read(local_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("The file was not found: {}", local_path.display());
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        self.put(key, PutPayload::from(contents))?;
        Ok(true)
    }

    pub fn upload_bytes(&self, key: &str, data: impl Into<Bytes>) -> StorageResult<()> {
        self.put(key, PutPayload::from(data.into()))
    }

    pub fn upload_string(&self, key: &str, text: &str) -> StorageResult<()> {
        self.put(key, PutPayload::from(text.as_bytes().to_vec()))
    }

    pub fn upload_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let body = serde_json::to_vec(value)?;
        self.put(key, PutPayload::from(body))
    }

    /// Store any serde value in a compact binary encoding.
    pub fn upload_object<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let body = bincode::serialize(value)?;
        self.put(key, PutPayload::from(body))
    }

    fn put(&self, key: &str, payload: PutPayload) -> StorageResult<()> {
        let location = object_key(key)?;
        self.block_on(self.store.put(&location, payload))?;
        tracing::debug!("Uploaded {}", self.s3_uri(key));
        Ok(())
    }

    // Directory sync

    /// Mirror `src_dir` under `dest_prefix`. Local files are filtered by a
    /// case-sensitive suffix match. Returns local path -> s3 URI.
    pub fn copy_local_dir_to_s3(
        &self,
        src_dir: &Path,
        dest_prefix: &str,
        extensions: &[&str],
    ) -> StorageResult<BTreeMap<PathBuf, String>> {
        let mut uploaded = BTreeMap::new();
        for (local_path, relative) in local_files(src_dir)? {
            if !extensions.is_empty() && !extensions.iter().any(|ext| relative.ends_with(ext)) {
                continue;
            }
            let key = join_key(dest_prefix, &relative);
            let contents = fs::read(&local_path)?;
            self.put(&key, PutPayload::from(contents))?;
            uploaded.insert(local_path, self.s3_uri(&key));
        }
        Ok(uploaded)
    }

    /// Download every matching key under `src_prefix` into `dest_dir`,
    /// recreating the sub-directories below the prefix.
    pub fn copy_s3_dir_to_local(
        &self,
        src_prefix: &str,
        dest_dir: &Path,
        extensions: &[&str],
    ) -> StorageResult<Vec<PathBuf>> {
        let src_prefix = src_prefix.trim_matches('/');
        let locations = self.list_matching(src_prefix, extensions)?;
        fs::create_dir_all(dest_dir)?;

        let mut written = Vec::with_capacity(locations.len());
        for location in locations {
            let key = location.as_ref();
            let destination = relative_key(key, src_prefix)
                .split('/')
                .fold(dest_dir.to_path_buf(), |path, part| path.join(part));
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            tracing::info!("Downloading {} to {}", key, destination.display());
            fs::write(&destination, self.get(&location)?)?;
            written.push(destination);
        }
        Ok(written)
    }

    /// Server-side copy of matching keys, swapping the leading `src_prefix`
    /// of each key for `dest_prefix`. Returns the new keys.
    ///
    /// Keys that would be copied onto themselves are skipped.
    pub fn copy_s3_to_s3(
        &self,
        src_prefix: &str,
        dest_prefix: &str,
        extensions: &[&str],
    ) -> StorageResult<Vec<String>> {
        let src_prefix = src_prefix.trim_matches('/');
        let locations = self.list_matching(src_prefix, extensions)?;
        let mut copied = Vec::with_capacity(locations.len());
        for from in locations {
            let key = from.as_ref();
            let to = object_key(&join_key(dest_prefix, relative_key(key, src_prefix)))?;
            if to == from {
                tracing::warn!("Skipping copy of {} onto itself", key);
                continue;
            }
            tracing::info!("Copying {} to {}", key, to);
            self.block_on(self.store.copy(&from, &to))?;
            copied.push(to.to_string());
        }
        Ok(copied)
    }

    // Deletion

    /// Delete one key. Deleting an absent key succeeds.
    pub fn delete_file(&self, key: &str) -> StorageResult<()> {
        self.delete(&object_key(key)?)?;
        Ok(())
    }

    /// Delete every key under `prefix`; a missing prefix deletes nothing.
    /// Returns the number of objects removed.
    pub fn delete_folder(&self, prefix: &str) -> StorageResult<usize> {
        let locations = match self.list_objects(prefix) {
            Ok(locations) => locations,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        let mut deleted = 0;
        for location in &locations {
            if self.delete(location)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// False when the object was already gone
    fn delete(&self, location: &ObjectPath) -> StorageResult<bool> {
        match self.block_on(self.store.delete(location)) {
            Ok(()) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// `None` (whole bucket) for an empty prefix
fn list_prefix(prefix: &str) -> StorageResult<Option<ObjectPath>> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(None);
    }
    object_key(trimmed).map(Some)
}

/// Part of `key` below `prefix` (the whole key for an empty prefix)
fn relative_key<'a>(key: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return key;
    }
    key.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(key)
}

fn matches_extension_ignore_case(key: &str, extensions: &[&str]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    let key = key.to_lowercase();
    extensions
        .iter()
        .any(|ext| key.ends_with(&ext.to_lowercase()))
}

/// `prefix/relative` without doubling the separator
fn join_key(prefix: &str, relative: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", prefix, relative)
    }
}

/// Every regular file below `root` with its `/`-separated relative path.
pub(crate) fn local_files(root: &Path) -> StorageResult<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| StorageError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push((entry.path().to_path_buf(), relative));
    }
    Ok(files)
}
