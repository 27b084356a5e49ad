// Report workflow helpers
//
// Fetch remote inputs for a local run, then publish the run's report and
// working files under the transaction's output prefix.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::s3::{local_files, S3Storage};
use super::uri::{is_s3_path, S3Uri};
use crate::config::S3Config;
use crate::errors::StorageResult;

pub const REPORT_FILE_NAME: &str = "comparison_report.json";

/// Download `path` into `temp_dir` if it is an `s3://` URI; local paths are
/// returned unchanged. URIs in another bucket get a temporary client.
pub fn download_if_remote(storage: &S3Storage, path: &str, temp_dir: &Path) -> StorageResult<PathBuf> {
    download_if_remote_with(storage, path, temp_dir, |bucket| S3Storage::new(bucket))
}

fn download_if_remote_with<F>(
    storage: &S3Storage,
    path: &str,
    temp_dir: &Path,
    open_bucket: F,
) -> StorageResult<PathBuf>
where
    F: FnOnce(&str) -> StorageResult<S3Storage>,
{
    if !is_s3_path(path) {
        return Ok(PathBuf::from(path));
    }

    let uri = S3Uri::parse(path)?;
    tracing::info!("Downloading {}", uri);
    if uri.bucket == storage.bucket_name() {
        storage.download_object(temp_dir, &uri.key)
    } else {
        open_bucket(&uri.bucket)?.download_object(temp_dir, &uri.key)
    }
}

/// Upload `report_json` as `comparison_report.json` plus every file under
/// `output_dir` (if it exists) below the formatted output prefix.
///
/// Returns the uploaded keys, report first.
pub fn upload_report(
    storage: &S3Storage,
    s3_config: &S3Config,
    transaction_id: &str,
    report_json: &str,
    output_dir: &Path,
) -> Result<Vec<String>> {
    let prefix = s3_config.output_prefix_for(transaction_id)?;

    let report_key = format!("{}{}", prefix, REPORT_FILE_NAME);
    storage
        .upload_string(&report_key, report_json)
        .with_context(|| format!("Failed to upload report to {}", storage.s3_uri(&report_key)))?;
    tracing::info!("Report uploaded to: {}", storage.s3_uri(&report_key));

    let mut uploaded = vec![report_key];
    if output_dir.exists() {
        for (local_path, relative) in local_files(output_dir)? {
            let key = format!("{}{}", prefix, relative);
            if storage.upload_file(&key, &local_path)? {
                uploaded.push(key);
            }
        }
    }
    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn storage(bucket: &str) -> S3Storage {
        S3Storage::with_store(bucket, Arc::new(InMemory::new())).unwrap()
    }

    #[test]
    fn test_local_paths_pass_through() {
        let s3 = storage("main");
        let dir = TempDir::new().unwrap();
        let path = download_if_remote(&s3, "/data/input.pdf", dir.path()).unwrap();
        assert_eq!(path, PathBuf::from("/data/input.pdf"));
    }

    #[test]
    fn test_same_bucket_download() {
        let s3 = storage("main");
        s3.upload_string("inputs/doc.md", "# doc").unwrap();
        let dir = TempDir::new().unwrap();

        let path = download_if_remote(&s3, "s3://main/inputs/doc.md", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("doc.md"));
        assert_eq!(fs::read_to_string(path).unwrap(), "# doc");
    }

    #[test]
    fn test_foreign_bucket_uses_its_own_client() {
        let s3 = storage("main");
        let dir = TempDir::new().unwrap();

        let path = download_if_remote_with(&s3, "s3://shared/in/a.txt", dir.path(), |bucket| {
            assert_eq!(bucket, "shared");
            let other = storage(bucket);
            other.upload_string("in/a.txt", "from shared")?;
            Ok(other)
        })
        .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "from shared");
    }

    #[test]
    fn test_upload_report_with_output_dir() {
        let s3 = storage("main");
        let config = S3Config {
            bucket: Some("main".to_string()),
            output_prefix: Some("reports/{transaction_id}/".to_string()),
        };
        let out = TempDir::new().unwrap();
        fs::create_dir_all(out.path().join("pages")).unwrap();
        fs::write(out.path().join("summary.md"), "sum").unwrap();
        fs::write(out.path().join("pages/p1.json"), "{}").unwrap();

        let keys = upload_report(&s3, &config, "tx-9", r#"{"diff":0}"#, out.path()).unwrap();
        assert_eq!(
            keys,
            vec![
                "reports/tx-9/comparison_report.json".to_string(),
                "reports/tx-9/pages/p1.json".to_string(),
                "reports/tx-9/summary.md".to_string(),
            ]
        );
        assert_eq!(
            s3.load_text("reports/tx-9/comparison_report.json").unwrap(),
            r#"{"diff":0}"#
        );
    }

    #[test]
    fn test_upload_report_without_output_dir() {
        let s3 = storage("main");
        let config = S3Config {
            bucket: None,
            output_prefix: Some("out/{transaction_id}-".to_string()),
        };
        let keys = upload_report(&s3, &config, "7", "{}", Path::new("/no/such/dir")).unwrap();
        assert_eq!(keys, vec!["out/7-comparison_report.json".to_string()]);
    }

    #[test]
    fn test_upload_report_requires_prefix() {
        let s3 = storage("main");
        let err = upload_report(&s3, &S3Config::default(), "7", "{}", Path::new("/no/such/dir"))
            .unwrap_err();
        assert!(err.downcast_ref::<crate::errors::ConfigError>().is_some());
    }
}
