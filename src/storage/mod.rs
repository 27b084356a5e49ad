// Object store sync helper
//
// Blocking helpers (`S3Storage`) for scripts and the report workflow, and
// async upload helpers (`S3Session`) for callers already inside tokio.

pub mod report;
pub mod s3;
pub mod session;
pub mod uri;

#[cfg(test)]
pub(crate) mod testing;

pub use report::{download_if_remote, upload_report};
pub use s3::S3Storage;
pub use session::{EnvConnector, S3Session, StoreConnector};
pub use uri::{is_s3_path, object_key, parse_s3_key, S3Uri};
