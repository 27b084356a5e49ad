// Error taxonomy
//
// Most of the crate returns anyhow::Result; these enums are the variants
// callers are expected to match on (via downcast_ref on the anyhow error).

use std::path::PathBuf;
use thiserror::Error;

/// Startup / construction failures. Never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Unsupported LLM client: {name}")]
    UnsupportedProvider { name: String },

    #[error("{provider} client not implemented yet")]
    NotImplemented { provider: String },

    #[error("Missing configuration block for provider '{provider}' (llm_config.client.{provider})")]
    MissingProviderBlock { provider: String },

    #[error("Missing API key for {provider}: set {env_var}")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures talking to the remote model.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{provider} request failed: {reason}")]
    Request { provider: String, reason: String },

    #[error("{provider} API request failed\n\nStatus: {status}\nBody: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },

    #[error("Structured output did not match the expected schema: {reason}")]
    Structured { reason: String },

    #[error("Conversation has no human message to answer")]
    NoHumanMessage,
}

/// Object store failures. "Not found" is only surfaced where the caller
/// asked for an object that must exist; existence checks and deletes
/// swallow it.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Store(#[from] object_store::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON payload error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary payload error: {0}")]
    Binary(#[from] bincode::Error),

    #[error("Object is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid S3 URI: {0}")]
    InvalidUri(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(#[from] object_store::path::Error),

    #[error("Failed to start storage runtime: {0}")]
    Runtime(String),
}

impl StorageError {
    /// True when the remote store reported the object as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Store(object_store::Error::NotFound { .. }))
    }
}

/// Result type for object store operations
pub type StorageResult<T> = Result<T, StorageError>;
