// Configuration module
// Public interface for configuration loading

pub mod constants;
mod loader;
mod provider;
mod settings;

pub use loader::{load_config, load_config_from, resolve_config_path, validate_config_file};
pub use provider::{ProviderName, ProviderSettings};
pub use settings::{
    ChatbotConfig, ClientConfig, Config, LlmConfig, ModelParams, ProviderBlock, ReflectionConfig,
    S3Config,
};
