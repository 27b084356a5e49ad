// Configuration structs
//
// Mirrors the config document:
//
//   llm_config.client.name        -> which provider block to use
//   llm_config.client.<provider>  -> model_name + model_params
//   s3.output_prefix              -> report destination template
//   chatbot.reflection            -> answer grading / regeneration

use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_REFLECTION_RETRIES, TRANSACTION_ID_PLACEHOLDER};
use crate::errors::ConfigError;

/// Root of the configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm_config: LlmConfig,

    #[serde(default)]
    pub s3: S3Config,

    #[serde(default)]
    pub chatbot: ChatbotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub client: ClientConfig,
}

/// Provider selection plus one optional block per known provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Provider name, matched case-insensitively ("openai", "BEDROCK", ...)
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrock: Option<ProviderBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<ProviderBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slip: Option<ProviderBlock>,
}

/// Per-provider settings block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderBlock {
    pub model_name: String,

    #[serde(default)]
    pub model_params: ModelParams,

    /// Override the API endpoint (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// AWS region (Bedrock only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Generation parameters. Every field is optional; defaults live in
/// `constants.rs` and are applied in `ProviderSettings::from_block`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Bedrock's name for the output token limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gen_len: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// Object store settings used by the reporting helpers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    /// Template containing `{transaction_id}`, e.g. "reports/{transaction_id}/"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_prefix: Option<String>,
}

impl S3Config {
    /// Resolve the output prefix for one transaction.
    pub fn output_prefix_for(&self, transaction_id: &str) -> Result<String, ConfigError> {
        let template = self
            .output_prefix
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("s3.output_prefix is not set".to_string()))?;
        Ok(template.replace(TRANSACTION_ID_PLACEHOLDER, transaction_id))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatbotConfig {
    #[serde(default)]
    pub reflection: ReflectionConfig,
}

/// Answer grading after each generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReflectionConfig {
    /// Off by default: the shipped pipeline is generate-only
    #[serde(default)]
    pub enabled: bool,

    /// Regenerations allowed per turn when the grader says "no"
    #[serde(default = "default_reflection_retries")]
    pub max_retries: u32,
}

fn default_reflection_retries() -> u32 {
    DEFAULT_REFLECTION_RETRIES
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: DEFAULT_REFLECTION_RETRIES,
        }
    }
}
