// Multi-provider LLM support
//
// This module provides an abstraction layer over the hosted model APIs
// (OpenAI, Amazon Bedrock, Google Gemini) so the chatbot talks to one
// interface whichever provider the config selects.

use anyhow::Result;
use async_trait::async_trait;

pub mod types;

// Provider implementations
pub mod bedrock;
pub mod gemini;
pub mod openai;

// Retry with backoff, shared by every provider
pub mod retry;

// Provider factory
pub mod factory;

// Config-driven entry point used by the chatbot
pub mod gateway;

#[cfg(test)]
pub(crate) mod scripted;

// Re-export commonly used types
pub use factory::{create_provider, create_provider_from_config};
pub use gateway::ModelGateway;
pub use types::{Completion, Message, OutputSchema, ProviderRequest, ProviderResponse, Role};

use crate::config::ProviderSettings;
use crate::errors::ConfigError;

/// Trait for LLM providers
///
/// All providers implement this trait, providing a unified interface for
/// sending a conversation and getting back a text or structured completion.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request and wait for the full response
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Get the provider name (e.g., "openai", "bedrock", "gemini")
    fn name(&self) -> &str;

    /// Get the model this provider sends requests to
    fn default_model(&self) -> &str;
}

/// Explicit key from the settings, else the first non-empty env var.
pub(crate) fn resolve_api_key(settings: &ProviderSettings, env_vars: &[&str]) -> Result<String> {
    if let Some(key) = settings.api_key.as_ref().filter(|k| !k.is_empty()) {
        return Ok(key.clone());
    }

    env_vars
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .ok_or_else(|| {
            ConfigError::MissingApiKey {
                provider: settings.provider.to_string(),
                env_var: env_vars.join(" or "),
            }
            .into()
        })
}
