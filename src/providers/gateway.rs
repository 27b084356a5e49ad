// Model gateway
//
// One selected provider behind a "generate from message history" call.
// Built explicitly from configuration by whoever owns it (the chat
// service), never as a process-wide singleton.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use super::factory::create_provider_from_config;
use super::types::{Completion, Message, OutputSchema, ProviderRequest};
use super::LlmProvider;
use crate::config::ClientConfig;
use crate::errors::GenerationError;

/// Uniform text / structured generation over the configured provider
pub struct ModelGateway {
    provider: Box<dyn LlmProvider>,
    system_prompt: Option<String>,
}

impl ModelGateway {
    /// Build the provider named by the client config.
    ///
    /// Unknown or unimplemented providers fail here, not at call time.
    pub fn from_config(client: &ClientConfig) -> Result<Self> {
        let provider =
            create_provider_from_config(client).context("Failed to initialise model gateway")?;
        Ok(Self::new(provider))
    }

    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            provider,
            system_prompt: None,
        }
    }

    /// System prompt sent with every `generate` call
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.default_model()
    }

    /// Generate a text reply to the conversation so far.
    pub async fn generate(&self, messages: &[Message]) -> Result<String> {
        let mut request = ProviderRequest::new(messages.to_vec());
        if let Some(system) = &self.system_prompt {
            request = request.with_system(system.clone());
        }

        let response = self.provider.send_message(&request).await?;
        tracing::debug!(
            provider = %response.provider,
            model = %response.model,
            stop_reason = ?response.stop_reason,
            "Generation complete"
        );
        Ok(response.completion.into_text())
    }

    /// Generate output constrained to `schema` and decode it as `T`.
    ///
    /// Uses `system` instead of the gateway's own system prompt. A text
    /// completion is accepted when its body parses as JSON.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        system: &str,
        messages: &[Message],
        schema: OutputSchema,
    ) -> Result<T> {
        let request = ProviderRequest::new(messages.to_vec())
            .with_system(system)
            .with_schema(schema);

        let response = self.provider.send_message(&request).await?;
        let value = match response.completion {
            Completion::Structured(value) => value,
            Completion::Text(text) => {
                serde_json::from_str(text.trim()).map_err(|e| GenerationError::Structured {
                    reason: format!("text completion is not JSON: {}", e),
                })?
            }
        };

        serde_json::from_value(value).map_err(|e| {
            GenerationError::Structured {
                reason: e.to_string(),
            }
            .into()
        })
    }
}
