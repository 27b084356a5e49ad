// OpenAI API provider implementation
//
// Chat Completions endpoint. Structured output uses `response_format`
// with a strict JSON schema.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::retry::with_retry;
use super::types::{Completion, OutputSchema, ProviderRequest, ProviderResponse, Role};
use super::{resolve_api_key, LlmProvider};
use crate::config::ProviderSettings;
use crate::errors::GenerationError;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const OPENAI_BASE_URL: &str = "https://api.openai.com";
const API_KEY_ENV: &[&str] = &["OPENAI_API_KEY"];

/// OpenAI API provider
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    max_retries: u32,
}

impl OpenAIProvider {
    /// Create a provider from resolved settings.
    ///
    /// The API key comes from the settings or `OPENAI_API_KEY`.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let api_key = resolve_api_key(settings, API_KEY_ENV)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_p: settings.top_p,
            max_retries: settings.max_retries,
        })
    }

    /// Convert ProviderRequest to OpenAI API format
    fn to_openai_request(&self, request: &ProviderRequest) -> OpenAIRequest {
        let mut messages: Vec<OpenAIMessage> = Vec::new();

        // System prompt goes first as a {"role":"system"} message (OpenAI convention)
        if let Some(system) = &request.system {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        for msg in &request.messages {
            let role = match msg.role {
                Role::Human => "user",
                Role::Assistant => "assistant",
            };
            messages.push(OpenAIMessage {
                role: role.to_string(),
                content: msg.content.clone(),
            });
        }

        OpenAIRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            response_format: request.schema.as_ref().map(strict_response_format),
        }
    }

    /// Convert OpenAI response to ProviderResponse
    fn from_openai_response(
        &self,
        response: OpenAIResponse,
        structured: bool,
    ) -> Result<ProviderResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::EmptyResponse {
                provider: "openai".to_string(),
            })?;

        let text = choice.message.content.unwrap_or_default();

        let completion = if structured {
            let value: Value =
                serde_json::from_str(&text).map_err(|e| GenerationError::Structured {
                    reason: format!("OpenAI returned non-JSON content: {}", e),
                })?;
            Completion::Structured(value)
        } else {
            Completion::Text(text)
        };

        Ok(ProviderResponse {
            completion,
            model: response.model,
            stop_reason: choice.finish_reason,
            provider: "openai".to_string(),
        })
    }

    /// Send a single message request (no retry)
    async fn send_message_once(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let openai_request = self.to_openai_request(request);
        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!("Sending request to OpenAI API: {:?}", openai_request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| GenerationError::Request {
                provider: "openai".to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                provider: "openai".to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI API response")?;

        tracing::debug!("Received response: {:?}", openai_response);

        self.from_openai_response(openai_response, request.schema.is_some())
    }
}

/// OpenAI's strict mode needs `additionalProperties: false` on every object.
fn strict_response_format(schema: &OutputSchema) -> OpenAIResponseFormat {
    let mut json_schema = schema.schema.clone();
    if let Some(object) = json_schema.as_object_mut() {
        object.insert("additionalProperties".to_string(), Value::Bool(false));
    }

    OpenAIResponseFormat {
        format_type: "json_schema".to_string(),
        json_schema: OpenAIJsonSchema {
            name: schema.name.clone(),
            description: schema.description.clone(),
            schema: json_schema,
            strict: true,
        },
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        with_retry(self.max_retries, || self.send_message_once(request)).await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

// OpenAI API types

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: OpenAIJsonSchema,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIJsonSchema {
    name: String,
    description: String,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}
