// Google Gemini API provider implementation
//
// Gemini has its own message format ("model" instead of "assistant", parts
// instead of content strings, systemInstruction instead of a system role),
// so requests and responses are converted here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::retry::with_retry;
use super::types::{Completion, ProviderRequest, ProviderResponse, Role};
use super::{resolve_api_key, LlmProvider};
use crate::config::ProviderSettings;
use crate::errors::GenerationError;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_ENV: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Google Gemini API provider
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    max_retries: u32,
}

impl GeminiProvider {
    /// Create a provider from resolved settings.
    ///
    /// The API key comes from the settings, `GEMINI_API_KEY` or `GOOGLE_API_KEY`.
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
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_tokens,
            top_p: settings.top_p,
            max_retries: settings.max_retries,
        })
    }

    /// Create with custom default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Convert ProviderRequest to Gemini API format
    fn to_gemini_request(&self, request: &ProviderRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|msg| GeminiContent {
                // Gemini uses "model" instead of "assistant"
                role: match msg.role {
                    Role::Human => "user".to_string(),
                    Role::Assistant => "model".to_string(),
                },
                parts: vec![GeminiPart {
                    text: msg.content.clone(),
                }],
            })
            .collect();

        let system_instruction = request.system.as_ref().map(|system| GeminiSystemInstruction {
            parts: vec![GeminiPart {
                text: system.clone(),
            }],
        });

        let (response_mime_type, response_schema) = match &request.schema {
            Some(schema) => (
                Some("application/json".to_string()),
                Some(schema.schema.clone()),
            ),
            None => (None, None),
        };

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                top_p: self.top_p,
                response_mime_type,
                response_schema,
            },
        }
    }

    /// Convert Gemini response to ProviderResponse
    fn from_gemini_response(
        &self,
        response: GeminiResponse,
        structured: bool,
    ) -> Result<ProviderResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::EmptyResponse {
                provider: "gemini".to_string(),
            })?;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let completion = if structured {
            let value: Value =
                serde_json::from_str(&text).map_err(|e| GenerationError::Structured {
                    reason: format!("Gemini returned non-JSON content: {}", e),
                })?;
            Completion::Structured(value)
        } else {
            Completion::Text(text)
        };

        Ok(ProviderResponse {
            completion,
            model: self.model.clone(),
            stop_reason: candidate.finish_reason,
            provider: "gemini".to_string(),
        })
    }

    /// Send a single message request (no retry)
    async fn send_message_once(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let gemini_request = self.to_gemini_request(request);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        tracing::debug!("Sending request to Gemini API: {:?}", gemini_request);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| GenerationError::Request {
                provider: "gemini".to_string(),
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                provider: "gemini".to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        tracing::debug!("Received response: {:?}", gemini_response);

        self.from_gemini_response(gemini_response, request.schema.is_some())
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        with_retry(self.max_retries, || self.send_message_once(request)).await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

// Gemini API types

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String, // "user" or "model"
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}
