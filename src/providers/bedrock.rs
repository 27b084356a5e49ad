// Amazon Bedrock provider (Converse API)
//
// Authenticates with a Bedrock API key (bearer token) so requests can go
// through the same reqwest client as the other providers. Structured output
// is obtained by forcing a single tool call whose input schema is the
// requested schema; the tool input is the structured result.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::retry::with_retry;
use super::types::{Completion, OutputSchema, ProviderRequest, ProviderResponse, Role};
use super::{resolve_api_key, LlmProvider};
use crate::config::ProviderSettings;
use crate::errors::{ConfigError, GenerationError};

const REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_REGION: &str = "us-east-1";
const API_KEY_ENV: &[&str] = &["AWS_BEARER_TOKEN_BEDROCK"];

/// Amazon Bedrock provider
#[derive(Clone)]
pub struct BedrockProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    max_retries: u32,
}

impl BedrockProvider {
    /// Create a provider from resolved settings.
    ///
    /// Region comes from the settings, then `AWS_REGION`, then us-east-1.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let api_key = resolve_api_key(settings, API_KEY_ENV)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = match &settings.base_url {
            Some(url) => url.clone(),
            None => {
                let region = settings
                    .region
                    .clone()
                    .or_else(|| std::env::var("AWS_REGION").ok())
                    .unwrap_or_else(|| DEFAULT_REGION.to_string());
                format!("https://bedrock-runtime.{}.amazonaws.com", region)
            }
        };

        Ok(Self {
            client,
            api_key,
            base_url,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_p: settings.top_p,
            max_retries: settings.max_retries,
        })
    }

    /// `{base}/model/{modelId}/converse`, with the model id as one path segment
    fn converse_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ConfigError::Invalid(format!("Invalid Bedrock base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| ConfigError::Invalid(format!("Bedrock base URL '{}' cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(["model", self.model.as_str(), "converse"]);
        Ok(url)
    }

    /// Convert ProviderRequest to Converse API format
    fn to_converse_request(&self, request: &ProviderRequest) -> ConverseRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| ConverseMessage {
                role: match msg.role {
                    Role::Human => "user".to_string(),
                    Role::Assistant => "assistant".to_string(),
                },
                content: vec![ConverseText {
                    text: msg.content.clone(),
                }],
            })
            .collect();

        let system = request.system.as_ref().map(|system| {
            vec![ConverseText {
                text: system.clone(),
            }]
        });

        ConverseRequest {
            messages,
            system,
            inference_config: InferenceConfig {
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                top_p: self.top_p,
            },
            tool_config: request.schema.as_ref().map(forced_tool),
        }
    }

    /// Convert Converse response to ProviderResponse
    fn from_converse_response(
        &self,
        response: ConverseResponse,
        structured: bool,
    ) -> Result<ProviderResponse> {
        let blocks = response.output.message.content;
        if blocks.is_empty() {
            return Err(GenerationError::EmptyResponse {
                provider: "bedrock".to_string(),
            }
            .into());
        }

        let completion = if structured {
            let tool_input = blocks
                .into_iter()
                .find_map(|block| block.tool_use.map(|tool_use| tool_use.input))
                .ok_or_else(|| GenerationError::Structured {
                    reason: "Bedrock response contained no tool use block".to_string(),
                })?;
            Completion::Structured(tool_input)
        } else {
            let text = blocks
                .into_iter()
                .filter_map(|block| block.text)
                .collect::<Vec<_>>()
                .join("");
            Completion::Text(text)
        };

        Ok(ProviderResponse {
            completion,
            model: self.model.clone(),
            stop_reason: response.stop_reason,
            provider: "bedrock".to_string(),
        })
    }

    /// Send a single message request (no retry)
    async fn send_message_once(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let converse_request = self.to_converse_request(request);
        let url = self.converse_url()?;

        tracing::debug!("Sending request to Bedrock Converse API: {:?}", converse_request);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&converse_request)
            .send()
            .await
            .map_err(|e| GenerationError::Request {
                provider: "bedrock".to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                provider: "bedrock".to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let converse_response: ConverseResponse = response
            .json()
            .await
            .context("Failed to parse Bedrock Converse response")?;

        tracing::debug!("Received response: {:?}", converse_response);

        self.from_converse_response(converse_response, request.schema.is_some())
    }
}

fn forced_tool(schema: &OutputSchema) -> ToolConfig {
    ToolConfig {
        tools: vec![Tool {
            tool_spec: ToolSpec {
                name: schema.name.clone(),
                description: schema.description.clone(),
                input_schema: ToolInputSchema {
                    json: schema.schema.clone(),
                },
            },
        }],
        tool_choice: ToolChoice {
            tool: ToolChoiceName {
                name: schema.name.clone(),
            },
        },
    }
}

#[async_trait]
impl LlmProvider for BedrockProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        with_retry(self.max_retries, || self.send_message_once(request)).await
    }

    fn name(&self) -> &str {
        "bedrock"
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

// Converse API types

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest {
    messages: Vec<ConverseMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<Vec<ConverseText>>,
    inference_config: InferenceConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

#[derive(Debug, Clone, Serialize)]
struct ConverseMessage {
    role: String,
    content: Vec<ConverseText>,
}

#[derive(Debug, Clone, Serialize)]
struct ConverseText {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    tools: Vec<Tool>,
    tool_choice: ToolChoice,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    tool_spec: ToolSpec,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolSpec {
    name: String,
    description: String,
    input_schema: ToolInputSchema,
}

#[derive(Debug, Clone, Serialize)]
struct ToolInputSchema {
    json: Value,
}

#[derive(Debug, Clone, Serialize)]
struct ToolChoice {
    tool: ToolChoiceName,
}

#[derive(Debug, Clone, Serialize)]
struct ToolChoiceName {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: ConverseOutput,
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConverseOutput {
    message: ConverseOutputMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ConverseOutputMessage {
    #[serde(default)]
    content: Vec<ConverseContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseContentBlock {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    tool_use: Option<ConverseToolUse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConverseToolUse {
    input: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderName;
    use crate::providers::types::Message;
    use mockito::Matcher;

    const MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";

    fn settings(base_url: &str) -> ProviderSettings {
        ProviderSettings::with_defaults(ProviderName::Bedrock, MODEL)
            .with_api_key("bedrock-key")
            .with_base_url(base_url)
            .with_max_retries(0)
    }

    #[test]
    fn test_region_endpoint() {
        let mut s = ProviderSettings::with_defaults(ProviderName::Bedrock, MODEL)
            .with_api_key("k");
        s.region = Some("eu-central-1".to_string());
        let provider = BedrockProvider::from_settings(&s).unwrap();
        let url = provider.converse_url().unwrap();
        assert_eq!(url.host_str(), Some("bedrock-runtime.eu-central-1.amazonaws.com"));
        assert!(url.path().starts_with("/model/anthropic.claude-3-haiku"));
        assert!(url.path().ends_with("/converse"));
    }

    #[test]
    fn test_request_conversion() {
        let provider = BedrockProvider::from_settings(&settings("http://localhost")).unwrap();
        let request = ProviderRequest::new(vec![Message::human("hi")]).with_system("be precise");
        let body = serde_json::to_value(provider.to_converse_request(&request)).unwrap();

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["text"], "hi");
        assert_eq!(body["system"][0]["text"], "be precise");
        assert_eq!(body["inferenceConfig"]["maxTokens"], 2048);
        assert!(body.get("toolConfig").is_none());
    }

    #[tokio::test]
    async fn test_send_message_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex(r"^/model/.+/converse$".to_string()))
            .match_header("authorization", "Bearer bedrock-key")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "output": {"message": {"role": "assistant", "content": [{"text": "42"}]}},
                    "stopReason": "end_turn"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = BedrockProvider::from_settings(&settings(&server.url())).unwrap();
        let response = provider
            .send_message(&ProviderRequest::new(vec![Message::human("answer?")]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.completion, Completion::Text("42".to_string()));
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    }

    #[tokio::test]
    async fn test_structured_uses_forced_tool() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Regex(r"^/model/.+/converse$".to_string()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "toolConfig": {"toolChoice": {"tool": {"name": "grade"}}}
            })))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "output": {"message": {"role": "assistant", "content": [
                        {"toolUse": {"toolUseId": "t1", "name": "grade", "input": {"score": "yes", "explanation": "ok"}}}
                    ]}},
                    "stopReason": "tool_use"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = BedrockProvider::from_settings(&settings(&server.url())).unwrap();
        let request = ProviderRequest::new(vec![Message::human("grade")]).with_schema(OutputSchema {
            name: "grade".to_string(),
            description: "grade".to_string(),
            schema: serde_json::json!({"type": "object"}),
        });
        let response = provider.send_message(&request).await.unwrap();
        assert_eq!(
            response.completion,
            Completion::Structured(serde_json::json!({"score": "yes", "explanation": "ok"}))
        );
    }

    #[tokio::test]
    async fn test_structured_without_tool_use_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Regex(r"^/model/.+/converse$".to_string()))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "output": {"message": {"role": "assistant", "content": [{"text": "yes"}]}},
                    "stopReason": "end_turn"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = BedrockProvider::from_settings(&settings(&server.url())).unwrap();
        let request = ProviderRequest::new(vec![Message::human("grade")]).with_schema(OutputSchema {
            name: "grade".to_string(),
            description: "grade".to_string(),
            schema: serde_json::json!({"type": "object"}),
        });
        let err = provider.send_message(&request).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GenerationError>(),
            Some(GenerationError::Structured { .. })
        ));
    }
}
