// Unified request/response types for multi-provider LLM support
//
// These types abstract over provider-specific formats (OpenAI, Bedrock, Gemini)
// so the rest of the codebase works with one message shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Human => f.write_str("human"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One turn of dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_human(&self) -> bool {
        self.role == Role::Human
    }
}

/// JSON schema the model's output must satisfy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSchema {
    /// Identifier (function / tool / schema name on the provider side)
    pub name: String,
    pub description: String,
    /// JSON Schema object. Kept to the subset every provider accepts:
    /// no `additionalProperties`, lowercase type names.
    pub schema: Value,
}

/// Unified request format for all LLM providers
///
/// Generation parameters (temperature, token limit, top-p) are bound into
/// the provider client at construction; a request only carries content.
#[derive(Debug, Clone, Default)]
pub struct ProviderRequest {
    /// Conversation messages, oldest first
    pub messages: Vec<Message>,

    /// System prompt (sent as `system` for Bedrock, `systemInstruction` for
    /// Gemini, prepended as a `{"role":"system"}` message for OpenAI)
    pub system: Option<String>,

    /// Constrain the output to a schema; the response is then `Structured`
    pub schema: Option<OutputSchema>,
}

impl ProviderRequest {
    /// Create a new request from messages
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            system: None,
            schema: None,
        }
    }

    /// Set system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Request structured output
    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// What the model produced, decided once at the provider boundary
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Text(String),
    Structured(Value),
}

impl Completion {
    /// Text view of the completion (structured output rendered as JSON)
    pub fn into_text(self) -> String {
        match self {
            Completion::Text(text) => text,
            Completion::Structured(value) => value.to_string(),
        }
    }
}

/// Unified response from any provider
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub completion: Completion,
    pub model: String,
    pub stop_reason: Option<String>,
    /// Provider tag ("openai", "bedrock", "gemini")
    pub provider: String,
}
