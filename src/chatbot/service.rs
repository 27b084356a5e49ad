// Chat service
//
// Owns one conversation and runs the state machine for each user turn.
// Not meant for concurrent `chat` calls; `&mut self` enforces that.

use anyhow::Result;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::conversation::Conversation;
use super::graph::ChatGraph;
use super::grading::Grader;
use super::prompts::GENERATION_SYSTEM_PROMPT;
use crate::config::{ChatbotConfig, ClientConfig};
use crate::errors::GenerationError;
use crate::providers::{Message, ModelGateway};

/// One chat session
pub struct ChatbotService {
    session_id: Uuid,
    graph: ChatGraph,
    conversation: Conversation,
}

impl ChatbotService {
    /// Build the gateway (and grader, when reflection is enabled) from config.
    pub fn from_config(client: &ClientConfig, chatbot: &ChatbotConfig) -> Result<Self> {
        let gateway = ModelGateway::from_config(client)?.with_system_prompt(GENERATION_SYSTEM_PROMPT);
        tracing::info!(
            provider = gateway.provider_name(),
            model = gateway.model(),
            reflection = chatbot.reflection.enabled,
            "Chatbot ready"
        );

        let gateway = Arc::new(gateway);
        let mut graph = ChatGraph::new(Arc::clone(&gateway));
        if chatbot.reflection.enabled {
            graph = graph.with_reflection(Grader::new(gateway), chatbot.reflection.max_retries);
        }
        Ok(Self::new(graph))
    }

    pub fn new(graph: ChatGraph) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            graph,
            conversation: Conversation::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Send one user message and return the assistant's reply.
    ///
    /// If the turn fails the conversation is restored to what it was
    /// before the call.
    pub async fn chat(&mut self, user_input: &str) -> Result<String> {
        let span = tracing::info_span!("chat", session = %self.session_id);
        async {
            let checkpoint = self.conversation.len();
            self.conversation.push(Message::human(user_input));

            let result = self.graph.run(&mut self.conversation).await;
            let turn = match result {
                Ok(turn) => turn,
                Err(e) => {
                    self.conversation.truncate(checkpoint);
                    return Err(e);
                }
            };
            tracing::debug!(retries = turn.retries, "Turn complete");

            self.conversation
                .last()
                .filter(|m| !m.is_human())
                .map(|m| m.content.clone())
                .ok_or_else(|| {
                    anyhow::Error::from(GenerationError::EmptyResponse {
                        provider: "chat graph".to_string(),
                    })
                })
        }
        .instrument(span)
        .await
    }

    /// Alias for [`chat`](Self::chat)
    pub async fn send(&mut self, user_input: &str) -> Result<String> {
        self.chat(user_input).await
    }

    /// Discard all history
    pub fn reset(&mut self) {
        tracing::debug!(session = %self.session_id, "Conversation reset");
        self.conversation.clear();
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }
}
