// Conversation state machine
//
//   Start -> Generating -> Done
//   Start -> Generating -> Reflecting -> (Generating | Done)
//
// The reflecting path is only taken when a grader is attached. Each turn
// carries its own retry counter, so concurrent sessions never share one.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use super::conversation::Conversation;
use super::grading::Grader;
use crate::errors::GenerationError;
use crate::providers::{Message, ModelGateway, Role};

/// Where a turn is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Start,
    Generating,
    Reflecting,
    Done,
}

impl fmt::Display for GraphState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphState::Start => "start",
            GraphState::Generating => "generating",
            GraphState::Reflecting => "reflecting",
            GraphState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of grading the newest answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionOutcome {
    pub passed: bool,
    pub explanation: String,
    pub should_retry: bool,
}

/// Per-turn state: current node, regenerations used, last grading result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnState {
    pub state: GraphState,
    pub retries: u32,
    pub last_reflection: Option<ReflectionOutcome>,
}

impl TurnState {
    fn new() -> Self {
        Self {
            state: GraphState::Start,
            retries: 0,
            last_reflection: None,
        }
    }
}

/// Drives one turn of the conversation to `Done`
pub struct ChatGraph {
    gateway: Arc<ModelGateway>,
    grader: Option<Grader>,
    max_retries: u32,
}

impl ChatGraph {
    /// Generate-only pipeline
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self {
            gateway,
            grader: None,
            max_retries: 0,
        }
    }

    /// Grade every answer and regenerate failed ones up to `max_retries` times.
    pub fn with_reflection(mut self, grader: Grader, max_retries: u32) -> Self {
        self.grader = Some(grader);
        self.max_retries = max_retries;
        self
    }

    /// Run the pipeline. The conversation's tail must be a human message.
    ///
    /// On success the tail is the assistant reply. If the first generation
    /// fails nothing is appended and the error is returned.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<TurnState> {
        let mut turn = TurnState::new();
        let prompt_len = conversation.len();

        loop {
            tracing::debug!(state = %turn.state, retries = turn.retries, "Graph step");
            turn.state = match turn.state {
                GraphState::Start => {
                    match conversation.last() {
                        Some(message) if message.role == Role::Human => {}
                        _ => return Err(GenerationError::NoHumanMessage.into()),
                    }
                    GraphState::Generating
                }
                GraphState::Generating => {
                    let had_answer = conversation.len() > prompt_len;
                    match self.generate(conversation, prompt_len).await {
                        Ok(()) => {}
                        Err(e) if had_answer => {
                            tracing::warn!("Regeneration failed, keeping previous answer: {:#}", e);
                            turn.state = GraphState::Done;
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                    if self.grader.is_some() {
                        GraphState::Reflecting
                    } else {
                        GraphState::Done
                    }
                }
                GraphState::Reflecting => {
                    let outcome = self.reflect(conversation).await;
                    let retry = match &outcome {
                        Some(outcome) => outcome.should_retry && turn.retries < self.max_retries,
                        None => false,
                    };
                    if let Some(outcome) = &outcome {
                        if outcome.should_retry && !retry {
                            tracing::info!(
                                "Answer failed review after {} retries, keeping last answer",
                                turn.retries
                            );
                        }
                    }
                    turn.last_reflection = outcome;
                    if retry {
                        turn.retries += 1;
                        GraphState::Generating
                    } else {
                        GraphState::Done
                    }
                }
                GraphState::Done => return Ok(turn),
            };
        }
    }

    /// Generation node: answer the history up to `prompt_len`, replacing any
    /// earlier candidate for this turn.
    async fn generate(&self, conversation: &mut Conversation, prompt_len: usize) -> Result<()> {
        let reply = self
            .gateway
            .generate(&conversation.messages()[..prompt_len])
            .await?;
        conversation.truncate(prompt_len);
        conversation.push(Message::assistant(reply));
        Ok(())
    }

    /// Reflection node: grade the tail answer against the first question.
    ///
    /// Returns `None` when grading itself failed; the answer then stands.
    async fn reflect(&self, conversation: &Conversation) -> Option<ReflectionOutcome> {
        let grader = self.grader.as_ref()?;
        let question = conversation.first_human()?.content.as_str();
        let answer = conversation.last()?.content.as_str();

        match grader.grade(question, answer).await {
            Ok(verdict) => {
                let passed = verdict.passed();
                Some(ReflectionOutcome {
                    passed,
                    explanation: verdict.explanation,
                    should_retry: !passed,
                })
            }
            Err(e) => {
                tracing::warn!("Grading failed, keeping answer: {:#}", e);
                None
            }
        }
    }
}
