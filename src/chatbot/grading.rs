// Answer grading
//
// Asks the configured model to review a question/answer pair and return a
// two-field verdict through the provider's structured output mode.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::prompts::{grading_request, REVIEWER_SYSTEM_PROMPT};
use crate::providers::{Message, ModelGateway, OutputSchema};

/// Binary grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Yes,
    No,
}

/// Structured output of a grading call. Produced per call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingVerdict {
    pub score: Score,
    /// Brief reasoning for the score
    pub explanation: String,
}

impl GradingVerdict {
    pub fn passed(&self) -> bool {
        self.score == Score::Yes
    }
}

/// Schema the reviewer's output must satisfy
pub fn verdict_schema() -> OutputSchema {
    OutputSchema {
        name: "grading_verdict".to_string(),
        description: "Structured output for grading chatbot answers in scientific contexts"
            .to_string(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "score": {
                    "type": "string",
                    "enum": ["yes", "no"],
                    "description": "'yes' if the answer is scientifically sound, otherwise 'no'"
                },
                "explanation": {
                    "type": "string",
                    "description": "Brief reasoning for the score"
                }
            },
            "required": ["score", "explanation"]
        }),
    }
}

/// Grades answers with the same gateway that generated them
#[derive(Clone)]
pub struct Grader {
    gateway: Arc<ModelGateway>,
}

impl Grader {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self { gateway }
    }

    pub async fn grade(&self, question: &str, answer: &str) -> Result<GradingVerdict> {
        let messages = [Message::human(grading_request(question, answer))];
        let verdict: GradingVerdict = self
            .gateway
            .generate_structured(REVIEWER_SYSTEM_PROMPT, &messages, verdict_schema())
            .await
            .context("Failed to grade answer")?;

        tracing::debug!(passed = verdict.passed(), "Grading verdict: {}", verdict.explanation);
        Ok(verdict)
    }
}
