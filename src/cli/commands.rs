// Chat loop input classification

use crate::utils::{clean_prompt, CleanOptions};

/// What to do with one line read from the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// `exit` / `quit`, any case
    Quit,
    /// Nothing left after cleaning
    Empty,
    /// Cleaned text to send to the chatbot
    Message(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            return Input::Quit;
        }

        let cleaned = clean_prompt(trimmed, CleanOptions::preserving_newlines());
        if cleaned.is_empty() {
            Input::Empty
        } else {
            Input::Message(cleaned)
        }
    }
}
