// Research assistant chatbot
//
// service -> graph -> (gateway, grader) -> provider

pub mod conversation;
pub mod graph;
pub mod grading;
pub mod prompts;
pub mod service;

pub use conversation::Conversation;
pub use graph::{ChatGraph, GraphState, ReflectionOutcome, TurnState};
pub use grading::{Grader, GradingVerdict, Score};
pub use service::ChatbotService;
