// Mikoshi - research assistant chat loop
// Library exports

pub mod chatbot;
pub mod cli;
pub mod config;
pub mod errors;
pub mod providers;
pub mod storage;
pub mod utils;

pub use chatbot::ChatbotService;
pub use config::{load_config, Config};
pub use errors::{ConfigError, GenerationError, StorageError};
