// CLI module
// Line-editor chat loop over the chatbot service

mod commands;
mod repl;

pub use commands::Input;
pub use repl::Repl;
