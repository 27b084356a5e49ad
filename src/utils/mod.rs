// Small helpers shared by the chat loop and the storage tooling

pub mod prompt;

pub use prompt::{clean_prompt, CleanOptions};
