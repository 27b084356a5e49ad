// Interactive chat loop

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::commands::Input;
use crate::chatbot::ChatbotService;

const BANNER: &str = "Mikoshi (type 'exit' to quit)";
const PROMPT: &str = "You: ";
const REPLY_LABEL: &str = "Mikoshi: ";

pub struct Repl {
    service: ChatbotService,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(service: ChatbotService) -> Result<Self> {
        let editor = DefaultEditor::new().context("Failed to initialise line editor")?;
        Ok(Self { service, editor })
    }

    /// Read lines until `exit`/`quit`, Ctrl-C or Ctrl-D.
    ///
    /// A failed turn is reported and the loop continues.
    pub async fn run(&mut self) -> Result<()> {
        println!("{}", BANNER);

        loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    println!("Exiting...");
                    break;
                }
                Err(e) => return Err(e).context("Failed to read input"),
            };

            let message = match Input::parse(&line) {
                Input::Quit => {
                    println!("Goodbye");
                    break;
                }
                Input::Empty => continue,
                Input::Message(message) => message,
            };

            if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                tracing::debug!("Could not record history entry: {}", e);
            }

            match self.service.chat(&message).await {
                Ok(reply) => println!("{}{}", REPLY_LABEL, reply),
                Err(e) => eprintln!("Error: {:#}", e),
            }
        }

        Ok(())
    }
}
