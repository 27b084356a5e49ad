// Mikoshi - research assistant chat loop
// Main entry point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mikoshi::chatbot::ChatbotService;
use mikoshi::cli::Repl;
use mikoshi::config::{load_config, validate_config_file};

/// Chat with the configured research assistant model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (default: $MIKOSHI_CONFIG or config/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Grade every answer and regenerate failed ones
    #[arg(long, default_value_t = false)]
    reflect: bool,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "mikoshi=debug" } else { "mikoshi=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Fail fast on a missing --config before anything else
    validate_config_file(args.config.as_deref())?;

    let mut config = load_config(args.config.as_deref())?;
    if args.reflect {
        config.chatbot.reflection.enabled = true;
    }

    let service = ChatbotService::from_config(&config.llm_config.client, &config.chatbot)?;
    let mut repl = Repl::new(service)?;
    repl.run().await?;

    Ok(())
}
