//! Main Entrypoint for the Luna Assistant
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and the command line.
//! 2. Loading the command table and training or connecting the fallback source.
//! 3. Greeting the user and running the interactive shell until exit.

use anyhow::Context;
use clap::Parser;
use luna_assistant::{config::Config, console::StdoutConsole, shell, startup::build_session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "luna", version, about = "Luna voice and text assistant")]
struct Cli {
    /// Command table file (overrides LUNA_COMMANDS_PATH)
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Conversation corpus file (overrides LUNA_CORPUS_PATH)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Handle a single utterance and exit
    #[arg(long, value_name = "UTTERANCE")]
    once: Option<String>,

    /// Start voice listening right after the greeting
    #[arg(long)]
    listen: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(commands) = cli.commands {
        config.commands_path = commands;
    }
    if let Some(corpus) = cli.corpus {
        config.corpus_path = corpus;
    }

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!(
        commands = %config.commands_path.display(),
        fallback = ?config.fallback_source,
        "Configuration loaded. Initializing session..."
    );

    // --- 3. Build the Session ---
    let session = build_session(&config, Arc::new(StdoutConsole)).await?;

    if let Some(utterance) = cli.once {
        session.handle(&utterance).await;
        return Ok(());
    }

    // --- 4. Greet and Run ---
    session.greet().await;
    if cli.listen {
        session.start_listening().await;
    }
    shell::run(session, BufReader::new(tokio::io::stdin())).await?;

    info!("Luna has shut down.");
    Ok(())
}
