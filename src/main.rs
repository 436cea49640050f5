//! Leadflow - Automotive lead assistant
//!
//! Main entry point for the CLI application.

use clap::Parser;
use leadflow::{Config, Repl, StoreBackend};
use tracing_subscriber::EnvFilter;

/// Leadflow - multi-agent lead assistant
#[derive(Parser, Debug)]
#[command(name = "leadflow")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Conversation thread to open or resume
    #[arg(long, short = 't', default_value = "1")]
    thread: String,

    /// Model for the host assistant
    #[arg(long)]
    primary_model: Option<String>,

    /// Model for the lead specialist
    #[arg(long)]
    specialist_model: Option<String>,

    /// Keep threads in memory only
    #[arg(long)]
    memory: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

fn init_logging(debug: bool) {
    let default = if debug { "leadflow=debug" } else { "leadflow=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref model) = args.primary_model {
        config.models.primary = model.clone();
    }

    if let Some(ref model) = args.specialist_model {
        config.models.specialist = model.clone();
    }

    if args.memory {
        config.store.backend = StoreBackend::Memory;
    }

    if args.debug {
        config.agent.debug = true;
    }

    init_logging(config.agent.debug);

    let mut repl = Repl::with_config(config, args.thread)?;

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        repl.run_once(&prompt).await?;
        return Ok(());
    }

    // Interactive REPL mode
    repl.run().await?;

    Ok(())
}
