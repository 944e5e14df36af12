use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use headliner_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "headliner")]
#[command(author, version, about = "Hourly news headline digest by email")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML configuration file (environment variables still override it)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the liveness server, the hourly digest and the keep-alive ping
    Serve,
    /// Send one digest now and exit
    Send,
    /// Print the digest that would be sent, without sending it
    Preview,
    /// Validate the configuration and print it with secrets masked
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Arc::new(AppConfig::load(cli.config.as_deref())?);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Some(Commands::Serve) | None => commands::serve::start(config).await,
        Some(Commands::Send) => commands::send::run(&config).await,
        Some(Commands::Preview) => commands::preview::run(&config).await,
        Some(Commands::CheckConfig) => commands::check_config::run(&config),
    }
}
