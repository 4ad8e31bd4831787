//! Errbeacon CLI - Command-line interface for the telemetry forwarder
//!
//! Provides commands for:
//! - Sending a test report to verify connectivity
//! - Inspecting and validating the forwarder configuration
//! - Rendering the browser loader snippet

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod settings;

use commands::{config::ConfigCommand, snippet::SnippetCommand, test::TestCommand};

#[derive(Debug, Parser)]
#[command(name = "errbeacon", version, about = "Best-effort error and event forwarder")]
pub struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file to read
    #[arg(long, global = true, default_value = "errbeacon.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a test report to the configured service
    Test(TestCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Render the browser loader snippet
    Snippet(SnippetCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Test(cmd) => cmd.execute(&cli.config).await,
        Commands::Config(cmd) => cmd.execute(&cli.config).await,
        Commands::Snippet(cmd) => cmd.execute(&cli.config).await,
    }
}
