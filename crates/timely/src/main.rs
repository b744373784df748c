//! Timely - Asana time tracking
//!
//! Main entry point for the Timely CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{auth, navigate, serve};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Timely - Asana time tracking
#[derive(Parser)]
#[command(name = "timely")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory for the stored session and logs
    #[arg(long, global = true, env = "TIMELY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the OAuth token exchange proxy
    Serve(serve::ServeArgs),

    /// Sign in, inspect or clear the Asana session
    Auth(auth::AuthArgs),

    /// Resolve a route through the navigation guards
    Navigate(navigate::NavigateArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .or_else(|| dirs::data_dir().map(|d| d.join("timely")))
        .unwrap_or_else(|| PathBuf::from(".timely"));

    // Console (human-readable) + daily JSON file
    let filter = if cli.verbose {
        "timely=debug,timely_auth=debug,timely_navigation=debug,timely_proxy=debug,tower_http=debug,info"
    } else {
        "timely=info,timely_auth=info,timely_navigation=info,timely_proxy=info,warn"
    };

    let file_appender = tracing_appender::rolling::daily(data_dir.join("logs"), "timely.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "timely=trace,timely_auth=trace,timely_navigation=trace,timely_proxy=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        data_dir,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Navigate(args) => navigate::run(args, &ctx).await,
    }
}
