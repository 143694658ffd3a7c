//! Turn One CLI
//!
//! Command-line host for the Turn One live feed client.

mod bell;
mod commands;
mod display;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use turnone_core::config::{DEFAULT_ORIGIN, ENV_DELAY_MS, ENV_ORIGIN};
use turnone_core::FeedConfig;

#[derive(Parser)]
#[command(name = "turnone")]
#[command(version, about = "Delayed live telemetry feed client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Origin hosting the feed
    #[arg(long, global = true, env = ENV_ORIGIN, default_value = DEFAULT_ORIGIN)]
    origin: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the live feed
    Watch {
        /// Broadcast delay in milliseconds
        #[arg(long, env = ENV_DELAY_MS, default_value_t = 0)]
        delay_ms: u64,

        /// Do not ring the terminal bell on new messages
        #[arg(long)]
        no_alerts: bool,
    },

    /// Print the WebSocket endpoint the origin resolves to
    Resolve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("turnone=info".parse()?)
                .add_directive("turnone_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = FeedConfig::new(cli.origin);

    match cli.command {
        Commands::Watch {
            delay_ms,
            no_alerts,
        } => {
            commands::watch::run(config.with_delay_ms(delay_ms), !no_alerts).await?;
        }
        Commands::Resolve => commands::resolve::run(&config)?,
    }

    Ok(())
}
