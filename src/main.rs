//! Cadence - background worker supervisor
//!
//! Main entry point for the Cadence CLI and server.

mod cli;
mod cmd_worker;
mod jobs;
mod register;
mod server;

use clap::Parser;
use tracing::warn;

use cli::{Cli, Commands};
use cmd_worker::{handle_check_command, handle_status_command, handle_worker_command};
use server::{init_tracing, load_config, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Some(Commands::Status) => return handle_status_command(&config),
        Some(Commands::Check) => return handle_check_command(&cli.config, &config),
        _ => {}
    }

    init_tracing(&config.logging)?;
    if !cli.config.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            cli.config.display()
        );
    }

    match cli.command {
        Some(Commands::Worker { name }) => handle_worker_command(&config, &name).await,
        Some(Commands::Run { host, port }) => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(&cli.config, config).await
        }
        _ => run_server(&cli.config, config).await,
    }
}
