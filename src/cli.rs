//! CLI definitions for Cadence.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cadence CLI.
#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Background worker supervisor and interval scheduler")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "config/default.toml",
        env = "CADENCE_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the supervisor and HTTP server in foreground (default)
    Run {
        /// Server host, overrides the config file
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides the config file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the persisted worker settings
    Status,

    /// Validate the configuration file
    Check,

    /// Host a single job loop (used for process-kind jobs)
    #[command(hide = true)]
    Worker {
        /// Job name
        name: String,
    },
}
