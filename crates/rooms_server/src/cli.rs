//! Command-line interface for rooms_server.

use crate::room::TurnPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tic-tac-toe rooms - concurrent two-player game server
#[derive(Parser, Debug)]
#[command(name = "rooms_server")]
#[command(about = "Two-player tic-tac-toe room server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Milliseconds between snapshots on a state stream
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Turn enforcement: strict or permissive
        #[arg(long)]
        turn_policy: Option<TurnPolicy>,

        /// Close rooms idle for this many seconds
        #[arg(long)]
        room_ttl_secs: Option<u64>,
    },

    /// Print the effective configuration as TOML
    PrintConfig {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
