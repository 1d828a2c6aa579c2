//! CLI interface for Sway

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Maps live sensor and controller input onto synthesizer parameters
#[derive(Parser)]
#[command(name = "sway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "sway.yaml")]
        config: PathBuf,
    },

    /// Generate example configuration and script files
    Init,

    /// Print the compiled-in input signals and rotational flags
    Signals,

    /// Replay an event script through the routing engine
    Replay {
        /// Configuration file path
        #[arg(short, long, default_value = "sway.yaml")]
        config: PathBuf,

        /// Event script path
        #[arg(short, long, default_value = "sway.replay.yaml")]
        script: PathBuf,

        /// Honor script timestamps instead of replaying immediately
        #[arg(long)]
        timing: bool,

        /// Loop the script until interrupted
        #[arg(long)]
        repeat: bool,
    },
}
