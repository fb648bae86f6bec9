//! Command-line interface definition for Cryptomoon
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat plus one-shot commands for market
//! summaries, tools, the moon phase, periodic refresh and the transcript.

use clap::{Parser, Subcommand};

/// Cryptomoon - crypto market and moon-phase chat client
///
/// Talks to a crypto backend and a moon-phase backend, routes each message
/// to the right one, and keeps the conversation in a local cache.
#[derive(Parser, Debug, Clone)]
#[command(name = "cryptomoon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub json_logs: bool,

    /// Override the crypto backend base URL
    #[arg(long)]
    pub crypto_url: Option<String>,

    /// Override the moon-phase backend base URL
    #[arg(long)]
    pub moon_url: Option<String>,

    /// Override the cache directory
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Cryptomoon
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive chat
    Chat {
        /// Start the periodic summary refresh together with the chat
        #[arg(short, long)]
        watch: bool,
    },

    /// Send one message and print the answer
    Ask {
        /// Message text; moon-related wording goes to the moon backend
        message: Vec<String>,
    },

    /// Fetch the combined market and moon-phase summary
    Summary,

    /// List tools offered by both backends
    Tools {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the current moon phase (served from the daily cache)
    Moon,

    /// Run the periodic summary refresh until interrupted
    Watch {
        /// Refresh interval in seconds (overrides configuration)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Inspect or clear the saved transcript
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// Transcript subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// Show the saved transcript
    Show {
        /// Only show the most recent N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Delete the saved transcript
    Clear,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
