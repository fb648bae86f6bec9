//! Cryptomoon - crypto market and moon-phase chat client
//!
#![doc = "Cryptomoon - crypto market and moon-phase chat client"]
#![doc = "Main entry point for the Cryptomoon terminal application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cryptomoon::cli::{Cli, Commands};
use cryptomoon::commands;
use cryptomoon::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { watch } => {
            if watch {
                tracing::debug!("Periodic refresh requested at startup");
            }
            commands::chat::run_chat(config, watch).await?;
            Ok(())
        }
        Commands::Ask { message } => {
            tracing::info!("Sending one-shot message");
            commands::ask::run_ask(config, message.join(" ")).await?;
            Ok(())
        }
        Commands::Summary => {
            tracing::info!("Fetching combined summary");
            commands::summary::run_summary(config).await?;
            Ok(())
        }
        Commands::Tools { json } => {
            commands::tools::list_tools(config, json).await?;
            Ok(())
        }
        Commands::Moon => {
            commands::moon::show_moon_phase(config).await?;
            Ok(())
        }
        Commands::Watch { interval } => {
            tracing::info!("Starting periodic refresh");
            commands::watch::run_watch(config, interval).await?;
            Ok(())
        }
        Commands::History { command } => {
            commands::history::handle_history(&config, command)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so rendered chat output on stdout stays clean.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_level = if verbose {
        "cryptomoon=debug"
    } else {
        "cryptomoon=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
