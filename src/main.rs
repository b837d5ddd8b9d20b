//! Fxtone CLI - Function Graphing and Sonification
//!
//! Command-line interface for the Fxtone engine.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fxtone::cli::{commands, Cli, Commands};
use fxtone::config::AppConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Fxtone v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_or_default(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Some(cmd) => handle_command(cmd, &config, &cli.prefs).await,
        None => {
            println!("Fxtone v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

async fn handle_command(cmd: Commands, config: &AppConfig, prefs: &std::path::Path) -> anyhow::Result<()> {
    match cmd {
        Commands::Eval { expression, xs } => commands::eval(&expression, &xs)?,
        Commands::Samples { function, step } => commands::samples(&function, step, config)?,
        Commands::Graph { function, output } => commands::graph(&function, &output, config, prefs)
            .with_context(|| format!("rendering graph to {}", output.display()))?,
        Commands::Play {
            function,
            output,
            stop_after,
        } => {
            commands::play(&function, &output, stop_after, config)
                .await
                .with_context(|| format!("writing audio to {}", output.display()))?;
        }
        Commands::Theme { toggle } => commands::theme(prefs, toggle)?,
    }
    Ok(())
}
