pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::providers::PriceSources;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Commands exposed by the binary, besides `setup`.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Writes a fresh config into `dir` and generates the journal next to it.
    Init { dir: PathBuf },
    /// Generates the journal from an existing config.
    Generate { output: Option<PathBuf> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    run_command_with_sources(command, config_path, None).await
}

/// Like [`run_command`], fetching prices from `sources` instead of the
/// providers named in the config when given.
pub async fn run_command_with_sources(
    command: AppCommand,
    config_path: Option<&str>,
    sources: Option<PriceSources>,
) -> Result<()> {
    info!("Sample ledger generator starting...");

    let (config, base_dir, output) = match command {
        AppCommand::Init { dir } => {
            let config_path = dir.join("config.yaml");
            cli::setup::setup_at_path(&config_path)?;
            (AppConfig::load_from_path(&config_path)?, dir, None)
        }
        AppCommand::Generate { output } => {
            let config = match config_path {
                Some(path) => AppConfig::load_from_path(path)?,
                None => AppConfig::load()?,
            };
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            (config, cwd, output)
        }
    };
    debug!("Loaded config: {config:#?}");

    let journal_path = output.unwrap_or_else(|| config.journal_path(&base_dir));
    let sources = sources.unwrap_or_else(|| PriceSources::from_config(&config.providers));
    cli::generate::run(&config, &sources, &journal_path).await?;
    Ok(())
}
