use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use sampledger::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Create a sample config and journal in a directory
    Init {
        /// Target directory, defaults to the current one
        dir: Option<PathBuf>,
    },
    /// Generate the journal from the configuration
    Generate {
        /// Journal file, overrides `journal_path` from the config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => sampledger::cli::setup::setup().map(|_| ()),
        Some(Commands::Init { dir }) => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            sampledger::run_command(sampledger::AppCommand::Init { dir }, None).await
        }
        Some(Commands::Generate { output }) => {
            sampledger::run_command(
                sampledger::AppCommand::Generate { output },
                cli.config_path.as_deref(),
            )
            .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
