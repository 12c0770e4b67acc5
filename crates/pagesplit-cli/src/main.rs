//! pagesplit CLI - split a web page into body HTML, prefixed CSS, and script URLs
//!
//! This is the main entry point for the pagesplit command-line interface.
//! Command implementations live in the `commands` module.

use std::io;

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod utils;

use cli::{CacheCommands, Cli, Commands};
use utils::logging::initialize_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    execute_command(cli).await
}

async fn execute_command(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Split(args) => {
            commands::execute_split(&args, config, io::stdout().lock()).await?;
        },
        Commands::Cache {
            command: CacheCommands::Clear { cache_dir },
        } => {
            let dir = cache_dir.unwrap_or(config.cache.dir);
            let backend = commands::open_cache(&dir)?;
            commands::execute_clear(&backend, io::stdout().lock())?;
        },
        Commands::Config => commands::show_config(&config, io::stdout().lock())?,
    }
    Ok(())
}
