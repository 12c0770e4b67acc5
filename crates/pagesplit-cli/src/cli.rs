//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Split a page, scoping its CSS under #embed
//! pagesplit split https://example.com/ --prefix '#embed'
//!
//! # Human-readable sections instead of JSON, skipping the cache
//! pagesplit split https://example.com/ --format text --no-cache
//!
//! # Maintenance
//! pagesplit cache clear
//! pagesplit config
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Main CLI structure for the `pagesplit` command
#[derive(Parser, Clone, Debug)]
#[command(name = "pagesplit")]
#[command(version)]
#[command(about = "pagesplit - split a web page into body HTML, prefixed CSS, and script URLs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logging on stderr
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Path to configuration file (overrides autodiscovery). Also via `PAGESPLIT_CONFIG`.
    #[arg(long, global = true, value_name = "FILE", env = "PAGESPLIT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Split a page into HTML, CSS and script URLs
    Split(SplitArgs),

    /// Manage the extraction cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Arguments for `pagesplit split`
#[derive(clap::Args, Clone, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct SplitArgs {
    /// Page URL (`http://` is assumed when no scheme is given)
    pub url: String,

    /// Token prepended to every CSS selector, e.g. `#embed`
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Do not read or write the on-disk cache
    #[arg(long)]
    pub no_cache: bool,

    /// Ignore any cached extraction and split again
    #[arg(long, conflicts_with = "no_cache")]
    pub refresh: bool,

    /// Cache directory (overrides config and `PAGESPLIT_CACHE_DIR`)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Seconds a cached extraction stays fresh
    #[arg(long, value_name = "SECS")]
    pub ttl: Option<u64>,

    /// Include diagnostics (dropped stylesheets, imports) in the output
    #[arg(long)]
    pub diagnostics: bool,
}

/// Cache subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum CacheCommands {
    /// Remove every cached extraction
    Clear {
        /// Cache directory (overrides config and `PAGESPLIT_CACHE_DIR`)
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },
}

/// Output format for `split`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One pretty-printed JSON object
    Json,
    /// Labelled sections for reading in a terminal
    Text,
}

impl Cli {
    /// True when stdout carries machine-readable output.
    pub const fn machine_output(&self) -> bool {
        matches!(
            &self.command,
            Commands::Split(SplitArgs {
                format: OutputFormat::Json,
                ..
            })
        )
    }
}
