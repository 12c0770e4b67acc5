//! Configuration loading and the `config` command.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use pagesplit_core::Config;

/// Effective configuration: an explicit file when given, autodiscovery
/// otherwise, environment overrides on top.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or an override is
/// malformed.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            let mut config = Config::load_from(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            config.apply_overrides(|name| std::env::var(name).ok())?;
            Ok(config)
        },
        None => Config::load().context("loading configuration"),
    }
}

/// Print `config` as TOML.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized or written.
pub fn show_config<W: Write>(config: &Config, mut writer: W) -> Result<()> {
    write!(writer, "{}", config.to_toml()?)?;
    Ok(())
}
