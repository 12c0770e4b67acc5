//! Cache clearing command implementation

use std::io::Write;

use anyhow::{Context, Result};
use colored::Colorize;
use pagesplit_core::{CacheBackend, FilesystemBackend};

/// Outcome produced by [`execute_clear`]. Useful for assertions in tests.
#[derive(Debug, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Nothing was stored.
    AlreadyEmpty,
    /// Entries were removed.
    Cleared {
        /// Number of extractions removed
        cleared: usize,
    },
}

/// Remove every entry from `backend`, reporting to `writer`.
///
/// # Errors
///
/// Returns an error if the cache cannot be enumerated or an entry cannot be
/// deleted.
pub fn execute_clear<B, W>(backend: &B, mut writer: W) -> Result<ClearOutcome>
where
    B: CacheBackend,
    W: Write,
{
    let cleared = backend.clear().context("clearing cache")?;
    if cleared == 0 {
        writeln!(writer, "{} Cache is already empty", "ℹ".blue())?;
        return Ok(ClearOutcome::AlreadyEmpty);
    }
    writeln!(
        writer,
        "{} Removed {cleared} cached extraction(s)",
        "✓".green()
    )?;
    Ok(ClearOutcome::Cleared { cleared })
}

/// Open the filesystem cache at `dir` for clearing.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or used.
pub fn open_cache(dir: &std::path::Path) -> Result<FilesystemBackend> {
    FilesystemBackend::new(dir).with_context(|| format!("opening cache at {}", dir.display()))
}
