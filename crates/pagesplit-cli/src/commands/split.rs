//! The `split` command: extract a page and print it.

use std::io::Write;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use pagesplit_core::{
    CacheStatus, Config, Diagnostic, ExtractReport, MemoryBackend, PageExtraction, PageExtractor,
};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::cli::{OutputFormat, SplitArgs};

/// JSON shape printed by `split`.
#[derive(Serialize)]
struct SplitOutput<'a> {
    #[serde(flatten)]
    extraction: &'a PageExtraction,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<CacheStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a [Diagnostic]>,
}

/// Accept `host/path` as well as full URLs; only http(s) pages can be split.
///
/// # Errors
///
/// Returns an error if the input does not parse as an http or https URL.
pub fn normalize_url(input: &str) -> Result<String> {
    let input = input.trim();
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{input}")
    };
    let url = Url::parse(&candidate).with_context(|| format!("invalid URL '{input}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported URL scheme '{}' (expected http or https)", url.scheme());
    }
    if url.host_str().is_none_or(str::is_empty) {
        bail!("URL '{input}' has no host");
    }
    Ok(url.to_string())
}

/// Run `split` with `config`, writing the extraction to `writer`.
///
/// # Errors
///
/// Returns an error for an invalid URL, an unusable cache directory, a page
/// that could not be fetched, or a failed write.
pub async fn execute_split<W: Write>(
    args: &SplitArgs,
    mut config: Config,
    mut writer: W,
) -> Result<CacheStatus> {
    let url = normalize_url(&args.url)?;
    if let Some(dir) = &args.cache_dir {
        config.cache.dir.clone_from(dir);
    }
    if let Some(ttl) = args.ttl {
        config.cache.ttl_secs = ttl;
    }

    let report = if args.no_cache {
        debug!("using in-memory cache");
        PageExtractor::with_backend(&config, MemoryBackend::new())?
            .extract_report(&url, &args.prefix, true)
            .await
    } else {
        PageExtractor::from_config(&config)
            .with_context(|| format!("opening cache at {}", config.cache.dir.display()))?
            .extract_report(&url, &args.prefix, args.refresh)
            .await
    };

    if report.cache == CacheStatus::NotStored {
        for diagnostic in &report.diagnostics {
            debug!(%diagnostic, "split diagnostic");
        }
        bail!("could not fetch {url}");
    }

    match args.format {
        OutputFormat::Json => write_json(&report, args.diagnostics, &mut writer)?,
        OutputFormat::Text => write_text(&report, args.diagnostics, &mut writer)?,
    }
    Ok(report.cache)
}

fn write_json<W: Write>(report: &ExtractReport, diagnostics: bool, writer: &mut W) -> Result<()> {
    let output = SplitOutput {
        extraction: &report.extraction,
        cache: diagnostics.then_some(report.cache),
        diagnostics: diagnostics.then_some(report.diagnostics.as_slice()),
    };
    serde_json::to_writer_pretty(&mut *writer, &output)?;
    writeln!(writer)?;
    Ok(())
}

fn write_text<W: Write>(report: &ExtractReport, diagnostics: bool, writer: &mut W) -> Result<()> {
    let page = &report.extraction;
    writeln!(writer, "{}", "── html ──".bold())?;
    writeln!(writer, "{}", page.html)?;
    writeln!(writer, "{}", "── css ──".bold())?;
    writeln!(writer, "{}", page.css)?;
    writeln!(
        writer,
        "{}",
        format!("── scripts ({}) ──", page.scripts.len()).bold()
    )?;
    for script in &page.scripts {
        writeln!(writer, "{script}")?;
    }

    if diagnostics {
        writeln!(writer, "{}", "── diagnostics ──".bold())?;
        let cache = match report.cache {
            CacheStatus::Hit => "served from cache",
            CacheStatus::Stored => "split and cached",
            CacheStatus::NotStored => "split, not cached",
        };
        writeln!(writer, "{} {cache}", "ℹ".blue())?;
        for diagnostic in &report.diagnostics {
            writeln!(writer, "{} {diagnostic}", "⚠".yellow())?;
        }
    }
    Ok(())
}
