//! Common utility functions shared across CLI commands.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use guard_core::sampler::from_data_uri;
use guard_core::{config, HistoryStore, JsonFileBackend};
use tracing::debug;

/// Resolve the history record location: `--store`, then `GUARD_HISTORY_PATH`,
/// then the platform data directory.
pub fn resolve_store_path(store: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = store {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os("GUARD_HISTORY_PATH") {
        return Ok(PathBuf::from(path));
    }
    Ok(config::default_history_path()?)
}

/// Open the history store at the resolved location.
pub fn open_history(store: Option<PathBuf>) -> Result<HistoryStore<JsonFileBackend>> {
    let path = resolve_store_path(store)?;
    debug!(path = %path.display(), "Opening history");
    Ok(HistoryStore::load(JsonFileBackend::new(path))?)
}

/// Format a Unix timestamp (milliseconds) as a human-readable UTC string.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => format!("{timestamp_ms}ms"),
    }
}

/// Shorten a signature to one display line.
pub fn summarize(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// Ask a yes/no question; only an explicit `y`/`yes` counts as consent.
pub fn confirm(prompt: &str, input: &mut impl BufRead) -> Result<bool> {
    eprint!("{prompt} [y/N] ");
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Decode a thumbnail data URI and write it as a JPEG file.
pub fn write_thumbnail(data_uri: &str, path: &Path) -> Result<()> {
    let jpeg = from_data_uri(data_uri).context("Stored thumbnail is not a JPEG data URI")?;
    std::fs::write(path, jpeg)
        .with_context(|| format!("Failed to write thumbnail: {}", path.display()))
}
