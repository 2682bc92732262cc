//! History command implementations.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use crate::exit_codes::SUCCESS;
use crate::utils::{confirm, format_timestamp, open_history, summarize};
use crate::OutputFormat;

const SIGNATURE_WIDTH: usize = 72;

/// List stored entries under the `ID n` labels the judge sees.
pub fn list(store: Option<PathBuf>, format: OutputFormat) -> Result<i32> {
    let history = open_history(store)?;

    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(history.entries())
            .context("Failed to serialize history to JSON")?;
        println!("{json}");
        return Ok(SUCCESS);
    }

    if history.is_empty() {
        println!("{}", "History is empty".dimmed());
        return Ok(SUCCESS);
    }

    println!(
        "{}",
        format!("{} stored videos (newest first)", history.len()).bold()
    );
    println!();
    for (position, entry) in history.entries().iter().enumerate() {
        println!(
            "   {:<8} {}  {}",
            format!("ID {}", position + 1).bold(),
            format_timestamp(entry.timestamp).dimmed(),
            summarize(&entry.visual_signature, SIGNATURE_WIDTH)
        );
    }

    Ok(SUCCESS)
}

/// Delete the entry shown as `ID <id>` by `history list`.
///
/// `id` is 1-based; clap rejects zero before we get here.
pub fn delete(store: Option<PathBuf>, id: u64, quiet: bool) -> Result<i32> {
    let mut history = open_history(store)?;
    let removed = history
        .remove_at(id.saturating_sub(1) as usize)
        .with_context(|| format!("No history entry with ID {id}"))?;
    info!(id, remaining = history.len(), "Deleted history entry");

    if !quiet {
        println!(
            "{} ID {} ({})",
            "Deleted".green().bold(),
            id,
            summarize(&removed.visual_signature, SIGNATURE_WIDTH)
        );
        println!("   {} {}", "Remaining:".dimmed(), history.len());
    }

    Ok(SUCCESS)
}

/// Remove every stored entry after explicit confirmation.
pub fn clear(
    store: Option<PathBuf>,
    assume_yes: bool,
    quiet: bool,
    input: &mut impl BufRead,
) -> Result<i32> {
    let mut history = open_history(store)?;
    let count = history.len();

    if !assume_yes {
        let prompt = format!("Delete all {count} stored videos from history?");
        if !confirm(&prompt, input)? {
            if !quiet {
                println!("{}", "Nothing deleted".dimmed());
            }
            return Ok(SUCCESS);
        }
    }

    history.clear_all()?;
    info!(cleared = count, "History cleared");

    if !quiet {
        println!("{} {} stored videos", "Cleared".green().bold(), count);
    }

    Ok(SUCCESS)
}
