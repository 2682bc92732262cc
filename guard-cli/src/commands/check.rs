//! Check command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use guard_core::{
    AnalysisMode, AnalysisOutcome, Analyzer, FfmpegSampler, GeminiJudge, SamplerConfig,
    VerdictStatus, VideoInput,
};
use tracing::{debug, error, info};

use crate::exit_codes::{REPETITIVE_CONTENT, SUCCESS};
use crate::utils::{open_history, write_thumbnail};
use crate::OutputFormat;

/// Execute the check command.
pub async fn execute(
    video: PathBuf,
    store: Option<PathBuf>,
    format: OutputFormat,
    thumbnails: Option<PathBuf>,
    quiet: bool,
) -> Result<i32> {
    // Validate the upload before anything touches the network.
    let video = VideoInput::open(&video)?;
    info!(path = %video.path().display(), bytes = video.bytes(), "Read video");

    let judge = GeminiJudge::from_env()?;
    let history = open_history(store)?;
    let analyzer = Analyzer::new(FfmpegSampler::new(SamplerConfig::from_env()), judge, history);

    if !quiet && format == OutputFormat::Text {
        let compared = analyzer.with_history(|h| h.len())?;
        match analyzer.next_mode()? {
            AnalysisMode::Save => eprintln!("{}", "Saving first video to history...".dimmed()),
            AnalysisMode::Check => eprintln!(
                "{}",
                format!("Checking against {compared} stored videos...").dimmed()
            ),
        }
    }

    // The operator sees the generic message; the detail goes to the log.
    let outcome = analyzer
        .analyze(&video)
        .await
        .inspect_err(|e| error!(error = %e, "Analysis failed"))?;

    if let Some(dir) = thumbnails {
        export_thumbnails(&outcome, &dir)?;
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome)
                .context("Failed to serialize verdict to JSON")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            if !quiet {
                print_outcome(&outcome);
            }
        }
    }

    Ok(match outcome.verdict.status {
        VerdictStatus::HighRisk => REPETITIVE_CONTENT,
        VerdictStatus::Safe | VerdictStatus::Warning => SUCCESS,
    })
}

fn export_thumbnails(outcome: &AnalysisOutcome, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to write thumbnails to {}", dir.display()))?;

    write_thumbnail(&outcome.current_thumbnail, &dir.join("current.jpg"))?;
    if let Some(matched) = &outcome.matched_thumbnail {
        write_thumbnail(matched, &dir.join("matched.jpg"))?;
    }

    debug!(dir = %dir.display(), "Thumbnails exported");
    Ok(())
}

fn print_outcome(outcome: &AnalysisOutcome) {
    let verdict = &outcome.verdict;

    let badge = match verdict.status {
        VerdictStatus::Safe => "SAFE - suitable to upload".green().bold(),
        VerdictStatus::Warning => "WARNING - review before uploading".yellow().bold(),
        VerdictStatus::HighRisk => "REPETITIVE - do not upload".red().bold(),
    };

    println!();
    println!("{badge}");
    println!();
    println!("   {}", verdict.recommendations);
    if !verdict.policy_violations.is_empty() {
        println!(
            "   {} {}",
            "Violations:".dimmed(),
            verdict.policy_violations.join(", ")
        );
    }
    println!();
    println!(
        "   {} {:.0}",
        "Similarity score:".dimmed(),
        verdict.similarity_score
    );
    println!(
        "   {} {}",
        "Repetitive:".dimmed(),
        if verdict.is_repetitive { "yes" } else { "no" }
    );
    println!();

    let details = &verdict.comparison_details;
    println!("   {}", "Comparison".bold());
    println!("   {} {}", "Composition:".dimmed(), details.composition);
    println!("   {} {}", "Colors:".dimmed(), details.colors);
    println!("   {} {}", "Subject matter:".dimmed(), details.subject_matter);
    println!("   {} {}", "Motion:".dimmed(), details.motion_analysis);
    println!();

    println!("   {}", "History check".bold());
    if let Some(index) = verdict.matched_index() {
        let shown = if outcome.matched_thumbnail.is_some() {
            format!("ID {index}")
        } else {
            format!("ID {index} (not in history)")
        };
        println!("   {} {}", "Matched:".dimmed(), shown);
    }
    println!("   {}", verdict.history_check.details);
    println!();

    if outcome.recorded {
        println!(
            "   {} {} stored videos",
            "Saved to history:".dimmed(),
            outcome.history_len
        );
    } else {
        println!("   {}", "Not saved to history".dimmed());
    }
    println!("   {}", format!("Signature: {}", verdict.visual_signature).dimmed());
}
