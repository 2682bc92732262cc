//! Content Guard CLI - repetitive-content checks for short videos.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use guard_core::Locale;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "Exit codes:
  0   Safe or Warning verdict / command succeeded
  64  Usage error (e.g. unknown history ID)
  65  Repetitive content (High Risk verdict)
  66  Video missing or unreadable
  69  Judgment service unavailable
  74  History storage I/O error
  78  Configuration error (e.g. GEMINI_API_KEY not set)

Service failures are reported in GUARD_LOCALE (my, the default, or en).";

#[derive(Parser)]
#[command(name = "content-guard")]
#[command(author, version, about = "Repetitive content checks for short videos", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// History record location (defaults to GUARD_HISTORY_PATH or the data directory)
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Suppress user-facing output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a video against the stored history (saves it when distinct)
    #[command(visible_alias = "save")]
    Check {
        /// Path to the video file
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        /// Output format for the verdict
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write current.jpg (and matched.jpg on a match) into this directory
        #[arg(long, value_name = "DIR")]
        thumbnails: Option<PathBuf>,
    },

    /// Browse and manage the stored history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List stored videos, newest first
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Delete one stored video by its ID
    Delete {
        /// ID as shown by `history list`
        #[arg(value_name = "ID", value_parser = clap::value_parser!(u64).range(1..))]
        id: u64,
    },

    /// Delete every stored video
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "guard_core=info,content_guard=info,warn",
        _ => "guard_core=debug,content_guard=debug,info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check {
            video,
            format,
            thumbnails,
        } => commands::check::execute(video, cli.store, format, thumbnails, cli.quiet).await,
        Commands::History { action } => match action {
            HistoryAction::List { format } => commands::history::list(cli.store, format),
            HistoryAction::Delete { id } => commands::history::delete(cli.store, id, cli.quiet),
            HistoryAction::Clear { yes } => {
                let stdin = std::io::stdin();
                commands::history::clear(cli.store, yes, cli.quiet, &mut stdin.lock())
            }
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            let exit = ExitCode::from_anyhow(&err, Locale::from_env().unwrap_or_default());
            if let Some(message) = exit.message {
                eprintln!("{} {}", "Error:".red().bold(), message);
            }
            exit.code
        }
    };

    std::process::exit(code);
}
