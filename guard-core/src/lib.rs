//! Guard Core - repetitive-content checks for short videos
//!
//! This crate samples representative frames from a video, asks an external
//! multimodal model whether they look like any previously accepted
//! submission, and keeps a capped history of accepted submissions to compare
//! against next time.
//!
//! # Components
//!
//! - [`sampler`]: four fixed-position stills plus a preview thumbnail
//! - [`judge`]: verdict requests against a history snapshot
//! - [`history`]: capped, newest-first log persisted as one JSON record
//! - [`analysis`]: the workflow tying them together, one run at a time
//!
//! # Example
//!
//! ```no_run
//! use guard_core::{
//!     Analyzer, FfmpegSampler, GeminiJudge, GuardConfig, HistoryStore, JsonFileBackend,
//!     VideoInput,
//! };
//!
//! # async fn example() -> guard_core::Result<()> {
//! let config = GuardConfig::from_env()?;
//! let history = HistoryStore::load(JsonFileBackend::new(&config.history_path))?;
//! let analyzer = Analyzer::new(
//!     FfmpegSampler::new(config.sampler.clone()),
//!     GeminiJudge::from_env()?,
//!     history,
//! );
//!
//! let video = VideoInput::open("clip.mp4")?;
//! let outcome = analyzer.analyze(&video).await?;
//! println!("{}: {}", outcome.verdict.status, outcome.verdict.recommendations);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod history;
pub mod judge;
pub mod sampler;
pub mod verdict;

// Re-export main types for convenience
pub use analysis::{AnalysisMode, AnalysisOutcome, Analyzer};
pub use config::{GeminiConfig, GuardConfig, Locale, SamplerConfig};
pub use error::{
    GuardError, Result, MAX_HISTORY_ENTRIES, SERVICE_FAILURE_MESSAGE_EN, SERVICE_FAILURE_MESSAGE_MY,
};
pub use history::{
    resolve_match, HistoryBackend, HistoryEntry, HistoryStore, JsonFileBackend, MemoryBackend,
};
pub use judge::{GeminiJudge, MockJudge, VerdictService};
pub use sampler::{FfmpegSampler, FrameSet, FrameSource, StaticFrameSource, VideoInput};
pub use verdict::{ComparisonDetails, HistoryCheck, Verdict, VerdictStatus};
