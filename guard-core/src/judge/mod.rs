//! External similarity judgment.
//!
//! The judge receives the four sampled frames together with the history as
//! it exists at request time, and returns a parsed [`Verdict`]. Any
//! `matchedVideoIndex` in that verdict refers to the history slice passed
//! to [`VerdictService::judge`], not to the live store.
//!
//! ## Providers
//!
//! - [`GeminiJudge`] - Google Gemini `generateContent` (production)
//! - [`MockJudge`] - scripted verdicts (testing only)

mod gemini;
mod mock;
pub mod prompt;

pub use gemini::GeminiJudge;
pub use mock::{distinct_verdict, matching_verdict, JudgeCall, MockJudge};

use async_trait::async_trait;

use crate::error::Result;
use crate::history::HistoryEntry;
use crate::sampler::FrameSet;
use crate::verdict::Verdict;

/// Trait for similarity judgment services.
///
/// Implementations must not retry on failure; a failed call surfaces as an
/// error and the analysis is aborted.
#[async_trait]
pub trait VerdictService: Send + Sync {
    async fn judge(&self, frames: &FrameSet, history: &[HistoryEntry]) -> Result<Verdict>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}
