//! The history-backed verdict workflow.
//!
//! One analysis run samples the video, judges the frames against a snapshot
//! of the history, and appends a new entry only when the verdict reports no
//! similarity to any past submission. At most one run may be in flight per
//! [`Analyzer`]; a second concurrent call is rejected with
//! [`GuardError::AnalysisInProgress`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GuardError, Result};
use crate::history::{resolve_match, HistoryBackend, HistoryEntry, HistoryStore};
use crate::judge::VerdictService;
use crate::sampler::{FrameSource, VideoInput};
use crate::verdict::Verdict;

/// Whether a run is the first submission or a comparison against history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// History is empty; the video becomes the first entry if accepted.
    Save,
    /// History has entries to compare against.
    Check,
}

impl AnalysisMode {
    pub fn for_history_len(len: usize) -> Self {
        if len == 0 {
            Self::Save
        } else {
            Self::Check
        }
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub mode: AnalysisMode,
    pub verdict: Verdict,
    /// Thumbnail of the submitted video (`data:` URI)
    pub current_thumbnail: String,
    /// Thumbnail of the matched entry, resolved against the history as sent
    pub matched_thumbnail: Option<String>,
    /// Whether a new history entry was appended
    pub recorded: bool,
    /// Number of entries the request was judged against
    pub compared_against: usize,
    /// History size after the run
    pub history_len: usize,
}

/// Runs analyses against an injected frame source, judge and history store.
pub struct Analyzer<S, J, B: HistoryBackend> {
    sampler: S,
    judge: J,
    history: Mutex<HistoryStore<B>>,
    in_flight: AtomicBool,
}

impl<S, J, B> Analyzer<S, J, B>
where
    S: FrameSource,
    J: VerdictService,
    B: HistoryBackend,
{
    pub fn new(sampler: S, judge: J, history: HistoryStore<B>) -> Self {
        Self {
            sampler,
            judge,
            history: Mutex::new(history),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Analyze one video.
    ///
    /// On any failure before the verdict is applied the history is left
    /// untouched and the same `video` may be submitted again.
    pub async fn analyze(&self, video: &VideoInput) -> Result<AnalysisOutcome> {
        let _slot = InFlight::acquire(&self.in_flight)?;

        let frames = self.sampler.sample(video).await?;

        let snapshot = self.lock_history()?.snapshot();
        let mode = AnalysisMode::for_history_len(snapshot.len());
        debug!(mode = ?mode, history = snapshot.len(), judge = self.judge.name(), "Requesting verdict");

        let verdict = self.judge.judge(&frames, &snapshot).await?;

        let matched_thumbnail = match verdict.matched_index() {
            Some(index) => match resolve_match(&snapshot, index) {
                Some(entry) => Some(entry.preview_thumbnail.clone()),
                None => {
                    warn!(
                        index,
                        history = snapshot.len(),
                        "Matched index does not name a stored entry"
                    );
                    None
                }
            },
            None => None,
        };

        let recorded = verdict.should_record();
        let history_len = {
            let mut history = self.lock_history()?;
            if recorded {
                history.append(HistoryEntry::new(
                    verdict.visual_signature.clone(),
                    frames.thumbnail.clone(),
                ))?;
            }
            history.len()
        };

        info!(
            status = %verdict.status,
            recorded,
            history = history_len,
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            mode,
            verdict,
            current_thumbnail: frames.thumbnail,
            matched_thumbnail,
            recorded,
            compared_against: snapshot.len(),
            history_len,
        })
    }

    /// Mode the next analysis would run in.
    pub fn next_mode(&self) -> Result<AnalysisMode> {
        Ok(AnalysisMode::for_history_len(self.lock_history()?.len()))
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run `f` with exclusive access to the history store.
    pub fn with_history<R>(&self, f: impl FnOnce(&mut HistoryStore<B>) -> R) -> Result<R> {
        let mut history = self.lock_history()?;
        Ok(f(&mut history))
    }

    pub fn judge(&self) -> &J {
        &self.judge
    }

    fn lock_history(&self) -> Result<MutexGuard<'_, HistoryStore<B>>> {
        self.history
            .lock()
            .map_err(|_| GuardError::Storage("History lock poisoned".into()))
    }
}

/// Single-slot in-flight marker, released on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GuardError::AnalysisInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_follows_history_len() {
        assert_eq!(AnalysisMode::for_history_len(0), AnalysisMode::Save);
        assert_eq!(AnalysisMode::for_history_len(3), AnalysisMode::Check);
    }

    #[test]
    fn test_in_flight_slot_is_exclusive_and_released() {
        let flag = AtomicBool::new(false);
        {
            let _first = InFlight::acquire(&flag).unwrap();
            assert!(matches!(
                InFlight::acquire(&flag),
                Err(GuardError::AnalysisInProgress)
            ));
        }
        assert!(InFlight::acquire(&flag).is_ok());
    }
}
