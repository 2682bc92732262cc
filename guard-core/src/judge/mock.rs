//! Scripted judge for testing.
//! WARNING: returns canned verdicts, never looks at the frames.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::prompt::history_context;
use super::VerdictService;
use crate::error::{GuardError, Result};
use crate::history::HistoryEntry;
use crate::sampler::FrameSet;
use crate::verdict::{ComparisonDetails, HistoryCheck, Verdict, VerdictStatus};

enum Scripted {
    Verdict(Verdict),
    Failure(String),
}

/// What the judge was asked, recorded per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeCall {
    pub history_len: usize,
    pub context: String,
    pub thumbnail: String,
}

/// Judge that replays queued responses in order.
#[derive(Default)]
pub struct MockJudge {
    responses: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<JudgeCall>>,
    delay: Option<Duration>,
}

impl MockJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a verdict.
    pub fn then_verdict(self, verdict: Verdict) -> Self {
        self.push(Scripted::Verdict(verdict));
        self
    }

    /// Queue a service failure.
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.push(Scripted::Failure(reason.into()));
        self
    }

    /// Sleep before answering, to keep a call in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<JudgeCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn push(&self, response: Scripted) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }
}

#[async_trait]
impl VerdictService for MockJudge {
    async fn judge(&self, frames: &FrameSet, history: &[HistoryEntry]) -> Result<Verdict> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(JudgeCall {
                history_len: history.len(),
                context: history_context(history),
                thumbnail: frames.thumbnail.clone(),
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .responses
            .lock()
            .map_err(|_| GuardError::Judgment("mock judge poisoned".into()))?
            .pop_front();

        match next {
            Some(Scripted::Verdict(verdict)) => Ok(verdict),
            Some(Scripted::Failure(reason)) => Err(GuardError::Judgment(reason)),
            None => Err(GuardError::Judgment("no scripted response left".into())),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// A "Safe" verdict reporting no similarity to the history.
pub fn distinct_verdict(signature: impl Into<String>) -> Verdict {
    Verdict {
        similarity_score: 12.0,
        is_repetitive: false,
        status: VerdictStatus::Safe,
        policy_violations: Vec::new(),
        recommendations: "Suitable to upload: distinct background and subject placement.".into(),
        visual_signature: signature.into(),
        comparison_details: comparison(),
        history_check: HistoryCheck {
            is_similar_to_past: false,
            matched_video_index: None,
            details: "No stored video shares this composition.".into(),
        },
    }
}

/// A "High Risk" verdict matching the 1-based history `index`.
pub fn matching_verdict(signature: impl Into<String>, index: u32) -> Verdict {
    Verdict {
        similarity_score: 94.0,
        is_repetitive: true,
        status: VerdictStatus::HighRisk,
        policy_violations: vec!["Repetitive Content".into()],
        recommendations: format!("Do not upload: matches ID_{index} in lighting and subject."),
        visual_signature: signature.into(),
        comparison_details: comparison(),
        history_check: HistoryCheck {
            is_similar_to_past: true,
            matched_video_index: Some(index),
            details: format!("Same framing and palette as ID_{index}."),
        },
    }
}

fn comparison() -> ComparisonDetails {
    ComparisonDetails {
        composition: "Centered seated figure".into(),
        colors: "Warm gold on dark brown".into(),
        subject_matter: "Buddha statue".into(),
        motion_analysis: "Slow push-in".into(),
    }
}
