//! Structured judgment returned for one analysis run.
//!
//! Field names mirror the JSON the judgment service is asked to produce,
//! so the types deserialize straight from the model output.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{GuardError, Result};

/// Policy status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictStatus {
    Safe,
    Warning,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl VerdictStatus {
    /// Every status string the service may return, in schema order.
    pub const ALL: [&'static str; 3] = ["Safe", "Warning", "High Risk"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Warning => "Warning",
            Self::HighRisk => "High Risk",
        }
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-aspect comparison between the new video and the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonDetails {
    pub composition: String,
    pub colors: String,
    pub subject_matter: String,
    pub motion_analysis: String,
}

/// Outcome of comparing the new video against stored signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryCheck {
    pub is_similar_to_past: bool,
    /// 1-based position into the history *as sent with the request*.
    #[serde(
        default,
        deserialize_with = "deserialize_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub matched_video_index: Option<u32>,
    pub details: String,
}

/// Structured judgment for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Confidence (0-100) of the most similar match
    pub similarity_score: f64,
    pub is_repetitive: bool,
    pub status: VerdictStatus,
    pub policy_violations: Vec<String>,
    pub recommendations: String,
    pub visual_signature: String,
    pub comparison_details: ComparisonDetails,
    pub history_check: HistoryCheck,
}

impl Verdict {
    /// Parse a verdict from the raw text the service returned.
    ///
    /// Tolerates a surrounding Markdown code fence.
    pub fn from_response_text(text: &str) -> Result<Self> {
        let body = strip_code_fence(text);
        if body.is_empty() {
            return Err(GuardError::MalformedVerdict("empty response".into()));
        }

        serde_json::from_str(body).map_err(|e| GuardError::MalformedVerdict(e.to_string()))
    }

    /// Whether this verdict should add a new history entry.
    pub fn should_record(&self) -> bool {
        !self.history_check.is_similar_to_past
    }

    /// The 1-based matched index, only when the service reports a match.
    pub fn matched_index(&self) -> Option<u32> {
        if self.history_check.is_similar_to_past {
            self.history_check.matched_video_index
        } else {
            None
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Accept the index as any JSON number; keep it only when it names a
/// positive whole position.
fn deserialize_index<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
            Some(value as u32)
        } else {
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCHED: &str = r#"{
        "similarityScore": 92.5,
        "isRepetitive": true,
        "status": "High Risk",
        "policyViolations": ["Repetitive Content"],
        "recommendations": "Do not upload. Matches ID_2 in lighting and subject.",
        "visualSignature": "Golden statue, dark temple background, slow push-in",
        "comparisonDetails": {
            "composition": "Centered subject",
            "colors": "Gold and deep brown",
            "subjectMatter": "Seated statue",
            "motionAnalysis": "Slow dolly-in"
        },
        "historyCheck": {
            "isSimilarToPast": true,
            "matchedVideoIndex": 2.0,
            "details": "Same statue and framing as ID_2"
        }
    }"#;

    #[test]
    fn test_parse_matched_verdict() {
        let verdict = Verdict::from_response_text(MATCHED).unwrap();
        assert_eq!(verdict.status, VerdictStatus::HighRisk);
        assert!(verdict.is_repetitive);
        assert_eq!(verdict.history_check.matched_video_index, Some(2));
        assert_eq!(verdict.matched_index(), Some(2));
        assert!(!verdict.should_record());
        assert_eq!(verdict.comparison_details.subject_matter, "Seated statue");
    }

    #[test]
    fn test_parse_fenced_verdict() {
        let fenced = format!("```json\n{MATCHED}\n```");
        let verdict = Verdict::from_response_text(&fenced).unwrap();
        assert_eq!(verdict.similarity_score, 92.5);
    }

    #[test]
    fn test_missing_index_is_allowed() {
        let text = MATCHED.replace("\"matchedVideoIndex\": 2.0,", "");
        let verdict = Verdict::from_response_text(&text).unwrap();
        assert_eq!(verdict.history_check.matched_video_index, None);
        assert_eq!(verdict.matched_index(), None);
    }

    #[test]
    fn test_unusable_index_becomes_none() {
        for bad in ["0", "-3", "1.5"] {
            let text = MATCHED.replace("2.0", bad);
            let verdict = Verdict::from_response_text(&text).unwrap();
            assert_eq!(verdict.history_check.matched_video_index, None, "index {bad}");
        }
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let text = MATCHED.replace("High Risk", "Catastrophic");
        let err = Verdict::from_response_text(&text).unwrap_err();
        assert!(matches!(err, GuardError::MalformedVerdict(_)));
    }

    #[test]
    fn test_empty_response_is_malformed() {
        assert!(matches!(
            Verdict::from_response_text("  "),
            Err(GuardError::MalformedVerdict(_))
        ));
        assert!(matches!(
            Verdict::from_response_text("{}"),
            Err(GuardError::MalformedVerdict(_))
        ));
    }

    #[test]
    fn test_status_serializes_with_space() {
        let json = serde_json::to_string(&VerdictStatus::HighRisk).unwrap();
        assert_eq!(json, "\"High Risk\"");
        assert_eq!(VerdictStatus::HighRisk.to_string(), "High Risk");
    }

    #[test]
    fn test_index_ignored_without_match() {
        let text = MATCHED.replace("\"isSimilarToPast\": true", "\"isSimilarToPast\": false");
        let verdict = Verdict::from_response_text(&text).unwrap();
        assert!(verdict.should_record());
        assert_eq!(verdict.matched_index(), None);
    }
}
