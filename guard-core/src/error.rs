use thiserror::Error;

use crate::config::Locale;

/// Maximum number of entries the submission history may hold.
pub const MAX_HISTORY_ENTRIES: usize = 200;

/// Message shown to the operator whenever the judgment service could not
/// produce a usable verdict. Network, authentication and schema failures
/// all collapse into this one string.
pub const SERVICE_FAILURE_MESSAGE_MY: &str =
    "စစ်ဆေးမှု ပြုလုပ်ရာတွင် အခက်အခဲရှိနေပါသည်။ အင်တာနက်ကို ပြန်စစ်ကြည့်ပါ။";

/// English rendering of [`SERVICE_FAILURE_MESSAGE_MY`].
pub const SERVICE_FAILURE_MESSAGE_EN: &str =
    "The check could not be completed. Please check your internet connection and try again.";

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Video input error: {0}")]
    Video(String),

    #[error("Frame sampling failed: {0}")]
    Sampling(String),

    #[error("Image encoding error: {0}")]
    Encoding(String),

    #[error("Judgment service error: {0}")]
    Judgment(String),

    #[error("Malformed verdict: {0}")]
    MalformedVerdict(String),

    #[error("History position {position} out of range (history holds {len} entries)")]
    HistoryPosition { position: usize, len: usize },

    #[error("History storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GuardError {
    /// True for every failure originating from the external judgment service.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            Self::Judgment(_) | Self::MalformedVerdict(_) | Self::Http(_)
        )
    }

    /// The operator-facing rendering of this error.
    pub fn user_message(&self, locale: Locale) -> String {
        if self.is_service_failure() {
            locale.service_failure_message().to_string()
        } else {
            self.to_string()
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_failures_share_one_message() {
        let judgment = GuardError::Judgment("status 401".into());
        let malformed = GuardError::MalformedVerdict("missing field `status`".into());

        assert!(judgment.is_service_failure());
        assert!(malformed.is_service_failure());
        assert_eq!(
            judgment.user_message(Locale::Burmese),
            malformed.user_message(Locale::Burmese)
        );
        assert_eq!(judgment.user_message(Locale::Burmese), SERVICE_FAILURE_MESSAGE_MY);
        assert_eq!(judgment.user_message(Locale::English), SERVICE_FAILURE_MESSAGE_EN);
    }

    #[test]
    fn test_local_failures_keep_their_detail() {
        let err = GuardError::HistoryPosition { position: 7, len: 3 };
        assert!(!err.is_service_failure());
        assert!(err.user_message(Locale::Burmese).contains("position 7"));
    }
}
