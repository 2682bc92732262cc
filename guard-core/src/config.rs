//! Runtime configuration.
//!
//! Every setting is read from the environment with a sensible default; only
//! the judgment service credential is mandatory, and only for commands that
//! actually contact the service.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{GuardError, Result, SERVICE_FAILURE_MESSAGE_EN, SERVICE_FAILURE_MESSAGE_MY};

/// Default Gemini REST endpoint.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default multimodal model used for similarity judgments.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_SAMPLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Language of the operator-facing explanations and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// `my`
    #[default]
    Burmese,
    /// `en`
    English,
}

impl Locale {
    /// Parse a `GUARD_LOCALE` value (`my` or `en`, case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "my" | "burmese" => Some(Self::Burmese),
            "en" | "english" => Some(Self::English),
            _ => None,
        }
    }

    /// Read `GUARD_LOCALE`, defaulting to Burmese when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var("GUARD_LOCALE") {
            Ok(value) if !value.trim().is_empty() => Self::parse(&value).ok_or_else(|| {
                GuardError::Config(format!("Unsupported GUARD_LOCALE: {value} (use my or en)"))
            }),
            _ => Ok(Self::default()),
        }
    }

    /// Language name as written into the prompt.
    pub fn language(&self) -> &'static str {
        match self {
            Self::Burmese => "Burmese",
            Self::English => "English",
        }
    }

    /// The single message shown for any judgment service failure.
    pub fn service_failure_message(&self) -> &'static str {
        match self {
            Self::Burmese => SERVICE_FAILURE_MESSAGE_MY,
            Self::English => SERVICE_FAILURE_MESSAGE_EN,
        }
    }
}

/// Connection settings for the Gemini judgment service.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API base URL (without the `/models/...` suffix)
    pub api_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
    /// Language the explanations are requested in
    pub locale: Locale,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("locale", &self.locale)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            locale: Locale::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `GEMINI_API_KEY` (or `API_KEY`)
    /// Optional: `GEMINI_API_URL`, `GUARD_MODEL`, `GUARD_REQUEST_TIMEOUT_SECS`,
    /// `GUARD_LOCALE`
    pub fn from_env() -> Result<Self> {
        let api_key = first_non_empty(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("API_KEY").ok(),
        )
        .ok_or_else(|| GuardError::Config("GEMINI_API_KEY environment variable not set".into()))?;

        let api_url = std::env::var("GEMINI_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = std::env::var("GUARD_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout = env_secs("GUARD_REQUEST_TIMEOUT_SECS").unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Ok(Self {
            api_url,
            api_key,
            model,
            timeout,
            locale: Locale::from_env()?,
        })
    }
}

/// Frame sampler settings.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// `ffmpeg` executable
    pub ffmpeg: PathBuf,
    /// `ffprobe` executable
    pub ffprobe: PathBuf,
    /// Upper bound for each probe or frame extraction
    pub timeout: Duration,
    /// JPEG quality for analysis frames (1-100)
    pub frame_quality: u8,
    /// JPEG quality for the preview thumbnail (1-100)
    pub thumbnail_quality: u8,
    /// Preview thumbnail width in pixels
    pub thumbnail_width: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            timeout: DEFAULT_SAMPLE_TIMEOUT,
            frame_quality: 60,
            thumbnail_quality: 50,
            thumbnail_width: 480,
        }
    }
}

impl SamplerConfig {
    /// Load sampler settings from `FFMPEG_PATH`, `FFPROBE_PATH` and
    /// `GUARD_SAMPLE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ffmpeg: std::env::var_os("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg),
            ffprobe: std::env::var_os("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe),
            timeout: env_secs("GUARD_SAMPLE_TIMEOUT_SECS").unwrap_or(defaults.timeout),
            ..defaults
        }
    }
}

/// Top-level configuration for a guard session.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Location of the persisted history record
    pub history_path: PathBuf,
    pub sampler: SamplerConfig,
}

impl GuardConfig {
    /// Load configuration from environment variables.
    ///
    /// The judgment service credential is loaded separately through
    /// [`GeminiConfig::from_env`] so history-only commands work without it.
    pub fn from_env() -> Result<Self> {
        let history_path = match std::env::var_os("GUARD_HISTORY_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_history_path()?,
        };

        Ok(Self {
            history_path,
            sampler: SamplerConfig::from_env(),
        })
    }
}

/// `<data_dir>/content-guard/history.json`
pub fn default_history_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("content-guard").join("history.json"))
        .ok_or_else(|| {
            GuardError::Config(
                "Cannot determine a data directory; set GUARD_HISTORY_PATH".into(),
            )
        })
}

/// The primary value unless it is missing or blank, then the fallback.
fn first_non_empty(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    [primary, fallback]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = GeminiConfig::new("super-secret-key");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-key"));
    }

    #[test]
    fn test_sampler_defaults() {
        let config = SamplerConfig::default();
        assert_eq!(config.frame_quality, 60);
        assert_eq!(config.thumbnail_quality, 50);
        assert_eq!(config.thumbnail_width, 480);
        assert!(config.thumbnail_quality < config.frame_quality);
    }

    #[test]
    fn test_gemini_defaults() {
        let config = GeminiConfig::new("k");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.locale, Locale::Burmese);
    }

    #[test]
    fn test_blank_primary_key_falls_back() {
        let key = |v: &str| Some(v.to_string());
        assert_eq!(first_non_empty(key(""), key("fallback")), key("fallback"));
        assert_eq!(first_non_empty(key("  "), key("fallback")), key("fallback"));
        assert_eq!(first_non_empty(None, key("fallback")), key("fallback"));
        assert_eq!(first_non_empty(key("primary"), key("fallback")), key("primary"));
        assert_eq!(first_non_empty(key(""), key(" ")), None);
        assert_eq!(first_non_empty(None, None), None);
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!(Locale::parse("my"), Some(Locale::Burmese));
        assert_eq!(Locale::parse(" EN "), Some(Locale::English));
        assert_eq!(Locale::parse("fr"), None);
        assert_ne!(
            Locale::Burmese.service_failure_message(),
            Locale::English.service_failure_message()
        );
    }
}
