//! Exit codes following sysexits.h conventions.
//!
//! These codes give scripts a way to tell a repetitive verdict apart from
//! an operational failure.

use guard_core::{GuardError, Locale};

/// Successful execution (verdict Safe or Warning, or a history command).
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments, unknown history ID).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// The submitted video was judged High Risk (repetitive content).
/// Maps to EX_DATAERR from sysexits.h.
pub const REPETITIVE_CONTENT: i32 = 65;

/// Cannot open or decode the input video.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Judgment service unavailable or returned an unusable answer.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: i32 = 69;

/// I/O error (cannot read or write the history record or thumbnails).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Missing or invalid configuration (API key, data directory).
/// Maps to EX_CONFIG from sysexits.h.
pub const CONFIG_ERROR: i32 = 78;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    /// Classify an error; service failures are rendered in `locale`.
    pub fn from_anyhow(err: &anyhow::Error, locale: Locale) -> Self {
        if let Some(guard) = err.chain().find_map(|e| e.downcast_ref::<GuardError>()) {
            return Self::from_guard_error(guard, err, locale);
        }

        let message = format!("{err:#}");
        let code = if message.contains("Failed to read") {
            INPUT_ERROR
        } else if message.contains("Failed to write") {
            IO_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }

    fn from_guard_error(guard: &GuardError, err: &anyhow::Error, locale: Locale) -> Self {
        // Service failures are reported with the single generic message.
        if guard.is_service_failure() {
            return Self {
                code: NETWORK_ERROR,
                message: Some(guard.user_message(locale)),
            };
        }

        let code = match guard {
            GuardError::Video(_) | GuardError::Sampling(_) | GuardError::Encoding(_) => {
                INPUT_ERROR
            }
            GuardError::Config(_) => CONFIG_ERROR,
            GuardError::HistoryPosition { .. } => USAGE_ERROR,
            GuardError::Storage(_) | GuardError::Serialization(_) => IO_ERROR,
            _ => GENERAL_ERROR,
        };

        Self {
            code,
            message: Some(format!("{err:#}")),
        }
    }
}
