//! Durable storage for the serialized history record.
//!
//! A backend stores exactly one opaque record (the JSON-encoded entry list).
//! Parsing and validation live in [`HistoryStore`](super::HistoryStore), so a
//! backend only moves bytes. Bytes that are not valid UTF-8 are still handed
//! back; the store treats them as a corrupt record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GuardError, Result};

/// A single named record in durable storage.
pub trait HistoryBackend: Send {
    /// Read the raw record, or `None` when it has never been written or was removed.
    fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the whole record.
    fn write(&mut self, record: &str) -> Result<()>;

    /// Remove the record entirely.
    fn remove(&mut self) -> Result<()>;

    /// Human-readable location, used in logs.
    fn location(&self) -> String;
}

/// Stores the record as a JSON file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HistoryBackend for JsonFileBackend {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GuardError::Storage(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write(&mut self, record: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                GuardError::Storage(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let temp = self.temp_path();
        std::fs::write(&temp, record).map_err(|e| {
            GuardError::Storage(format!("Failed to write {}: {e}", temp.display()))
        })?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            GuardError::Storage(format!("Failed to replace {}: {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), bytes = record.len(), "History record written");
        Ok(())
    }

    fn remove(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GuardError::Storage(format!(
                "Failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend for tests.
/// WARNING: nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    record: Option<Vec<u8>>,
    fail_writes: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing raw record (which may be corrupt).
    pub fn with_record(record: impl Into<Vec<u8>>) -> Self {
        Self {
            record: Some(record.into()),
            fail_writes: false,
        }
    }

    /// Make every subsequent write and remove fail.
    pub fn fail_writes(mut self, fail: bool) -> Self {
        self.fail_writes = fail;
        self
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// The currently persisted record.
    pub fn record(&self) -> Option<&[u8]> {
        self.record.as_deref()
    }
}

impl HistoryBackend for MemoryBackend {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.record.clone())
    }

    fn write(&mut self, record: &str) -> Result<()> {
        if self.fail_writes {
            return Err(GuardError::Storage("simulated write failure".into()));
        }
        self.record = Some(record.as_bytes().to_vec());
        Ok(())
    }

    fn remove(&mut self) -> Result<()> {
        if self.fail_writes {
            return Err(GuardError::Storage("simulated remove failure".into()));
        }
        self.record = None;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
