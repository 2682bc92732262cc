//! Capped, insertion-ordered log of previously accepted submissions.
//!
//! The store keeps the newest entry first and never holds more than
//! [`MAX_HISTORY_ENTRIES`]. Every mutation serializes the whole collection
//! and hands it to the backend before the in-memory state changes, so the
//! two copies never diverge.
//!
//! ```
//! use guard_core::history::{HistoryEntry, HistoryStore, MemoryBackend};
//!
//! # fn example() -> guard_core::Result<()> {
//! let mut store = HistoryStore::load(MemoryBackend::new())?;
//! store.append(HistoryEntry::new("Golden statue at dusk", "data:image/jpeg;base64,AAAA"))?;
//! assert_eq!(store.len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod backend;

pub use backend::{HistoryBackend, JsonFileBackend, MemoryBackend};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GuardError, Result, MAX_HISTORY_ENTRIES};

/// One persisted record of a previously accepted video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
    pub visual_signature: String,
    /// `data:image/jpeg;base64,...`
    pub preview_thumbnail: String,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn new(visual_signature: impl Into<String>, preview_thumbnail: impl Into<String>) -> Self {
        Self::with_timestamp(
            chrono::Utc::now().timestamp_millis(),
            visual_signature,
            preview_thumbnail,
        )
    }

    pub fn with_timestamp(
        timestamp: i64,
        visual_signature: impl Into<String>,
        preview_thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            visual_signature: visual_signature.into(),
            preview_thumbnail: preview_thumbnail.into(),
        }
    }
}

/// The submission history, bound to its durable backend.
pub struct HistoryStore<B: HistoryBackend> {
    entries: Vec<HistoryEntry>,
    backend: B,
}

impl<B: HistoryBackend> HistoryStore<B> {
    /// Hydrate the store from its backend.
    ///
    /// A corrupt record is logged and ignored, leaving the store empty; the
    /// record itself is not repaired until the next mutation overwrites it.
    /// Only a failure to *read* the backend is an error.
    pub fn load(backend: B) -> Result<Self> {
        let entries = match backend.read()? {
            None => Vec::new(),
            Some(record) => match serde_json::from_slice::<Vec<HistoryEntry>>(&record) {
                Ok(mut entries) => {
                    entries.truncate(MAX_HISTORY_ENTRIES);
                    entries
                }
                Err(e) => {
                    warn!(
                        location = %backend.location(),
                        error = %e,
                        "History record is corrupt, starting with an empty history"
                    );
                    Vec::new()
                }
            },
        };

        info!(location = %backend.location(), entries = entries.len(), "History loaded");
        Ok(Self { entries, backend })
    }

    /// Insert at the front, keeping only the newest [`MAX_HISTORY_ENTRIES`].
    pub fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        let mut updated = Vec::with_capacity((self.entries.len() + 1).min(MAX_HISTORY_ENTRIES));
        updated.push(entry);
        updated.extend(self.entries.iter().cloned());
        updated.truncate(MAX_HISTORY_ENTRIES);

        self.commit(updated)?;
        debug!(entries = self.entries.len(), "History entry appended");
        Ok(())
    }

    /// Delete the entry at a 0-based position and return it.
    pub fn remove_at(&mut self, position: usize) -> Result<HistoryEntry> {
        if position >= self.entries.len() {
            return Err(GuardError::HistoryPosition {
                position,
                len: self.entries.len(),
            });
        }

        let mut updated = self.entries.clone();
        let removed = updated.remove(position);

        self.commit(updated)?;
        debug!(position, entries = self.entries.len(), "History entry removed");
        Ok(removed)
    }

    /// Empty the store and remove the persisted record.
    ///
    /// Callers are expected to have confirmed this with the operator.
    pub fn clear_all(&mut self) -> Result<()> {
        self.backend.remove()?;
        let cleared = self.entries.len();
        self.entries.clear();
        info!(cleared, "History cleared");
        Ok(())
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the current entries, used as request-time context.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.clone()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn commit(&mut self, updated: Vec<HistoryEntry>) -> Result<()> {
        let record = serde_json::to_string(&updated)
            .map_err(|e| GuardError::Serialization(format!("Failed to encode history: {e}")))?;
        self.backend.write(&record)?;
        self.entries = updated;
        Ok(())
    }
}

/// Look up a 1-based matched index in the history *as it was sent*.
///
/// The index is a hint from the judgment service; anything that does not
/// name an existing position yields `None`.
pub fn resolve_match(snapshot: &[HistoryEntry], index: u32) -> Option<&HistoryEntry> {
    let position = (index as usize).checked_sub(1)?;
    snapshot.get(position)
}
