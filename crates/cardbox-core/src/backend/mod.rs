//! Backend abstraction for the collection store.
//!
//! The backend owns all durable state: configuration, the answer log, the
//! undo/redo history, and the schema markers used to decide whether the next
//! sync must be a full one. This layer never looks inside it; everything goes
//! through the [`Backend`] trait so tests can swap in a mock store.
//!
//! Calls are blocking and synchronous. Dispatching them off a
//! latency-sensitive thread is the caller's job.

pub mod sqlite;

#[cfg(test)]
pub(crate) mod mock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::BackendError;

pub use sqlite::SqliteBackend;

/// Well-known configuration keys in the backend key-value store.
pub mod keys {
    /// Persisted scheduler generation (integer, 1 or 2).
    pub const SCHEDULER_VERSION: &str = "schedVer";
    /// Whether the V3 scheduler behavior is enabled (bool).
    pub const SCHED_V3: &str = "sched2021";
    /// UTC offset in minutes captured when the live scheduler first activated.
    pub const CREATION_OFFSET: &str = "creationOffset";
    /// Migrated timezone-handling preference (bool).
    pub const APPLY_TIMEZONE: &str = "applyTimezone";
    /// Timebox limit in seconds; 0 disables timeboxing.
    pub const TIMEBOX_SECS: &str = "timeLimit";
    /// Browser sort field preference.
    pub const SORT_FIELD: &str = "sortType";
    /// Whether browser sorting is reversed (bool).
    pub const SORT_BACKWARDS: &str = "sortBackwards";
}

/// Snapshot of pending undo/redo actions.
///
/// Fetched fresh on every query and never cached beyond one read. Label and
/// availability for the same direction always come from one snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UndoStatus {
    /// Human-readable label of the action that would be undone, if any.
    pub undo: Option<String>,
    /// Human-readable label of the action that would be redone, if any.
    pub redo: Option<String>,
}

/// Result of an undo or redo call.
///
/// An empty operation name means nothing was pending. That is a valid result,
/// not an error; callers branch on [`ChangeSet::is_empty`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Name of the operation that was undone/redone; empty if none.
    pub operation: String,
}

impl ChangeSet {
    pub fn named(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// A change-set carrying no operation.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.operation.is_empty()
    }
}

/// One open collection store.
///
/// Only [`crate::Session`] creates or destroys a backend; every other
/// component receives it by reference and must not outlive a close.
pub trait Backend: Sized {
    /// Open the store at `path`, creating it if absent.
    ///
    /// Returns the opened backend and whether the store was freshly created.
    fn open(path: &Path) -> Result<(Self, bool), BackendError>;

    /// Release the store. `downgrade` requests a compatibility downgrade so
    /// older clients can open the file again.
    fn close(self, downgrade: bool) -> Result<(), BackendError>;

    // ── Configuration key-value store ────────────────────────────────

    fn get_config(&self, key: &str) -> Result<Option<Value>, BackendError>;

    fn set_config(&mut self, key: &str, value: Value) -> Result<(), BackendError>;

    fn remove_config(&mut self, key: &str) -> Result<(), BackendError>;

    // ── Scheduler inputs ─────────────────────────────────────────────

    /// Total number of answers recorded in the store.
    fn cumulative_answer_count(&self) -> Result<u64, BackendError>;

    // ── Undo/redo ────────────────────────────────────────────────────

    fn undo_status(&self) -> Result<UndoStatus, BackendError>;

    /// Undo the most recent operation. Returns an empty change-set when
    /// nothing is pending.
    fn undo(&mut self) -> Result<ChangeSet, BackendError>;

    /// Redo the most recently undone operation. Returns an empty change-set
    /// when nothing is pending.
    fn redo(&mut self) -> Result<ChangeSet, BackendError>;

    // ── Schema markers ───────────────────────────────────────────────

    fn schema_modified_at(&self) -> Result<DateTime<Utc>, BackendError>;

    /// Stamp the schema-modified marker with the current time.
    fn mark_schema_modified(&mut self) -> Result<(), BackendError>;

    fn last_sync_at(&self) -> Result<DateTime<Utc>, BackendError>;

    /// Record a successful sync point.
    fn mark_synced(&mut self) -> Result<(), BackendError>;

    // ── Typed config helpers ─────────────────────────────────────────

    fn get_config_i64(&self, key: &str) -> Result<Option<i64>, BackendError> {
        Ok(self.get_config(key)?.and_then(|v| v.as_i64()))
    }

    fn set_config_i64(&mut self, key: &str, value: i64) -> Result<(), BackendError> {
        self.set_config(key, Value::from(value))
    }

    fn get_config_bool(&self, key: &str) -> Result<Option<bool>, BackendError> {
        Ok(self.get_config(key)?.and_then(|v| v.as_bool()))
    }

    fn set_config_bool(&mut self, key: &str, value: bool) -> Result<(), BackendError> {
        self.set_config(key, Value::from(value))
    }

    fn get_config_string(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self
            .get_config(key)?
            .and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    fn set_config_string(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        self.set_config(key, Value::from(value))
    }
}
