//! In-memory mock backend for unit tests.
//!
//! Counts every write so tests can assert that no-op paths really leave the
//! persisted state untouched.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::{Backend, ChangeSet, UndoStatus};
use crate::error::BackendError;

#[derive(Debug, Default)]
pub(crate) struct MemoryBackend {
    config: HashMap<String, Value>,
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
    answer_count: u64,
    schema_modified_ms: i64,
    last_sync_ms: i64,
    /// Number of config writes performed, including removals.
    pub(crate) config_writes: usize,
}

impl MemoryBackend {
    /// Push an operation onto the undo history.
    pub(crate) fn push_op(&mut self, name: &str) {
        self.undo_stack.push(name.to_string());
        self.redo_stack.clear();
    }

    /// Simulate answering cards.
    pub(crate) fn answer_many(&mut self, count: u64) {
        self.answer_count += count;
    }
}

impl Backend for MemoryBackend {
    fn open(_path: &Path) -> Result<(Self, bool), BackendError> {
        let mut backend = Self::default();
        backend.schema_modified_ms = Utc::now().timestamp_millis();
        Ok((backend, true))
    }

    fn close(self, _downgrade: bool) -> Result<(), BackendError> {
        Ok(())
    }

    fn get_config(&self, key: &str) -> Result<Option<Value>, BackendError> {
        Ok(self.config.get(key).cloned())
    }

    fn set_config(&mut self, key: &str, value: Value) -> Result<(), BackendError> {
        self.config_writes += 1;
        self.config.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_config(&mut self, key: &str) -> Result<(), BackendError> {
        self.config_writes += 1;
        self.config.remove(key);
        Ok(())
    }

    fn cumulative_answer_count(&self) -> Result<u64, BackendError> {
        Ok(self.answer_count)
    }

    fn undo_status(&self) -> Result<UndoStatus, BackendError> {
        Ok(UndoStatus {
            undo: self.undo_stack.last().cloned(),
            redo: self.redo_stack.last().cloned(),
        })
    }

    fn undo(&mut self) -> Result<ChangeSet, BackendError> {
        match self.undo_stack.pop() {
            Some(op) => {
                self.redo_stack.push(op.clone());
                Ok(ChangeSet::named(op))
            }
            None => Ok(ChangeSet::empty()),
        }
    }

    fn redo(&mut self) -> Result<ChangeSet, BackendError> {
        match self.redo_stack.pop() {
            Some(op) => {
                self.undo_stack.push(op.clone());
                Ok(ChangeSet::named(op))
            }
            None => Ok(ChangeSet::empty()),
        }
    }

    fn schema_modified_at(&self) -> Result<DateTime<Utc>, BackendError> {
        Ok(DateTime::from_timestamp_millis(self.schema_modified_ms)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }

    fn mark_schema_modified(&mut self) -> Result<(), BackendError> {
        self.schema_modified_ms = Utc::now().timestamp_millis().max(self.last_sync_ms + 1);
        Ok(())
    }

    fn last_sync_at(&self) -> Result<DateTime<Utc>, BackendError> {
        Ok(DateTime::from_timestamp_millis(self.last_sync_ms)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }

    fn mark_synced(&mut self) -> Result<(), BackendError> {
        self.last_sync_ms = Utc::now().timestamp_millis().max(self.schema_modified_ms);
        Ok(())
    }
}
