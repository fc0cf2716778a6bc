//! SQLite-backed collection store.
//!
//! Provides persistent storage for:
//! - Backend configuration (JSON values in a key-value table)
//! - The answer log driving `cumulative_answer_count`
//! - Schema-modified / last-sync markers
//!
//! The undo/redo history lives in memory on the open handle; it does not
//! survive a close.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;

use super::{Backend, ChangeSet, UndoStatus};
use crate::error::BackendError;

/// Schema generation written to `PRAGMA user_version`.
const USER_VERSION: i64 = 2;
/// Oldest schema generation other clients can still read.
const COMPAT_USER_VERSION: i64 = 1;

/// Operation name recorded for answered cards.
pub const OP_ANSWER_CARD: &str = "Answer card";

const MARKER_SCHEMA_MODIFIED: &str = "schema_modified";
const MARKER_LAST_SYNC: &str = "last_sync";

/// SQLite implementation of [`Backend`].
pub struct SqliteBackend {
    conn: Connection,
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
}

impl SqliteBackend {
    /// Open an in-memory store (for tests and throwaway sessions).
    pub fn open_memory() -> Result<(Self, bool), BackendError> {
        let conn = Connection::open_in_memory()?;
        let mut backend = Self::from_connection(conn)?;
        backend.mark_schema_modified()?;
        Ok((backend, true))
    }

    fn from_connection(conn: Connection) -> Result<Self, BackendError> {
        let backend = Self {
            conn,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        };
        backend.migrate()?;
        Ok(backend)
    }

    fn migrate(&self) -> Result<(), BackendError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS config (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS markers (
                    key   TEXT PRIMARY KEY,
                    at_ms INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS revlog (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    answered_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_revlog_answered_at ON revlog(answered_at);",
            )
            .map_err(|e| BackendError::MigrationFailed(e.to_string()))?;
        self.conn
            .pragma_update(None, "user_version", USER_VERSION)
            .map_err(|e| BackendError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Record one answered card and make it undoable.
    pub fn log_answer(&mut self) -> Result<(), BackendError> {
        self.insert_answer_row()?;
        self.undo_stack.push(OP_ANSWER_CARD.to_string());
        // A new operation invalidates the redo history.
        self.redo_stack.clear();
        Ok(())
    }

    fn insert_answer_row(&self) -> Result<(), BackendError> {
        self.conn.execute(
            "INSERT INTO revlog (answered_at) VALUES (?1)",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete_newest_answer_row(&self) -> Result<(), BackendError> {
        self.conn.execute(
            "DELETE FROM revlog WHERE id = (SELECT MAX(id) FROM revlog)",
            [],
        )?;
        Ok(())
    }

    fn marker_ms(&self, key: &str) -> Result<i64, BackendError> {
        let mut stmt = self
            .conn
            .prepare("SELECT at_ms FROM markers WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, i64>(0));
        match result {
            Ok(ms) => Ok(ms),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn set_marker_ms(&self, key: &str, at_ms: i64) -> Result<(), BackendError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO markers (key, at_ms) VALUES (?1, ?2)",
            params![key, at_ms],
        )?;
        Ok(())
    }

    /// Revert the most recent store operation for `op`.
    fn revert(&self, op: &str) -> Result<(), BackendError> {
        if op == OP_ANSWER_CARD {
            self.delete_newest_answer_row()?;
        }
        Ok(())
    }

    /// Re-apply a previously reverted store operation for `op`.
    fn reapply(&self, op: &str) -> Result<(), BackendError> {
        if op == OP_ANSWER_CARD {
            self.insert_answer_row()?;
        }
        Ok(())
    }
}

impl Backend for SqliteBackend {
    fn open(path: &Path) -> Result<(Self, bool), BackendError> {
        let created = !path.exists();
        let conn = Connection::open(path).map_err(|source| BackendError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut backend = Self::from_connection(conn)?;
        if created {
            // A fresh store has diverged from every sync point by definition.
            backend.mark_schema_modified()?;
        }
        Ok((backend, created))
    }

    fn close(self, downgrade: bool) -> Result<(), BackendError> {
        if downgrade {
            self.conn
                .pragma_update(None, "user_version", COMPAT_USER_VERSION)?;
        }
        self.conn
            .close()
            .map_err(|(_conn, e)| BackendError::CloseFailed(e.to_string()))
    }

    fn get_config(&self, key: &str) -> Result<Option<Value>, BackendError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM config WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(raw) => {
                let value = serde_json::from_str(&raw).map_err(|e| {
                    BackendError::QueryFailed(format!("corrupt config value for '{key}': {e}"))
                })?;
                Ok(Some(value))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_config(&mut self, key: &str, value: Value) -> Result<(), BackendError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            params![key, value.to_string()],
        )?;
        Ok(())
    }

    fn remove_config(&mut self, key: &str) -> Result<(), BackendError> {
        self.conn
            .execute("DELETE FROM config WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn cumulative_answer_count(&self) -> Result<u64, BackendError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM revlog", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
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
                self.revert(&op)?;
                self.redo_stack.push(op.clone());
                Ok(ChangeSet::named(op))
            }
            None => Ok(ChangeSet::empty()),
        }
    }

    fn redo(&mut self) -> Result<ChangeSet, BackendError> {
        match self.redo_stack.pop() {
            Some(op) => {
                self.reapply(&op)?;
                self.undo_stack.push(op.clone());
                Ok(ChangeSet::named(op))
            }
            None => Ok(ChangeSet::empty()),
        }
    }

    fn schema_modified_at(&self) -> Result<DateTime<Utc>, BackendError> {
        let ms = self.marker_ms(MARKER_SCHEMA_MODIFIED)?;
        Ok(DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }

    fn mark_schema_modified(&mut self) -> Result<(), BackendError> {
        // Keep the marker strictly ahead of the sync point even when both
        // land in the same millisecond.
        let at = Utc::now()
            .timestamp_millis()
            .max(self.marker_ms(MARKER_LAST_SYNC)? + 1);
        self.set_marker_ms(MARKER_SCHEMA_MODIFIED, at)
    }

    fn last_sync_at(&self) -> Result<DateTime<Utc>, BackendError> {
        let ms = self.marker_ms(MARKER_LAST_SYNC)?;
        Ok(DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }

    fn mark_synced(&mut self) -> Result<(), BackendError> {
        let at = Utc::now()
            .timestamp_millis()
            .max(self.marker_ms(MARKER_SCHEMA_MODIFIED)?);
        self.set_marker_ms(MARKER_LAST_SYNC, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let (mut backend, created) = SqliteBackend::open_memory().unwrap();
        assert!(created);
        assert!(backend.get_config("missing").unwrap().is_none());

        backend.set_config_i64("schedVer", 2).unwrap();
        assert_eq!(backend.get_config_i64("schedVer").unwrap(), Some(2));

        backend.set_config_bool("sched2021", true).unwrap();
        assert_eq!(backend.get_config_bool("sched2021").unwrap(), Some(true));

        backend.remove_config("schedVer").unwrap();
        assert!(backend.get_config("schedVer").unwrap().is_none());
    }

    #[test]
    fn answer_log_counts() {
        let (mut backend, _) = SqliteBackend::open_memory().unwrap();
        assert_eq!(backend.cumulative_answer_count().unwrap(), 0);
        backend.log_answer().unwrap();
        backend.log_answer().unwrap();
        assert_eq!(backend.cumulative_answer_count().unwrap(), 2);
    }

    #[test]
    fn undo_reverts_answer() {
        let (mut backend, _) = SqliteBackend::open_memory().unwrap();
        backend.log_answer().unwrap();
        assert_eq!(backend.cumulative_answer_count().unwrap(), 1);

        let changes = backend.undo().unwrap();
        assert_eq!(changes.operation, OP_ANSWER_CARD);
        assert_eq!(backend.cumulative_answer_count().unwrap(), 0);

        let changes = backend.redo().unwrap();
        assert_eq!(changes.operation, OP_ANSWER_CARD);
        assert_eq!(backend.cumulative_answer_count().unwrap(), 1);
    }

    #[test]
    fn undo_with_nothing_pending_is_empty() {
        let (mut backend, _) = SqliteBackend::open_memory().unwrap();
        let changes = backend.undo().unwrap();
        assert!(changes.is_empty());
        let changes = backend.redo().unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn new_operation_clears_redo() {
        let (mut backend, _) = SqliteBackend::open_memory().unwrap();
        backend.log_answer().unwrap();
        backend.undo().unwrap();
        assert!(backend.undo_status().unwrap().redo.is_some());

        backend.log_answer().unwrap();
        assert!(backend.undo_status().unwrap().redo.is_none());
    }

    #[test]
    fn fresh_store_has_modified_schema() {
        let (backend, _) = SqliteBackend::open_memory().unwrap();
        let modified = backend.schema_modified_at().unwrap();
        let synced = backend.last_sync_at().unwrap();
        assert!(modified > synced);
    }

    #[test]
    fn sync_then_modify_orders_markers() {
        let (mut backend, _) = SqliteBackend::open_memory().unwrap();
        backend.mark_synced().unwrap();
        assert!(backend.schema_modified_at().unwrap() <= backend.last_sync_at().unwrap());

        backend.mark_schema_modified().unwrap();
        assert!(backend.schema_modified_at().unwrap() > backend.last_sync_at().unwrap());
    }

    #[test]
    fn reopen_preserves_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.db");

        let (mut backend, created) = SqliteBackend::open(&path).unwrap();
        assert!(created);
        backend.set_config_i64("schedVer", 2).unwrap();
        backend.close(false).unwrap();

        let (backend, created) = SqliteBackend::open(&path).unwrap();
        assert!(!created);
        assert_eq!(backend.get_config_i64("schedVer").unwrap(), Some(2));
    }
}
