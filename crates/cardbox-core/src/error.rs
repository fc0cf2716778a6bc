//! Core error types for cardbox-core.
//!
//! This module defines the error hierarchy using thiserror. The variants on
//! [`CoreError`] map directly onto the recovery protocol callers are expected
//! to follow: version errors are fatal, `UpgradeRequired` is user-actionable,
//! and `ConfirmationRequired` is part of the two-phase schema confirmation.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cardbox-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The persisted scheduler version is outside the supported set {1, 2}.
    ///
    /// Fatal within the session; retrying cannot recover.
    #[error("unsupported scheduler version: {found}")]
    UnsupportedSchedulerVersion { found: i64 },

    /// The V3 scheduler flag was toggled while the collection is still on
    /// the legacy scheduler version.
    #[error("the V3 scheduler requires scheduler version 2; upgrade the collection first")]
    UpgradeRequired,

    /// A schema-modifying operation was attempted without prior confirmation.
    ///
    /// Callers are expected to catch this, prompt the user, and retry via
    /// [`crate::Session::mod_schema_no_check`].
    #[error("modifying the schema forces a full sync; confirmation required")]
    ConfirmationRequired,

    /// An operation was attempted on a closed session.
    #[error("session is closed")]
    SessionClosed,

    /// Backend-related errors
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Backend-specific errors.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Failed to open the backing store
    #[error("failed to open collection at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("store migration failed: {0}")]
    MigrationFailed(String),

    /// Store is locked by another process
    #[error("collection store is locked")]
    Locked,

    /// Releasing the store failed
    #[error("failed to close collection: {0}")]
    CloseFailed(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for BackendError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    BackendError::Locked
                } else {
                    BackendError::QueryFailed(err.to_string())
                }
            }
            _ => BackendError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Backend(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
