//! # Cardbox Core Library
//!
//! This library provides the session coordination layer for the Cardbox
//! spaced-repetition client. The heavy domain logic (scheduling algorithm,
//! card data model, search, sync) belongs to an opaque backend; this crate
//! coordinates everything the client keeps locally: which scheduler
//! generation is active, timebox break prompts, undo/redo messaging, and the
//! open/close lifecycle of the session itself.
//!
//! ## Architecture
//!
//! - **Backend**: Trait boundary to the collection store, with a SQLite
//!   implementation for local use and tests
//! - **Scheduler**: Version resolution and the legacy/live scheduler variant
//! - **Timebox**: A wall-clock poll the caller invokes after each answer
//! - **Session**: The facade gating every component behind an open store
//!
//! ## Key Components
//!
//! - [`Session`]: Open/close lifecycle and schema confirmation protocol
//! - [`Backend`] / [`SqliteBackend`]: Store boundary and local store
//! - [`TimeboxTracker`]: Break prompt tracking
//! - [`UndoRedoCoordinator`]: Undo/redo labels and execution
//! - [`Config`]: Application configuration management

pub mod backend;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod timebox;
pub mod undo;

pub use backend::{Backend, ChangeSet, SqliteBackend, UndoStatus};
pub use config::Config;
pub use error::{BackendError, ConfigError, CoreError};
pub use scheduler::{Scheduler, SchedulerVersion};
pub use session::Session;
pub use timebox::{TimeboxReached, TimeboxTracker};
pub use undo::UndoRedoCoordinator;
