//! Undo/redo coordination.
//!
//! Thin layer over the backend's undo history. Every query fetches a fresh
//! status snapshot; label and availability for one direction are derived
//! from the same snapshot so they cannot disagree. Performing an undo or
//! redo with nothing pending yields an empty change-set, never an error --
//! the caller turns that into "nothing to undo" messaging.

use crate::backend::{Backend, ChangeSet, UndoStatus};
use crate::error::Result;

/// Coordinates undo/redo against an open backend.
pub struct UndoRedoCoordinator<'a, B: Backend> {
    backend: &'a mut B,
}

impl<'a, B: Backend> UndoRedoCoordinator<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }

    /// Fetch a fresh snapshot of both pending actions.
    pub fn status(&self) -> Result<UndoStatus> {
        Ok(self.backend.undo_status()?)
    }

    pub fn undo_label(&self) -> Result<Option<String>> {
        Ok(self.status()?.undo)
    }

    pub fn undo_available(&self) -> Result<bool> {
        Ok(self.status()?.undo.is_some())
    }

    pub fn redo_label(&self) -> Result<Option<String>> {
        Ok(self.status()?.redo)
    }

    pub fn redo_available(&self) -> Result<bool> {
        Ok(self.status()?.redo.is_some())
    }

    pub fn perform_undo(&mut self) -> Result<ChangeSet> {
        Ok(self.backend.undo()?)
    }

    pub fn perform_redo(&mut self) -> Result<ChangeSet> {
        Ok(self.backend.redo()?)
    }
}

/// User-facing message for an undo result.
pub fn describe_undo(changes: &ChangeSet) -> String {
    if changes.is_empty() {
        "Nothing to undo".to_string()
    } else {
        format!("Undone: {}", changes.operation)
    }
}

/// User-facing message for a redo result.
pub fn describe_redo(changes: &ChangeSet) -> String {
    if changes.is_empty() {
        "Nothing to redo".to_string()
    } else {
        format!("Redone: {}", changes.operation)
    }
}
