//! Study-session facade.
//!
//! [`Session`] is the single entry point to an open collection. It owns the
//! backend handle and the active scheduler, gates every component behind the
//! open/closed lifecycle, and carries the schema-confirmation protocol.
//!
//! The session is meant to live on one background worker context. Mutating
//! operations take `&mut self`, which gives open/close transitions the
//! mutual exclusion the design calls for; there is no internal locking and
//! no support for concurrent mutating calls without an external lock.

use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::error::{CoreError, Result};
use crate::scheduler::{self, Scheduler, SchedulerVersion};
use crate::timebox::{TimeboxReached, TimeboxTracker};
use crate::undo::UndoRedoCoordinator;

/// One logical session over a collection store.
pub struct Session<B: Backend> {
    path: PathBuf,
    backend: Option<B>,
    scheduler: Scheduler,
    timebox: Option<TimeboxTracker>,
}

impl<B: Backend> Session<B> {
    /// Create a closed session for the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backend: None,
            scheduler: Scheduler::Disabled,
            timebox: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// Open the backing store and load the scheduler.
    ///
    /// Idempotent: an already-open session returns `false` without reloading
    /// any subcomponent. Returns `true` when the store was freshly created;
    /// fresh stores are forced onto the latest scheduler version so the
    /// legacy path is never active for new collections.
    pub fn open(&mut self) -> Result<bool> {
        if self.backend.is_some() {
            return Ok(false);
        }
        let (mut backend, created) = B::open(&self.path)?;
        self.scheduler = if created {
            scheduler::upgrade_to_latest(&mut backend)?
        } else {
            scheduler::load_scheduler(&mut backend)?
        };
        self.backend = Some(backend);
        Ok(created)
    }

    /// Alias for [`Session::open`], matching the reopen-after-sync call site.
    pub fn reopen(&mut self) -> Result<bool> {
        self.open()
    }

    /// Close the session. No-op when already closed.
    ///
    /// `downgrade` asks the backend to leave the store readable by older
    /// clients. When `for_full_sync` is set the backend manages its own
    /// shutdown as part of the sync handoff and only local state is dropped.
    pub fn close(&mut self, downgrade: bool, for_full_sync: bool) -> Result<()> {
        let Some(backend) = self.backend.take() else {
            return Ok(());
        };
        self.scheduler = Scheduler::Disabled;
        self.timebox = None;
        if for_full_sync {
            drop(backend);
            Ok(())
        } else {
            Ok(backend.close(downgrade)?)
        }
    }

    /// Borrow the open backend.
    ///
    /// Escape hatch for backend-specific operations the facade does not
    /// cover (answer logging on the SQLite backend, for instance).
    pub fn backend(&self) -> Result<&B> {
        self.backend.as_ref().ok_or(CoreError::SessionClosed)
    }

    pub fn backend_mut(&mut self) -> Result<&mut B> {
        self.backend.as_mut().ok_or(CoreError::SessionClosed)
    }

    // ── Scheduler ────────────────────────────────────────────────────

    /// The currently loaded scheduler.
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler
    }

    /// Resolve the persisted scheduler version.
    pub fn scheduler_version(&self) -> Result<SchedulerVersion> {
        scheduler::resolve(self.backend()?)
    }

    /// Re-select the scheduler from persisted configuration.
    pub fn load_scheduler(&mut self) -> Result<()> {
        self.scheduler = scheduler::load_scheduler(self.backend_mut()?)?;
        Ok(())
    }

    /// Toggle the V3 scheduler flag. See [`scheduler::set_v3`].
    pub fn set_v3(&mut self, enabled: bool) -> Result<()> {
        if let Some(reloaded) = scheduler::set_v3(self.backend_mut()?, enabled)? {
            self.scheduler = reloaded;
        }
        Ok(())
    }

    /// Move the collection to the latest scheduler version.
    pub fn upgrade_scheduler(&mut self) -> Result<()> {
        self.scheduler = scheduler::upgrade_to_latest(self.backend_mut()?)?;
        Ok(())
    }

    // ── Timebox ──────────────────────────────────────────────────────

    /// Arm the timebox window from the current time and answer count.
    ///
    /// Call once when a study session begins.
    pub fn start_timebox(&mut self) -> Result<()> {
        let scheduler = self.scheduler;
        let reps = scheduler.cumulative_answer_count(self.backend()?)?;
        self.timebox = Some(TimeboxTracker::start(Utc::now(), reps));
        Ok(())
    }

    /// Restore a timebox baseline persisted elsewhere (e.g. by a CLI between
    /// invocations).
    pub fn restore_timebox(&mut self, tracker: TimeboxTracker) -> Result<()> {
        if self.backend.is_none() {
            return Err(CoreError::SessionClosed);
        }
        self.timebox = Some(tracker);
        Ok(())
    }

    pub fn timebox(&self) -> Option<&TimeboxTracker> {
        self.timebox.as_ref()
    }

    /// Poll the timebox. Returns the break prompt data when the configured
    /// limit was exceeded, rearming the window as a side effect.
    pub fn check_timebox(&mut self) -> Result<Option<TimeboxReached>> {
        let scheduler = self.scheduler;
        let (limit, reps) = {
            let backend = self.backend()?;
            (
                scheduler.timebox_duration_secs(backend)?,
                scheduler.cumulative_answer_count(backend)?,
            )
        };
        let Some(tracker) = self.timebox.as_mut() else {
            return Ok(None);
        };
        Ok(tracker.check_reached(Utc::now(), limit, reps))
    }

    // ── Undo/redo ────────────────────────────────────────────────────

    pub fn undo_redo(&mut self) -> Result<UndoRedoCoordinator<'_, B>> {
        Ok(UndoRedoCoordinator::new(self.backend_mut()?))
    }

    // ── Schema confirmation protocol ─────────────────────────────────

    /// True iff the schema-modified marker exceeds the last-sync point.
    pub fn schema_changed(&self) -> Result<bool> {
        let backend = self.backend()?;
        Ok(backend.schema_modified_at()? > backend.last_sync_at()?)
    }

    /// Guarded schema modification.
    ///
    /// Fails with [`CoreError::ConfirmationRequired`] unless the schema is
    /// already marked as modified since the last sync. Schema changes force
    /// a full resync, so the first stamp after a sync must go through the
    /// caller-confirmed [`Session::mod_schema_no_check`].
    pub fn mod_schema(&mut self) -> Result<()> {
        if !self.schema_changed()? {
            return Err(CoreError::ConfirmationRequired);
        }
        self.mod_schema_no_check()
    }

    /// Unconditionally stamp the schema-modified marker.
    pub fn mod_schema_no_check(&mut self) -> Result<()> {
        Ok(self.backend_mut()?.mark_schema_modified()?)
    }

    /// Record a successful sync point.
    pub fn mark_synced(&mut self) -> Result<()> {
        Ok(self.backend_mut()?.mark_synced()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::keys;
    use crate::backend::mock::MemoryBackend;

    fn open_session() -> Session<MemoryBackend> {
        let mut session = Session::new("mock");
        assert!(session.open().unwrap());
        session
    }

    #[test]
    fn fresh_store_forces_latest_scheduler() {
        let session = open_session();
        assert_eq!(session.scheduler_version().unwrap(), SchedulerVersion::V2);
        assert!(session.scheduler().is_operable());
    }

    #[test]
    fn open_is_idempotent_and_skips_reload() {
        let mut session = open_session();
        // Flip the persisted version under the open session; a second open
        // must not reload the scheduler from it.
        session
            .backend_mut()
            .unwrap()
            .set_config_i64(keys::SCHEDULER_VERSION, 1)
            .unwrap();

        assert!(!session.open().unwrap());
        assert!(session.scheduler().is_operable());

        // An explicit reload does pick it up.
        session.load_scheduler().unwrap();
        assert!(!session.scheduler().is_operable());
    }

    #[test]
    fn close_when_closed_is_noop() {
        let mut session: Session<MemoryBackend> = Session::new("mock");
        session.close(false, false).unwrap();
        session.close(true, true).unwrap();
        assert!(!session.is_open());
    }

    #[test]
    fn close_clears_local_state() {
        let mut session = open_session();
        session.start_timebox().unwrap();
        session.close(false, false).unwrap();

        assert!(!session.is_open());
        assert!(session.timebox().is_none());
        assert!(!session.scheduler().is_operable());
        assert!(matches!(
            session.scheduler_version(),
            Err(CoreError::SessionClosed)
        ));
    }

    #[test]
    fn full_sync_close_skips_backend_shutdown() {
        let mut session = open_session();
        session.close(false, true).unwrap();
        assert!(!session.is_open());
        // Handoff done; the session can be reopened afterwards.
        assert!(session.reopen().unwrap());
    }

    #[test]
    fn operations_on_closed_session_fail() {
        let mut session: Session<MemoryBackend> = Session::new("mock");
        assert!(matches!(session.set_v3(true), Err(CoreError::SessionClosed)));
        assert!(matches!(
            session.check_timebox(),
            Err(CoreError::SessionClosed)
        ));
        assert!(matches!(
            session.schema_changed(),
            Err(CoreError::SessionClosed)
        ));
        assert!(matches!(
            session.start_timebox(),
            Err(CoreError::SessionClosed)
        ));
    }

    #[test]
    fn set_v3_survives_reload() {
        let mut session = open_session();
        session.set_v3(false).unwrap();
        assert!(!session.scheduler().v3_enabled());

        session.load_scheduler().unwrap();
        assert!(!session.scheduler().v3_enabled());
    }

    #[test]
    fn timebox_disabled_without_start() {
        let mut session = open_session();
        assert!(session.check_timebox().unwrap().is_none());
    }

    #[test]
    fn timebox_zero_limit_never_fires() {
        let mut session = open_session();
        session
            .backend_mut()
            .unwrap()
            .set_config_i64(keys::TIMEBOX_SECS, 0)
            .unwrap();
        session.start_timebox().unwrap();
        assert!(session.check_timebox().unwrap().is_none());
    }

    #[test]
    fn undo_through_facade() {
        let mut session = open_session();
        session.backend_mut().unwrap().push_op("Bury note");

        let mut coordinator = session.undo_redo().unwrap();
        assert_eq!(coordinator.undo_label().unwrap().as_deref(), Some("Bury note"));
        let changes = coordinator.perform_undo().unwrap();
        assert_eq!(changes.operation, "Bury note");
    }

    #[test]
    fn schema_confirmation_protocol() {
        let mut session = open_session();

        // Immediately after a sync the guard refuses.
        session.mark_synced().unwrap();
        assert!(!session.schema_changed().unwrap());
        assert!(matches!(
            session.mod_schema(),
            Err(CoreError::ConfirmationRequired)
        ));

        // The caller confirms and retries unchecked.
        session.mod_schema_no_check().unwrap();
        assert!(session.schema_changed().unwrap());

        // With the marker stamped, the guarded variant passes.
        session.mod_schema().unwrap();
        assert!(session.schema_changed().unwrap());
    }

    #[test]
    fn fresh_store_starts_schema_changed() {
        let session = open_session();
        assert!(session.schema_changed().unwrap());
    }

    #[test]
    fn session_with_answers_feeds_timebox_baseline() {
        let mut session = open_session();
        session.backend_mut().unwrap().answer_many(5);
        session.start_timebox().unwrap();
        assert_eq!(session.timebox().unwrap().start_reps(), 5);
    }
}
