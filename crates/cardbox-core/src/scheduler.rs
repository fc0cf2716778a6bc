//! Scheduler version resolution and selection.
//!
//! The collection persists which scheduler generation is active. Version 1 is
//! the legacy generation: it still resolves for old collections, but only to
//! a disabled no-op scheduler. Version 2 is the live generation. The version
//! only changes through [`upgrade_to_latest`]; everything else reads it.
//!
//! All transitions here go through backend configuration so they survive a
//! reload -- there are no in-memory-only shortcuts.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::backend::{keys, Backend};
use crate::error::{CoreError, Result};

/// Scheduler generation persisted in backend configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerVersion {
    /// Legacy generation; resolves to a disabled scheduler.
    V1,
    /// Current generation.
    V2,
}

impl SchedulerVersion {
    pub const LATEST: SchedulerVersion = SchedulerVersion::V2;

    /// Parse a persisted version integer.
    pub fn from_config(raw: i64) -> Result<Self> {
        match raw {
            1 => Ok(SchedulerVersion::V1),
            2 => Ok(SchedulerVersion::V2),
            found => Err(CoreError::UnsupportedSchedulerVersion { found }),
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            SchedulerVersion::V1 => 1,
            SchedulerVersion::V2 => 2,
        }
    }
}

/// The active scheduler, selected by resolved version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduler {
    /// No-op scheduler for legacy collections. Answers nothing, timeboxes
    /// nothing.
    Disabled,
    /// Live scheduler.
    Live {
        /// Whether the V3 behavior flag is on.
        v3: bool,
    },
}

impl Scheduler {
    pub fn version(&self) -> SchedulerVersion {
        match self {
            Scheduler::Disabled => SchedulerVersion::V1,
            Scheduler::Live { .. } => SchedulerVersion::V2,
        }
    }

    pub fn is_operable(&self) -> bool {
        matches!(self, Scheduler::Live { .. })
    }

    pub fn v3_enabled(&self) -> bool {
        matches!(self, Scheduler::Live { v3: true })
    }

    /// Configured timebox limit in seconds; 0 means timeboxing is off.
    pub fn timebox_duration_secs<B: Backend>(&self, backend: &B) -> Result<u32> {
        match self {
            Scheduler::Disabled => Ok(0),
            Scheduler::Live { .. } => {
                let secs = backend.get_config_i64(keys::TIMEBOX_SECS)?.unwrap_or(0);
                Ok(secs.clamp(0, u32::MAX as i64) as u32)
            }
        }
    }

    /// Total answers recorded in the store.
    pub fn cumulative_answer_count<B: Backend>(&self, backend: &B) -> Result<u64> {
        match self {
            Scheduler::Disabled => Ok(0),
            Scheduler::Live { .. } => Ok(backend.cumulative_answer_count()?),
        }
    }
}

/// Read the persisted scheduler version. Missing config means legacy.
pub fn resolve<B: Backend>(backend: &B) -> Result<SchedulerVersion> {
    let raw = backend
        .get_config_i64(keys::SCHEDULER_VERSION)?
        .unwrap_or(SchedulerVersion::V1.as_i64());
    SchedulerVersion::from_config(raw)
}

/// Select a scheduler implementation for the resolved version.
///
/// Loading the live scheduler turns the V3 flag on when the key has never
/// been written, and on first activation (no stored creation offset)
/// migrates the timezone-handling preference.
pub fn load_scheduler<B: Backend>(backend: &mut B) -> Result<Scheduler> {
    match resolve(backend)? {
        SchedulerVersion::V1 => Ok(Scheduler::Disabled),
        SchedulerVersion::V2 => {
            if backend.get_config_bool(keys::SCHED_V3)?.is_none() {
                backend.set_config_bool(keys::SCHED_V3, true)?;
            }
            if backend.get_config_i64(keys::CREATION_OFFSET)?.is_none() {
                backend.set_config_i64(keys::CREATION_OFFSET, local_offset_minutes())?;
                backend.set_config_bool(keys::APPLY_TIMEZONE, true)?;
            }
            let v3 = backend.get_config_bool(keys::SCHED_V3)?.unwrap_or(false);
            Ok(Scheduler::Live { v3 })
        }
    }
}

/// Toggle the V3 scheduler flag. Only legal on version 2.
///
/// Returns the reloaded scheduler, or `None` when the flag already had the
/// requested value (in which case nothing was written).
pub fn set_v3<B: Backend>(backend: &mut B, enabled: bool) -> Result<Option<Scheduler>> {
    if resolve(backend)? != SchedulerVersion::V2 {
        return Err(CoreError::UpgradeRequired);
    }
    let current = backend.get_config_bool(keys::SCHED_V3)?.unwrap_or(false);
    if current == enabled {
        return Ok(None);
    }
    backend.set_config_bool(keys::SCHED_V3, enabled)?;
    Ok(Some(load_scheduler(backend)?))
}

/// Persist the latest scheduler version and reload.
///
/// Used on fresh stores so the legacy path is never active for new
/// collections.
pub fn upgrade_to_latest<B: Backend>(backend: &mut B) -> Result<Scheduler> {
    backend.set_config_i64(keys::SCHEDULER_VERSION, SchedulerVersion::LATEST.as_i64())?;
    load_scheduler(backend)
}

/// Current UTC offset of the local timezone, in minutes.
fn local_offset_minutes() -> i64 {
    (Local::now().offset().local_minus_utc() / 60) as i64
}
