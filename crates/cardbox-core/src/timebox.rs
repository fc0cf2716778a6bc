//! Timebox tracking.
//!
//! A timebox is a configured study-duration threshold after which the user is
//! prompted to take a break. The tracker is a side-effecting poll, not a push
//! notification -- there is no internal timer or thread. The caller invokes
//! [`TimeboxTracker::check_reached`] periodically (typically after every
//! answer) and passes the current time and cumulative answer count in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a positive timebox check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeboxReached {
    /// The configured limit, not the raw elapsed time.
    pub elapsed_secs: u32,
    /// Answers given since the timebox baseline.
    pub reps_since_start: u64,
}

/// Baseline for one timebox window.
///
/// The baseline is reset every time the window is (re)armed, so elapsed time
/// is never computed against a stale start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeboxTracker {
    started_at: DateTime<Utc>,
    start_reps: u64,
}

impl TimeboxTracker {
    /// Arm a new timebox window from the given baseline.
    pub fn start(now: DateTime<Utc>, cumulative_reps: u64) -> Self {
        Self {
            started_at: now,
            start_reps: cumulative_reps,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn start_reps(&self) -> u64 {
        self.start_reps
    }

    /// Poll whether the timebox limit has been exceeded.
    ///
    /// Returns `None` when timeboxing is disabled (`limit_secs == 0`) or the
    /// window has not elapsed yet. On a positive check the baseline is
    /// rearmed to `(now, cumulative_reps)` before returning.
    pub fn check_reached(
        &mut self,
        now: DateTime<Utc>,
        limit_secs: u32,
        cumulative_reps: u64,
    ) -> Option<TimeboxReached> {
        if limit_secs == 0 {
            return None;
        }
        let elapsed = (now - self.started_at).num_seconds();
        if elapsed <= i64::from(limit_secs) {
            return None;
        }
        let reached = TimeboxReached {
            elapsed_secs: limit_secs,
            reps_since_start: cumulative_reps.saturating_sub(self.start_reps),
        };
        self.started_at = now;
        self.start_reps = cumulative_reps;
        Some(reached)
    }
}
