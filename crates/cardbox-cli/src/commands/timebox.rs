use clap::Subcommand;

use cardbox_core::backend::{keys, Backend};
use cardbox_core::{Session, SqliteBackend, TimeboxTracker};
use chrono::DateTime;

use super::common::{close_session, open_session, CliResult};

// The in-process tracker is memory-only; the CLI persists its baseline in
// backend config so the window spans invocations.
const KEY_STARTED_AT_MS: &str = "timeboxStartedAtMs";
const KEY_START_REPS: &str = "timeboxStartReps";

#[derive(Subcommand)]
pub enum TimeboxAction {
    /// Arm the timebox window from now
    Start,
    /// Poll whether the timebox limit was reached
    Check,
    /// Set the timebox limit in seconds (0 disables)
    SetLimit { secs: u32 },
    /// Show the configured limit and current baseline
    Show,
}

pub fn persist_baseline(session: &mut Session<SqliteBackend>) -> CliResult {
    if let Some(tracker) = session.timebox().copied() {
        let backend = session.backend_mut()?;
        backend.set_config_i64(KEY_STARTED_AT_MS, tracker.started_at().timestamp_millis())?;
        backend.set_config_i64(KEY_START_REPS, tracker.start_reps() as i64)?;
    }
    Ok(())
}

/// Load the persisted baseline into the session. Returns false when no
/// timebox has been started.
pub fn restore_baseline(
    session: &mut Session<SqliteBackend>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (ms, reps) = {
        let backend = session.backend()?;
        (
            backend.get_config_i64(KEY_STARTED_AT_MS)?,
            backend.get_config_i64(KEY_START_REPS)?,
        )
    };
    match (ms, reps) {
        (Some(ms), Some(reps)) => {
            let started_at =
                DateTime::from_timestamp_millis(ms).ok_or("corrupt timebox baseline")?;
            session.restore_timebox(TimeboxTracker::start(started_at, reps.max(0) as u64))?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

pub fn run(action: TimeboxAction) -> CliResult {
    match action {
        TimeboxAction::Start => {
            let mut session = open_session()?;
            session.start_timebox()?;
            persist_baseline(&mut session)?;
            println!("timebox started");
            close_session(&mut session)?;
        }
        TimeboxAction::Check => {
            let mut session = open_session()?;
            if !restore_baseline(&mut session)? {
                println!("timebox not started");
            } else {
                match session.check_timebox()? {
                    Some(hit) => {
                        persist_baseline(&mut session)?;
                        println!(
                            "Break time! {}s studied, {} card(s) answered",
                            hit.elapsed_secs, hit.reps_since_start
                        );
                    }
                    None => println!("within timebox"),
                }
            }
            close_session(&mut session)?;
        }
        TimeboxAction::SetLimit { secs } => {
            let mut session = open_session()?;
            session
                .backend_mut()?
                .set_config_i64(keys::TIMEBOX_SECS, i64::from(secs))?;
            println!("timebox limit: {secs}s");
            close_session(&mut session)?;
        }
        TimeboxAction::Show => {
            let mut session = open_session()?;
            let limit = session
                .scheduler()
                .timebox_duration_secs(session.backend()?)?;
            if limit == 0 {
                println!("timeboxing disabled");
            } else {
                println!("limit: {limit}s");
            }
            if restore_baseline(&mut session)? {
                let tracker = session.timebox().copied();
                if let Some(tracker) = tracker {
                    println!(
                        "started at: {} (baseline {} answers)",
                        tracker.started_at().to_rfc3339(),
                        tracker.start_reps()
                    );
                }
            } else {
                println!("timebox not started");
            }
            close_session(&mut session)?;
        }
    }
    Ok(())
}
