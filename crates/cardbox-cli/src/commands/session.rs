use clap::Subcommand;

use cardbox_core::backend::{keys, Backend};
use cardbox_core::CoreError;

use super::common::{close_session, open_session, CliResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Open (or create) the collection
    Open,
    /// Close the collection
    Close {
        /// Downgrade the store for older clients
        #[arg(long)]
        downgrade: bool,
        /// The close is part of a full-sync handoff
        #[arg(long)]
        full_sync: bool,
    },
    /// Show collection status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark the schema as modified (forces a full sync)
    ModSchema {
        /// Skip the confirmation guard
        #[arg(long)]
        force: bool,
    },
    /// Record a successful sync point
    MarkSynced,
    /// Show or set the browser sort preference
    Sort {
        /// Sort field to set (omit to show the current preference)
        field: Option<String>,
        /// Sort in reverse order
        #[arg(long)]
        reverse: bool,
    },
}

pub fn run(action: SessionAction) -> CliResult {
    match action {
        SessionAction::Open => {
            let mut session = open_session()?;
            // open_session already opened it; report what happened on disk.
            println!(
                "collection ready at {} (scheduler version {})",
                session.path().display(),
                session.scheduler_version()?.as_i64()
            );
            close_session(&mut session)?;
        }
        SessionAction::Close {
            downgrade,
            full_sync,
        } => {
            let mut session = open_session()?;
            session.close(downgrade, full_sync)?;
            println!("closed");
        }
        SessionAction::Status { json } => {
            let mut session = open_session()?;
            let version = session.scheduler_version()?;
            let scheduler = session.scheduler();
            let answers = session.scheduler().cumulative_answer_count(session.backend()?)?;
            let schema_changed = session.schema_changed()?;

            if json {
                let status = serde_json::json!({
                    "path": session.path().display().to_string(),
                    "scheduler_version": version.as_i64(),
                    "v3_enabled": scheduler.v3_enabled(),
                    "operable": scheduler.is_operable(),
                    "answers": answers,
                    "schema_changed": schema_changed,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("path: {}", session.path().display());
                println!("scheduler version: {}", version.as_i64());
                println!("v3 enabled: {}", scheduler.v3_enabled());
                println!("answers: {answers}");
                println!("schema changed: {schema_changed}");
            }
            close_session(&mut session)?;
        }
        SessionAction::ModSchema { force } => {
            let mut session = open_session()?;
            let result = if force {
                session.mod_schema_no_check()
            } else {
                session.mod_schema()
            };
            match result {
                Ok(()) => println!("schema marked as modified; next sync will be a full sync"),
                Err(CoreError::ConfirmationRequired) => {
                    eprintln!(
                        "this change forces a full sync; re-run with --force to confirm"
                    );
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
            close_session(&mut session)?;
        }
        SessionAction::MarkSynced => {
            let mut session = open_session()?;
            session.mark_synced()?;
            println!("sync point recorded");
            close_session(&mut session)?;
        }
        SessionAction::Sort { field, reverse } => {
            let mut session = open_session()?;
            if let Some(field) = field {
                let backend = session.backend_mut()?;
                backend.set_config_string(keys::SORT_FIELD, &field)?;
                backend.set_config_bool(keys::SORT_BACKWARDS, reverse)?;
            }
            let backend = session.backend()?;
            let field = backend
                .get_config_string(keys::SORT_FIELD)?
                .unwrap_or_else(|| "noteCreation".to_string());
            let backwards = backend
                .get_config_bool(keys::SORT_BACKWARDS)?
                .unwrap_or(false);
            println!("sort: {field} (reverse: {backwards})");
            close_session(&mut session)?;
        }
    }
    Ok(())
}
