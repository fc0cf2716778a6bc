use clap::Subcommand;

use cardbox_core::undo::{describe_redo, describe_undo};

use super::common::{close_session, open_session, CliResult};

/// Undo history lives on the open session and does not span invocations;
/// a fresh invocation starts with nothing pending.
#[derive(Subcommand)]
pub enum UndoAction {
    /// Show pending undo/redo actions for this session
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Undo the most recent operation of this session
    Undo,
    /// Redo the most recently undone operation of this session
    Redo,
}

pub fn run(action: UndoAction) -> CliResult {
    let mut session = open_session()?;
    match action {
        UndoAction::Status { json } => {
            let status = session.undo_redo()?.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                match &status.undo {
                    Some(label) => println!("undo: {label}"),
                    None => println!("undo: (nothing)"),
                }
                match &status.redo {
                    Some(label) => println!("redo: {label}"),
                    None => println!("redo: (nothing)"),
                }
            }
        }
        UndoAction::Undo => {
            let changes = session.undo_redo()?.perform_undo()?;
            println!("{}", describe_undo(&changes));
        }
        UndoAction::Redo => {
            let changes = session.undo_redo()?.perform_redo()?;
            println!("{}", describe_redo(&changes));
        }
    }
    close_session(&mut session)?;
    Ok(())
}
