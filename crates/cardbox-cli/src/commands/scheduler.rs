use clap::Subcommand;

use super::common::{close_session, open_session, CliResult};

#[derive(Subcommand)]
pub enum SchedulerAction {
    /// Show the resolved scheduler version and flags
    Show,
    /// Enable or disable the V3 scheduler (requires version 2)
    SetV3 {
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },
    /// Upgrade the collection to the latest scheduler version
    Upgrade,
}

pub fn run(action: SchedulerAction) -> CliResult {
    match action {
        SchedulerAction::Show => {
            let mut session = open_session()?;
            let version = session.scheduler_version()?;
            let scheduler = session.scheduler();
            println!("version: {}", version.as_i64());
            println!("operable: {}", scheduler.is_operable());
            println!("v3: {}", scheduler.v3_enabled());
            close_session(&mut session)?;
        }
        SchedulerAction::SetV3 { enabled } => {
            let mut session = open_session()?;
            session.set_v3(enabled)?;
            println!("v3: {}", session.scheduler().v3_enabled());
            close_session(&mut session)?;
        }
        SchedulerAction::Upgrade => {
            let mut session = open_session()?;
            session.upgrade_scheduler()?;
            println!(
                "scheduler version: {}",
                session.scheduler_version()?.as_i64()
            );
            close_session(&mut session)?;
        }
    }
    Ok(())
}
