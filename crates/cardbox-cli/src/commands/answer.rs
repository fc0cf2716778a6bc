use cardbox_core::{Backend, Config};

use super::common::{close_session, open_session, CliResult};
use super::timebox;

pub fn run(count: u64) -> CliResult {
    let mut session = open_session()?;
    for _ in 0..count {
        session.backend_mut()?.log_answer()?;
    }
    let total = session.backend()?.cumulative_answer_count()?;
    println!("recorded {count} answer(s); total {total}");

    // Poll the timebox after answering, the way a study client would.
    let config = Config::load_or_default();
    if config.study.break_prompts && timebox::restore_baseline(&mut session)? {
        if let Some(hit) = session.check_timebox()? {
            timebox::persist_baseline(&mut session)?;
            println!(
                "Break time! {}s studied, {} card(s) answered",
                hit.elapsed_secs, hit.reps_since_start
            );
        }
    }

    close_session(&mut session)?;
    Ok(())
}
