use cardbox_core::{Config, Session, SqliteBackend};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the session over the configured collection path.
pub fn open_session() -> Result<Session<SqliteBackend>, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let path = config.collection_path()?;
    let mut session = Session::new(path);
    session.open()?;
    Ok(session)
}

/// Close with the configured downgrade preference.
pub fn close_session(session: &mut Session<SqliteBackend>) -> CliResult {
    let config = Config::load_or_default();
    session.close(config.collection.downgrade_on_close, false)?;
    Ok(())
}
