//! Database connection management

use crate::config::StoreConfig;
use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Apply connection settings: foreign keys, busy timeout and, for file
/// databases, WAL journaling
pub fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON")
        .map_err(from_rusqlite)?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(from_rusqlite)?;

    if !config.is_in_memory() {
        // journal_mode answers with the resulting mode
        let _mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
    }
    Ok(())
}

/// Open, configure and migrate a database described by `config`
pub fn open_with_config(config: &StoreConfig) -> Result<Connection> {
    let mut conn = if config.is_in_memory() {
        open_in_memory()?
    } else {
        open(&config.path)?
    };
    configure(&conn, config)?;
    apply_migrations(&mut conn)?;
    tracing::debug!(path = %config.path.display(), "store database ready");
    Ok(conn)
}
