// src/database.rs

use log::debug;
use rusqlite::{Connection, Result};
use std::path::Path;

pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::InvalidPath(format!("{}: {}", parent.display(), e).into())
            })?;
        }
    }
    let conn = Connection::open(path)?;
    init_db(&conn)?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    debug!("[Database] Checking history schema...");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS quiz_history (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            percentage INTEGER NOT NULL,
            completed_at TEXT NOT NULL,
            payload TEXT NOT NULL
        );
        ",
    )?;

    Ok(())
}
