// src/repository.rs

use crate::error::Result;
use crate::models::HistoryEntry;
use log::{debug, warn};
use rusqlite::{params, Connection};

/// Inserts (or replaces) an entry, then drops everything beyond the newest `limit`.
pub fn save_history_entry(conn: &Connection, entry: &HistoryEntry, limit: usize) -> Result<()> {
    let payload = serde_json::to_string(entry)?;
    conn.execute(
        "INSERT OR REPLACE INTO quiz_history (id, title, percentage, completed_at, payload) VALUES (?, ?, ?, ?, ?)",
        params![
            entry.id,
            entry.quiz.title,
            entry.results.percentage,
            entry.results.completed_at.to_rfc3339(),
            payload
        ],
    )?;
    let trimmed = trim_history(conn, limit)?;
    debug!(
        "[History DB] Saved entry {} (trimmed {} old rows)",
        entry.id, trimmed
    );
    Ok(())
}

pub fn trim_history(conn: &Connection, limit: usize) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM quiz_history WHERE id NOT IN (SELECT id FROM quiz_history ORDER BY id DESC LIMIT ?)",
        [limit as i64],
    )?;
    Ok(removed)
}

/// Newest first. Rows whose payload no longer parses are skipped.
pub fn load_history(conn: &Connection, limit: usize) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare("SELECT id, payload FROM quiz_history ORDER BY id DESC LIMIT ?")?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut entries = Vec::with_capacity(rows.len());
    for (id, payload) in rows {
        match serde_json::from_str::<HistoryEntry>(&payload) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("[History DB] Skipping unreadable entry {}: {}", id, e),
        }
    }
    Ok(entries)
}

pub fn clear_history(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM quiz_history", [])?;
    Ok(())
}
