//! SQLite-backed topic index.

use std::path::Path;

use rusqlite::{Connection, Transaction, params};

use crate::error::ArchiveError;

/// One stored (date, title) occurrence of a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    pub date: String,
    pub title: String,
}

/// Handle over the durable store. Constructed once per run and passed down
/// by reference; nothing in this crate holds a global connection.
pub struct HotIndex {
    conn: Connection,
}

impl HotIndex {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, ArchiveError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Idempotent schema setup. The table carries no uniqueness constraint;
    /// recency-window dedup is enforced by the archival pass instead.
    pub fn ensure_schema(&self) -> Result<(), ArchiveError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS hot (date TEXT, title TEXT, summary TEXT);",
        )?;
        Ok(())
    }

    pub fn transaction(&mut self) -> Result<Transaction<'_>, ArchiveError> {
        Ok(self.conn.transaction()?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Every stored sighting of exactly `title`, in storage order.
pub fn find_by_title(conn: &Connection, title: &str) -> Result<Vec<Sighting>, ArchiveError> {
    let mut stmt = conn.prepare_cached("SELECT date, title FROM hot WHERE title = ?1")?;
    let rows = stmt.query_map(params![title], |row| {
        Ok(Sighting {
            date: row.get(0)?,
            title: row.get(1)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn insert_sighting(
    conn: &Connection,
    date: &str,
    title: &str,
    summary: &str,
) -> Result<(), ArchiveError> {
    let mut stmt =
        conn.prepare_cached("INSERT INTO hot (date, title, summary) VALUES (?1, ?2, ?3)")?;
    stmt.execute(params![date, title, summary])?;
    Ok(())
}

pub fn count_rows(conn: &Connection) -> Result<i64, ArchiveError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM hot", [], |row| row.get(0))?)
}
