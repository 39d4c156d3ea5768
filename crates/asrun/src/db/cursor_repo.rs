//! Ingest cursor repository for the append-only `file_control` table.
//!
//! Only the newest row (highest id) is ever consulted when resuming, whatever
//! file it was recorded for.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// One cursor snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorRow {
    pub id: i64,
    pub filename: String,
    pub total_lines: u64,
    pub created_at: String,
}

impl CursorRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let total_lines: i64 = row.get("total_lines")?;
        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            total_lines: total_lines.max(0) as u64,
            created_at: row.get("created_at")?,
        })
    }
}

/// Returns the most recent cursor snapshot, if any.
pub fn latest(db: &Database) -> Result<Option<CursorRow>, DatabaseError> {
    db.with_conn(latest_with)
}

pub fn latest_with(conn: &Connection) -> Result<Option<CursorRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM file_control ORDER BY id DESC LIMIT 1",
            [],
            CursorRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Appends a snapshot and returns its id.
pub fn append_with(
    conn: &Connection,
    filename: &str,
    total_lines: u64,
    created_at: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO file_control (filename, total_lines, created_at) VALUES (?1, ?2, ?3)",
        params![filename, total_lines as i64, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Returns every snapshot, oldest first.
pub fn history(db: &Database) -> Result<Vec<CursorRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM file_control ORDER BY id ASC")?;
        let rows = stmt
            .query_map([], CursorRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_on_empty_table() {
        let db = Database::open_in_memory().unwrap();
        assert!(latest(&db).unwrap().is_none());
    }

    #[test]
    fn test_latest_is_newest_row_across_files() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            append_with(conn, "/watch/a.txt", 40, "2026-10-15T06:00:00Z")?;
            append_with(conn, "/watch/b.txt", 12, "2026-10-15T07:00:00Z")?;
            Ok(())
        })
        .unwrap();

        let row = latest(&db).unwrap().unwrap();
        assert_eq!(row.filename, "/watch/b.txt");
        assert_eq!(row.total_lines, 12);
    }

    #[test]
    fn test_history_is_append_only() {
        let db = Database::open_in_memory().unwrap();
        let first = db
            .with_conn(|conn| append_with(conn, "/watch/a.txt", 10, "t1"))
            .unwrap();
        let second = db
            .with_conn(|conn| append_with(conn, "/watch/a.txt", 20, "t2"))
            .unwrap();
        assert!(second > first);

        let rows = history(&db).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_lines, 10);
        assert_eq!(rows[1].total_lines, 20);
    }
}
