//! Media repository: CRUD operations for the `media` table.

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};
use crate::record::MediaStatus;

/// A raw media row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRow {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub duration: String,
    pub reconcile_key: String,
    pub job_id: Option<String>,
    pub status: MediaStatus,
    pub error: Option<String>,
    pub source_file: String,
    pub line_number: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl MediaRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let status: String = row.get("status")?;
        let status = status.parse::<MediaStatus>().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                Box::new(DatabaseError::InvalidValue {
                    column: "status",
                    value: status.clone(),
                }),
            )
        })?;
        let line_number: i64 = row.get("line_number")?;

        Ok(Self {
            id: row.get("id")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            title: row.get("title")?,
            duration: row.get("duration")?,
            reconcile_key: row.get("reconcile_key")?,
            job_id: row.get("job_id")?,
            status,
            error: row.get("error")?,
            source_file: row.get("source_file")?,
            line_number: line_number as u64,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a new media row.
pub fn insert(db: &Database, media: &MediaRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| insert_with(conn, media))
}

/// Inserts a new media row on an existing connection or transaction.
pub fn insert_with(conn: &Connection, media: &MediaRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO media (id, start_time, end_time, title, duration, reconcile_key,
         job_id, status, error, source_file, line_number, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            media.id,
            media.start_time,
            media.end_time,
            media.title,
            media.duration,
            media.reconcile_key,
            media.job_id,
            media.status.as_str(),
            media.error,
            media.source_file,
            media.line_number as i64,
            media.created_at,
            media.updated_at,
        ],
    )?;
    Ok(())
}

/// Finds a media row by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<MediaRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM media WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], MediaRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Returns all rows with the given status, oldest first.
pub fn find_by_status(db: &Database, status: MediaStatus) -> Result<Vec<MediaRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM media WHERE status = ?1 ORDER BY created_at ASC, line_number ASC",
        )?;
        let rows = stmt
            .query_map(params![status.as_str()], MediaRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns every row ingested from `source_file`, in line order.
pub fn find_by_source_file(db: &Database, source_file: &str) -> Result<Vec<MediaRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM media WHERE source_file = ?1 ORDER BY line_number ASC")?;
        let rows = stmt
            .query_map(params![source_file], MediaRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts rows with the given status.
pub fn count_by_status(db: &Database, status: MediaStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM media WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Counts rows per status, including statuses with no rows.
pub fn status_counts(db: &Database) -> Result<Vec<(MediaStatus, u64)>, DatabaseError> {
    MediaStatus::ALL
        .iter()
        .map(|status| Ok((*status, count_by_status(db, *status)?)))
        .collect()
}

/// Moves a `PENDING` row to a terminal status.
///
/// The update only applies while the row is still `PENDING`, so a record that
/// already reached a terminal state is never rewritten. Returns whether a row
/// changed.
pub fn resolve_pending(
    db: &Database,
    id: &str,
    status: MediaStatus,
    error: Option<&str>,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    if !MediaStatus::Pending.can_transition_to(status) {
        return Err(DatabaseError::InvalidValue {
            column: "status",
            value: status.to_string(),
        });
    }

    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE media SET status = ?2, error = ?3, updated_at = ?4
             WHERE id = ?1 AND status = ?5",
            params![
                id,
                status.as_str(),
                error,
                updated_at,
                MediaStatus::Pending.as_str()
            ],
        )?;
        Ok(changed == 1)
    })
}
