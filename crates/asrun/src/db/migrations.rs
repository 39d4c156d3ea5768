//! Schema setup. The applied version lives in SQLite's `user_version`
//! pragma; each script runs once, in order, inside its own transaction.

use rusqlite::Connection;

use super::error::DatabaseError;

/// Schema scripts, index + 1 is the version each one brings the database to.
const SCRIPTS: &[(&str, &str)] = &[
    ("create_media_table", include_str!("sql/001_create_media.sql")),
    (
        "create_file_control_table",
        include_str!("sql/002_create_file_control.sql"),
    ),
];

pub fn schema_version(conn: &Connection) -> Result<u32, DatabaseError> {
    Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?)
}

/// Brings the schema up to the latest version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    let current = schema_version(conn)? as usize;
    if current > SCRIPTS.len() {
        return Err(DatabaseError::Migration {
            version: current as u32,
            reason: format!(
                "database schema is newer than this build (latest known: {})",
                SCRIPTS.len()
            ),
        });
    }

    for (index, (name, sql)) in SCRIPTS.iter().enumerate().skip(current) {
        let version = index as u32 + 1;
        log::info!("Applying schema v{}: {}", version, name);

        // PRAGMA cannot take bound parameters; version is a small integer.
        let batch = format!(
            "BEGIN;\n{}\nPRAGMA user_version = {};\nCOMMIT;",
            sql, version
        );
        if let Err(e) = conn.execute_batch(&batch) {
            let _ = conn.execute_batch("ROLLBACK;");
            return Err(DatabaseError::Migration {
                version,
                reason: e.to_string(),
            });
        }
    }

    Ok(())
}
