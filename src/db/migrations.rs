/// Database migrations and schema management.
use rusqlite::Connection;

use crate::error::Result;

/// Creates the key-value table if it doesn't exist yet.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS storage (
            key         TEXT    PRIMARY KEY NOT NULL,
            value       TEXT    NOT NULL
        );
        ",
    )?;
    Ok(())
}
