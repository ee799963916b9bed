/// Database module: a SQLite-backed key-value store and its migrations.
mod migrations;
mod storage;

use rusqlite::Connection;

use crate::error::Result;

pub use storage::{Batch, load, save};

/// Opens (or creates) the SQLite database and runs migrations.
pub fn init(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    migrations::run_migrations(&conn)?;
    tracing::debug!("opened store at {db_path}");
    Ok(conn)
}

/// Returns the default database path inside the user's data directory.
/// Falls back to `./mydream.db` when no data dir is found.
pub fn default_db_path() -> String {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join("mydream");
        std::fs::create_dir_all(&app_dir).ok();
        app_dir.join("mydream.db").to_string_lossy().into_owned()
    } else {
        "mydream.db".to_string()
    }
}
