/// Local persistence: a key/value table holding the schedule and labels as JSON.
mod migrations;
mod store;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;

pub use store::{last_saved, load_labels, load_schedule, save_labels, save_schedule, save_state};

/// Opens (or creates) the SQLite database and runs migrations.
pub fn init(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory at {}", parent.display())
        })?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    migrations::run_migrations(&conn)?;
    info!("Opened database at {}", db_path.display());
    Ok(conn)
}

/// Returns the default database path inside the user's data directory.
pub fn default_db_path() -> PathBuf {
    crate::config::app_data_dir().join("parkday.db")
}

#[cfg(test)]
pub(crate) fn open_in_memory() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory database");
    migrations::run_migrations(&conn).expect("migrations");
    conn
}
