/// Schedule and label persistence.
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::debug;
use rusqlite::{Connection, OptionalExtension};

use crate::types::{Labels, Schedule};

const SCHEDULE_KEY: &str = "schedule";
const LABELS_KEY: &str = "labels";

/// Loads the stored schedule, or an empty one on a fresh database.
pub fn load_schedule(conn: &Connection) -> Result<Schedule> {
    match get_item(SCHEDULE_KEY, conn)? {
        Some(raw) => serde_json::from_str(&raw).context("Stored schedule is invalid"),
        None => Ok(Schedule::default()),
    }
}

/// Loads the stored labels. A database that never saved labels gets `defaults`.
pub fn load_labels(conn: &Connection, defaults: &[String]) -> Result<Labels> {
    match get_item(LABELS_KEY, conn)? {
        Some(raw) => serde_json::from_str(&raw).context("Stored labels are invalid"),
        None => Labels::try_from(defaults.to_vec()).context("Default labels are invalid"),
    }
}

pub fn save_schedule(schedule: &Schedule, conn: &Connection) -> Result<()> {
    set_item(SCHEDULE_KEY, &serde_json::to_string(schedule)?, conn)?;
    debug!("Saved schedule with {} event(s)", schedule.len());
    Ok(())
}

pub fn save_labels(labels: &Labels, conn: &Connection) -> Result<()> {
    set_item(LABELS_KEY, &serde_json::to_string(labels)?, conn)?;
    debug!("Saved {} label(s)", labels.len());
    Ok(())
}

/// Writes schedule and labels in one transaction, so neither is stored without the other.
pub fn save_state(schedule: &Schedule, labels: &Labels, conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    save_schedule(schedule, &tx)?;
    save_labels(labels, &tx)?;
    tx.commit()?;
    Ok(())
}

/// Time of the most recent write of any key.
pub fn last_saved(conn: &Connection) -> Result<Option<DateTime<Local>>> {
    let raw: Option<String> = conn.query_row(
        "SELECT MAX(updated_at) FROM storage",
        [],
        |row| row.get(0),
    )?;
    Ok(raw.and_then(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|dt| dt.with_timezone(&Local))
    }))
}

fn get_item(key: &str, conn: &Connection) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

fn set_item(key: &str, value: &str, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO storage (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, value, Local::now().to_rfc3339()),
    )?;
    Ok(())
}
