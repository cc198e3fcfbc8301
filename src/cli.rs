/// CLI argument parsing and command handling.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::schedule::remove_label;
use crate::slot::{duration_to_slots, slots_to_minutes, time_to_index};
use crate::types::{Event, EventPatch, Labels, Schedule};
use crate::{db, legacy};

#[derive(Parser)]
#[command(
    name = "parkday",
    version,
    about = "Parkday - plan a day at the amusement park"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Place a new event, e.g. `parkday add Lunch 12:00 30`
    Add {
        title: String,
        /// Start time, HH:MM
        start: String,
        /// Duration in minutes
        duration: u32,
    },
    /// Change an event's title, start or duration
    Edit {
        /// Event id or a unique prefix of it
        id: String,
        #[arg(short = 't', long = "title")]
        title: Option<String>,
        #[arg(short = 's', long = "start")]
        start: Option<String>,
        /// New duration in minutes
        #[arg(short = 'd', long = "duration")]
        duration: Option<u32>,
    },
    /// Remove an event
    Delete { id: String },
    /// Print the day in timeline order
    List,
    Label {
        #[command(subcommand)]
        command: LabelCommand,
    },
    /// Write schedule and labels as JSON, to stdout when no path is given
    Export { path: Option<PathBuf> },
    /// Replace schedule and labels from an export or a legacy 36-row array
    Import { path: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    Add { name: String },
    /// Remove a label and every event using it
    Remove { name: String },
    List,
}

/// Schedule and labels as written by `export`.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Snapshot {
    schedule: Schedule,
    labels: Labels,
}

/// Execute a CLI command against the stored schedule.
pub fn run(command: Command, conn: &Connection, config: &Config) -> Result<()> {
    let schedule = db::load_schedule(conn)?;
    let labels = db::load_labels(conn, &config.default_labels)?;

    match command {
        Command::Add {
            title,
            start,
            duration,
        } => handle_add(&schedule, &title, &start, duration, conn)?,
        Command::Edit {
            id,
            title,
            start,
            duration,
        } => handle_edit(&schedule, &id, title, start, duration, conn)?,
        Command::Delete { id } => handle_delete(&schedule, &id, conn)?,
        Command::List => print!("{}", render_list(&schedule)),
        Command::Label {
            command: LabelCommand::Add { name },
        } => {
            let labels = labels.add_label(&name)?;
            db::save_labels(&labels, conn)?;
            println!("Added label '{}'", name.trim());
        }
        Command::Label {
            command: LabelCommand::Remove { name },
        } => {
            let removed_events = schedule.count_titled(&name);
            let (schedule, labels) = remove_label(&schedule, &labels, &name)?;
            db::save_state(&schedule, &labels, conn)?;
            println!("Removed label '{name}' and {removed_events} event(s)");
        }
        Command::Label {
            command: LabelCommand::List,
        } => {
            for label in labels.iter() {
                println!("{label}  ({} event(s))", schedule.count_titled(label));
            }
        }
        Command::Export { path } => handle_export(schedule, labels, path.as_deref())?,
        Command::Import { path } => handle_import(&path, conn)?,
    }
    Ok(())
}

fn handle_add(
    schedule: &Schedule,
    title: &str,
    start: &str,
    duration: u32,
    conn: &Connection,
) -> Result<()> {
    let schedule = schedule.add_event(title, time_to_index(start)?, duration)?;
    db::save_schedule(&schedule, conn)?;
    if let Some(event) = schedule.events().last() {
        info!("Added '{}' via CLI", event.title());
        println!("Added {}", describe(event));
    }
    Ok(())
}

fn handle_edit(
    schedule: &Schedule,
    id: &str,
    title: Option<String>,
    start: Option<String>,
    duration: Option<u32>,
    conn: &Connection,
) -> Result<()> {
    let event = schedule.find_by_prefix(id)?;
    let patch = build_patch(event, title, start.as_deref(), duration)?;
    let id = event.id();
    let schedule = schedule.edit_event(id, patch)?;
    db::save_schedule(&schedule, conn)?;
    if let Some(event) = schedule.get(id) {
        println!("Updated {}", describe(event));
    }
    Ok(())
}

/// Moving the start keeps the duration unless a new one is given.
fn build_patch(
    event: &Event,
    title: Option<String>,
    start: Option<&str>,
    duration: Option<u32>,
) -> Result<EventPatch> {
    let start = start.map(time_to_index).transpose()?;
    let end = match (start, duration) {
        (None, None) => None,
        (start, duration) => {
            let from = start.unwrap_or(event.start());
            let slots = match duration {
                Some(minutes) => duration_to_slots(minutes)?,
                None => event.duration_slots(),
            };
            Some(from.forward(slots).context("Event would run past the end of the day")?)
        }
    };
    Ok(EventPatch { title, start, end })
}

fn handle_delete(schedule: &Schedule, id: &str, conn: &Connection) -> Result<()> {
    let event = schedule.find_by_prefix(id)?;
    let description = describe(event);
    let schedule = schedule.delete_event(event.id())?;
    db::save_schedule(&schedule, conn)?;
    println!("Deleted {description}");
    Ok(())
}

fn handle_export(schedule: Schedule, labels: Labels, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&Snapshot { schedule, labels })?;
    match path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn handle_import(path: &Path, conn: &Connection) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let Snapshot { schedule, labels } = parse_import(&contents)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    db::save_state(&schedule, &labels, conn)?;
    info!("Imported {} event(s) from {}", schedule.len(), path.display());
    println!(
        "Imported {} event(s) and {} label(s)",
        schedule.len(),
        labels.len()
    );
    Ok(())
}

fn parse_import(contents: &str) -> Result<Snapshot> {
    let value: serde_json::Value =
        serde_json::from_str(contents).context("Import is not valid JSON")?;
    match value {
        serde_json::Value::Object(_) => {
            serde_json::from_value(value).context("Invalid parkday export")
        }
        serde_json::Value::Array(_) => {
            let texts: Vec<String> = serde_json::from_value(value)
                .context("Expected an array of 36 row texts")?;
            let (schedule, labels) = legacy::from_slot_texts(&texts)?;
            Ok(Snapshot { schedule, labels })
        }
        _ => anyhow::bail!("Expected a parkday export or an array of 36 row texts"),
    }
}

fn render_list(schedule: &Schedule) -> String {
    if schedule.is_empty() {
        return "Nothing planned yet.\n".to_string();
    }
    let mut out = String::new();
    for event in schedule.chronological() {
        out.push_str(&describe(event));
        out.push('\n');
    }
    out
}

fn describe(event: &Event) -> String {
    let short_id = event.id().to_string();
    format!(
        "{}-{}  {:<24} {:>4}m  ({})",
        event.start(),
        event.end(),
        event.title(),
        slots_to_minutes(event.duration_slots()),
        &short_id[..8]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::slot::parse_boundary;

    fn cli_config() -> Config {
        Config {
            default_labels: vec!["Lunch".to_string(), "Parade".to_string()],
            ..Config::default()
        }
    }

    #[test]
    fn parses_add_command() {
        let cli = Cli::try_parse_from(["parkday", "add", "Lunch", "12:00", "30"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Add { ref title, duration: 30, .. }) if title == "Lunch"
        ));
    }

    #[test]
    fn add_edit_delete_through_store() {
        let conn = open_in_memory();
        let config = cli_config();
        run(
            Command::Add {
                title: "Lunch".to_string(),
                start: "12:00".to_string(),
                duration: 30,
            },
            &conn,
            &config,
        )
        .unwrap();
        let schedule = db::load_schedule(&conn).unwrap();
        let id = schedule.events()[0].id().to_string();

        run(
            Command::Edit {
                id: id[..8].to_string(),
                title: None,
                start: Some("13:00".to_string()),
                duration: None,
            },
            &conn,
            &config,
        )
        .unwrap();
        let event = db::load_schedule(&conn).unwrap().events()[0].clone();
        assert_eq!(event.start().to_string(), "13:00");
        assert_eq!(event.end().to_string(), "13:30");

        run(Command::Delete { id }, &conn, &config).unwrap();
        assert!(db::load_schedule(&conn).unwrap().is_empty());
    }

    #[test]
    fn overlapping_add_is_an_error_and_not_saved() {
        let conn = open_in_memory();
        let config = cli_config();
        let add = |start: &str| Command::Add {
            title: "Photo".to_string(),
            start: start.to_string(),
            duration: 15,
        };
        run(add("12:00"), &conn, &config).unwrap();
        assert!(run(add("12:10"), &conn, &config).is_err());
        run(add("12:15"), &conn, &config).unwrap();
        assert_eq!(db::load_schedule(&conn).unwrap().len(), 2);
    }

    #[test]
    fn removing_label_removes_its_events() {
        let conn = open_in_memory();
        let config = cli_config();
        run(
            Command::Add {
                title: "Lunch".to_string(),
                start: "12:00".to_string(),
                duration: 30,
            },
            &conn,
            &config,
        )
        .unwrap();
        run(
            Command::Label {
                command: LabelCommand::Remove {
                    name: "Lunch".to_string(),
                },
            },
            &conn,
            &config,
        )
        .unwrap();
        assert!(db::load_schedule(&conn).unwrap().is_empty());
        let labels = db::load_labels(&conn, &config.default_labels).unwrap();
        assert_eq!(labels.as_slice(), ["Parade"]);
    }

    #[test]
    fn build_patch_keeps_duration_when_moving() {
        let schedule = Schedule::default()
            .add_event("Show", time_to_index("14:00").unwrap(), 45)
            .unwrap();
        let event = &schedule.events()[0];
        let patch = build_patch(event, None, Some("15:00"), None).unwrap();
        assert_eq!(patch.end, Some(parse_boundary("15:45").unwrap()));
        let patch = build_patch(event, None, None, Some(15)).unwrap();
        assert_eq!(patch.start, None);
        assert_eq!(patch.end, Some(parse_boundary("14:15").unwrap()));
        let patch = build_patch(event, Some("Parade".to_string()), None, None).unwrap();
        assert_eq!(patch.end, None);
        assert!(build_patch(event, None, Some("17:30"), None).is_err());
    }

    #[test]
    fn import_accepts_export_and_legacy_rows() {
        let schedule = Schedule::default()
            .add_event("Show", time_to_index("14:00").unwrap(), 45)
            .unwrap();
        let labels = Labels::default().add_label("Show").unwrap();
        let snapshot = Snapshot { schedule, labels };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(parse_import(&json).unwrap(), snapshot);

        let mut rows = vec![String::new(); legacy::LEGACY_ROW_COUNT];
        rows[0] = "Parade".to_string();
        let legacy = parse_import(&serde_json::to_string(&rows).unwrap()).unwrap();
        assert_eq!(legacy.schedule.len(), 1);
        assert_eq!(legacy.labels.as_slice(), ["Parade"]);

        assert!(parse_import("{\"nope\": 1}").is_err());
    }

    #[test]
    fn import_reports_why_an_export_is_rejected() {
        let lunch = r#"{"id":"6f1c2a52-8d7e-4b43-9a51-0c3e1d9b7a10","title":"Lunch","start":"12:00","end":"12:30"}"#;
        let photo = r#"{"id":"0b7e4c1d-2f3a-4e5b-8c6d-7e8f9a0b1c2d","title":"Photo","start":"12:15","end":"12:45"}"#;
        let json = format!(r#"{{"schedule":[{lunch},{photo}],"labels":[]}}"#);
        let err = format!("{:#}", parse_import(&json).unwrap_err());
        assert!(err.contains("Overlaps with"), "{err}");
        assert!(!err.contains("row texts"), "{err}");

        let err = format!("{:#}", parse_import("[1, 2]").unwrap_err());
        assert!(err.contains("36"), "{err}");
        assert!(parse_import("42").is_err());
        assert!(parse_import("not json").is_err());
    }

    #[test]
    fn list_is_chronological() {
        let schedule = Schedule::default()
            .add_event("Show", time_to_index("14:00").unwrap(), 45)
            .unwrap()
            .add_event("Parade", time_to_index("10:00").unwrap(), 30)
            .unwrap();
        let listing = render_list(&schedule);
        let lines = listing.lines().collect::<Vec<_>>();
        assert!(lines[0].starts_with("10:00-10:30  Parade"));
        assert!(lines[1].starts_with("14:00-14:45  Show"));
        assert_eq!(render_list(&Schedule::default()), "Nothing planned yet.\n");
    }
}
