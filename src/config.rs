/// User configuration loaded from `config.toml`.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

const DEFAULT_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file, defaults to the user's data directory
    pub db_path: Option<String>,

    /// Labels offered on a fresh database
    pub default_labels: Vec<String>,

    /// Duration preselected for new events, in minutes
    pub default_duration: u32,

    /// Log file, defaults to `parkday.log` next to the database
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            default_labels: vec![
                "Parade".to_string(),
                "Show".to_string(),
                "Attraction".to_string(),
                "Greeting".to_string(),
                "Lunch".to_string(),
                "Shopping".to_string(),
            ],
            default_duration: DEFAULT_DURATION_MINUTES,
            log_file: None,
        }
    }
}

impl Config {
    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => expand_path(path),
            None => crate::db::default_db_path(),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        match &self.log_file {
            Some(path) => expand_path(path),
            None => app_data_dir().join("parkday.log"),
        }
    }
}

/// Get the config file path (~/.config/parkday/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("parkday");
    Ok(config_dir.join("config.toml"))
}

/// Loads the config file, falling back to defaults when it does not exist.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config = parse_config(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents)?;
    crate::slot::duration_to_slots(config.default_duration)
        .context("Invalid default_duration")?;
    Ok(config)
}

/// Directory holding the database and log file.
/// Falls back to the working directory when no data dir is found.
pub fn app_data_dir() -> PathBuf {
    match dirs::data_local_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("parkday");
            std::fs::create_dir_all(&dir).ok();
            dir
        }
        None => PathBuf::from("."),
    }
}

/// Expand ~ in paths to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse_config(
            r#"
            default_labels = ["Coaster", "Parade"]
            db_path = "/tmp/day.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_labels, vec!["Coaster", "Parade"]);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/day.db"));
        assert_eq!(config.default_duration, DEFAULT_DURATION_MINUTES);
    }

    #[test]
    fn rejects_bad_duration_and_bad_types() {
        assert!(parse_config("default_duration = 0").is_err());
        assert!(parse_config("default_duration = 7").is_err());
        assert!(parse_config("default_labels = 3").is_err());
    }

    #[test]
    fn expands_home_prefix() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/plans.db"), home.join("plans.db"));
        }
        assert_eq!(expand_path("plans.db"), PathBuf::from("plans.db"));
    }
}
