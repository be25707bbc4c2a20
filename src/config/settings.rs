//! Settings Module
//! Dashboard settings, loaded from an optional JSON file plus environment overrides.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::DateInterval;

pub const DEFAULT_DATA_DIR: &str = "data/processed";
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";
pub const CONFIG_PATH_ENV: &str = "ECOM_DASHBOARD_CONFIG";
pub const DATA_DIR_ENV: &str = "ECOM_DASHBOARD_DATA_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid date '{value}', expected YYYY-MM-DD: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Expected at most two dates (start, end), got {0}")]
    TooManyDates(usize),
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardSettings {
    pub data_dir: PathBuf,
    pub output: OutputFormat,
    pub top_categories: usize,
    pub top_brands: usize,
    pub top_rfm: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output: OutputFormat::Text,
            top_categories: 10,
            top_brands: 10,
            top_rfm: 15,
        }
    }
}

impl DashboardSettings {
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Settings for this process: the file named by `ECOM_DASHBOARD_CONFIG`
    /// (must exist), else `dashboard.json` if present, else defaults; then
    /// `ECOM_DASHBOARD_DATA_DIR` overrides the data directory.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        Ok(settings.with_data_dir(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from)))
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        self
    }
}

/// Parse `[START] [END]` positional arguments into a requested interval.
pub fn parse_interval_args<S: AsRef<str>>(args: &[S]) -> Result<DateInterval, ConfigError> {
    if args.len() > 2 {
        return Err(ConfigError::TooManyDates(args.len()));
    }

    let parse = |value: &S| {
        NaiveDate::parse_from_str(value.as_ref(), "%Y-%m-%d").map_err(|source| {
            ConfigError::InvalidDate {
                value: value.as_ref().to_string(),
                source,
            }
        })
    };

    Ok(DateInterval::new(
        args.first().map(parse).transpose()?,
        args.get(1).map(parse).transpose()?,
    ))
}
