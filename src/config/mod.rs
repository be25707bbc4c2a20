//! Config module - dashboard settings

pub mod settings;

pub use settings::{parse_interval_args, ConfigError, DashboardSettings, OutputFormat};
