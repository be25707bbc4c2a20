//! Ecom Dashboard - prints the business dashboard for the processed datasets.
//!
//! Usage: `ecom-dashboard [START] [END]` with dates as `YYYY-MM-DD`.

use anyhow::Context;
use ecom_dashboard::config::{parse_interval_args, OutputFormat};
use ecom_dashboard::report::{render_json, render_text};
use ecom_dashboard::{DashboardData, DashboardSettings, DataLoader, DatasetCache};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs on stderr, report on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Ecom Dashboard...");

    let settings = DashboardSettings::load().context("Failed to load dashboard settings")?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let requested = parse_interval_args(&args)?;

    let loader = DataLoader::new(settings.data_dir.clone(), Arc::new(DatasetCache::new()));
    info!(data_dir = %loader.base_dir().display(), "Loading datasets");
    let data = DashboardData::load(&loader)
        .with_context(|| format!("Failed to load datasets from {}", loader.base_dir().display()))?;

    let view = data.view(requested, &settings)?;
    match settings.output {
        OutputFormat::Text => print!("{}", render_text(&view)),
        OutputFormat::Json => println!("{}", render_json(&view)?),
    }

    Ok(())
}
