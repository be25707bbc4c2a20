//! Ecom Dashboard - loads the processed e-commerce metric tables, normalizes
//! dates and percent columns, filters by month and computes the dashboard KPIs.

pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod report;
pub mod stats;

pub use config::DashboardSettings;
pub use dashboard::{DashboardData, DashboardView, Kpis};
pub use data::{DataLoader, DatasetCache, DateInterval};
pub use error::DashboardError;
