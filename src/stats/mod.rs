//! Stats module - KPI aggregates and descriptive statistics

mod calculator;

pub use calculator::{Describe, StatsCalculator};
