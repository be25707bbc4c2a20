//! Statistics Calculator Module
//! KPI aggregates (sum / mean) and the describe summary used by quality checks.

use crate::data::{ColumnMap, DataProcessor};
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics of a numeric column, missing values excluded.
///
/// Every statistic is `None` when there is no data to compute it from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Handles KPI and descriptive statistics.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Non-missing values of a column.
    pub fn values(column: &Column) -> PolarsResult<Vec<f64>> {
        Ok(DataProcessor::numeric_values(column)?
            .into_iter()
            .flatten()
            .collect())
    }

    pub fn sum_values(values: &[f64]) -> f64 {
        values.iter().sum()
    }

    pub fn mean_values(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            None
        } else {
            Some(Self::sum_values(values) / values.len() as f64)
        }
    }

    /// Sum of non-missing values; 0 when there are none.
    pub fn sum(column: &Column) -> PolarsResult<f64> {
        Ok(Self::sum_values(&Self::values(column)?))
    }

    /// Mean of non-missing values; `None` when there are none.
    pub fn mean(column: &Column) -> PolarsResult<Option<f64>> {
        Ok(Self::mean_values(&Self::values(column)?))
    }

    /// Sum of a possibly absent column.
    pub fn column_sum(df: &DataFrame, name: &str) -> PolarsResult<f64> {
        Self::sum(&ColumnMap::new(df).numeric_or_missing(name))
    }

    /// Mean of a possibly absent column.
    pub fn column_mean(df: &DataFrame, name: &str) -> PolarsResult<Option<f64>> {
        Self::mean(&ColumnMap::new(df).numeric_or_missing(name))
    }

    pub fn describe(column: &Column) -> PolarsResult<Describe> {
        let values = Self::values(column)?;
        let mut describe = Self::describe_values(&values);
        describe.missing = column.len() - values.len();
        Ok(describe)
    }

    pub fn column_describe(df: &DataFrame, name: &str) -> PolarsResult<Describe> {
        Self::describe(&ColumnMap::new(df).numeric_or_missing(name))
    }

    /// Compute descriptive statistics for an array of values.
    pub fn describe_values(values: &[f64]) -> Describe {
        let n = values.len();
        if n == 0 {
            return Describe::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        // Sample standard deviation, undefined for a single value.
        let std = Statistics::std_dev(values);

        Describe {
            count: n,
            missing: 0,
            mean: Self::mean_values(values),
            std: (!std.is_nan()).then_some(std),
            min: Some(Statistics::min(values)),
            p25: Some(Self::percentile(&sorted, 25.0)),
            p50: Some(Self::percentile(&sorted, 50.0)),
            p75: Some(Self::percentile(&sorted, 75.0)),
            max: Some(Statistics::max(values)),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }
}
