//! Percent Normalizer Module
//! Detects fraction-encoded (0-1) percent columns, rescales them to 0-100 and
//! drops values that are still out of range.

use super::processor::{DataProcessor, ProcessorError};
use polars::prelude::*;
use serde::Serialize;

/// A column is treated as fraction-encoded when strictly more than this share
/// of its non-missing values lies in [`FRACTION_MIN`, `FRACTION_MAX`].
pub const FRACTION_RATIO_THRESHOLD: f64 = 0.7;
pub const FRACTION_MIN: f64 = 0.0;
pub const FRACTION_MAX: f64 = 1.0;
pub const FRACTION_SCALE: f64 = 100.0;
pub const PERCENT_MIN: f64 = 0.0;
pub const PERCENT_MAX: f64 = 100.0;

/// What the heuristic did to a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentReport {
    pub non_missing: usize,
    /// Share of non-missing values in the fraction range; `None` for an all-missing column.
    pub frac_ratio: Option<f64>,
    pub rescaled: bool,
    /// Values present before the range check and missing after it.
    pub discarded: usize,
}

impl PercentReport {
    /// Report for a column passed through without any change.
    pub fn unchanged(values: &[Option<f64>]) -> Self {
        Self {
            non_missing: values.iter().flatten().count(),
            frac_ratio: None,
            rescaled: false,
            discarded: 0,
        }
    }
}

pub struct PercentNormalizer;

impl PercentNormalizer {
    pub fn is_fraction(value: f64) -> bool {
        (FRACTION_MIN..=FRACTION_MAX).contains(&value)
    }

    pub fn is_percent(value: f64) -> bool {
        (PERCENT_MIN..=PERCENT_MAX).contains(&value)
    }

    /// Share of non-missing values that look like fractions.
    pub fn frac_ratio(values: &[Option<f64>]) -> Option<f64> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return None;
        }
        let fractions = present.iter().filter(|v| Self::is_fraction(**v)).count();
        Some(fractions as f64 / present.len() as f64)
    }

    /// Rescale and range-check a sequence of optional values.
    pub fn fix_values(values: &[Option<f64>]) -> (Vec<Option<f64>>, PercentReport) {
        let Some(frac_ratio) = Self::frac_ratio(values) else {
            return (values.to_vec(), PercentReport::unchanged(values));
        };

        let rescaled = frac_ratio > FRACTION_RATIO_THRESHOLD;
        let scale = if rescaled { FRACTION_SCALE } else { 1.0 };

        let fixed: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.map(|v| v * scale).filter(|v| Self::is_percent(*v)))
            .collect();

        let non_missing = values.iter().flatten().count();
        let discarded = non_missing - fixed.iter().flatten().count();

        let report = PercentReport {
            non_missing,
            frac_ratio: Some(frac_ratio),
            rescaled,
            discarded,
        };
        (fixed, report)
    }

    /// Normalize a percent column to the 0-100 scale, keeping its name.
    pub fn fix_percent(column: &Column) -> Result<Column, ProcessorError> {
        Self::fix_percent_with_report(column).map(|(column, _)| column)
    }

    pub fn fix_percent_with_report(
        column: &Column,
    ) -> Result<(Column, PercentReport), ProcessorError> {
        let values = DataProcessor::numeric_values(column)?;
        let (fixed, report) = Self::fix_values(&values);
        Ok((Column::new(column.name().clone(), fixed), report))
    }
}
