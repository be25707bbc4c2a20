//! Date Filter Module
//! Restricts time-indexed datasets to an inclusive date interval.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use super::processor::{DataProcessor, ProcessorError};
use super::schema::ColumnMap;

/// Inclusive `[start, end]`; either side may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateInterval {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateInterval {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// Both bounds set, so filtering actually applies.
    pub fn is_bounded(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => true,
        }
    }
}

/// Keep rows whose `column` date lies within `[start, end]`, both inclusive.
///
/// The frame is returned unchanged when `column` is absent or either bound is
/// unset. Rows with a missing date never match.
pub fn filter_by_date(
    df: &DataFrame,
    column: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DataFrame, ProcessorError> {
    filter_by_interval(df, column, &DateInterval::new(start, end))
}

pub fn filter_by_interval(
    df: &DataFrame,
    column: &str,
    interval: &DateInterval,
) -> Result<DataFrame, ProcessorError> {
    let Some(source) = ColumnMap::new(df).get(column) else {
        return Ok(df.clone());
    };
    if !interval.is_bounded() {
        return Ok(df.clone());
    }

    let mask: BooleanChunked = DataProcessor::date_values(source)?
        .into_iter()
        .map(|date| date.is_some_and(|d| interval.contains(d)))
        .collect();

    Ok(df.filter(&mask)?)
}

/// Earliest and latest non-missing date of `column`; unset when there are none.
pub fn date_bounds(df: &DataFrame, column: &str) -> Result<DateInterval, ProcessorError> {
    let Some(source) = ColumnMap::new(df).get(column) else {
        return Ok(DateInterval::default());
    };

    let dates = DataProcessor::date_values(source)?;
    let present = dates.iter().flatten();
    Ok(DateInterval::new(
        present.clone().min().copied(),
        present.max().copied(),
    ))
}
