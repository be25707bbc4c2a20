//! Data Processor Module
//! Handles type coercion (date / numeric) and per-dataset normalization.

use super::percent::{PercentNormalizer, PercentReport};
use super::schema::{ColumnMap, DatasetSchema, PercentRule};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the epoch of Polars `Date`.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Outcome of normalizing the percent column of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentDiagnostic {
    pub dataset: String,
    pub target_column: String,
    /// Column the values came from; `None` when neither candidate existed.
    pub source_column: Option<String>,
    pub report: PercentReport,
}

/// Handles data cleaning and type normalization.
pub struct DataProcessor;

impl DataProcessor {
    /// Parse a single cell as a number. Blank, non-numeric and NaN become `None`.
    pub fn parse_number(raw: &str) -> Option<f64> {
        raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
    }

    /// Parse a single cell as a calendar date.
    ///
    /// Datetimes are truncated to their date; `YYYY-MM` means the first of the month.
    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|dt| dt.date())
            })
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
            .or_else(|| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok())
    }

    pub fn date_to_days(date: NaiveDate) -> i32 {
        date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
    }

    pub fn days_to_date(days: i32) -> Option<NaiveDate> {
        NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
    }

    pub fn is_numeric_dtype(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Float32
                | DataType::Float64
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }

    /// Read a column as optional floats. Text is parsed cell by cell, numeric
    /// types are widened, nested types are an error; anything else goes
    /// through its text form.
    pub fn numeric_values(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
        let values = match column.dtype() {
            DataType::String => column
                .str()?
                .into_iter()
                .map(|v| v.and_then(Self::parse_number))
                .collect(),
            dtype if Self::is_numeric_dtype(dtype) => {
                let floats = column.cast(&DataType::Float64)?;
                floats
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect()
            }
            dtype if dtype.is_nested() => {
                return Err(PolarsError::InvalidOperation(
                    format!(
                        "column '{}' of type {dtype} cannot be read as numbers",
                        column.name()
                    )
                    .into(),
                ));
            }
            _ => {
                let text = column.cast(&DataType::String)?;
                text.str()?
                    .into_iter()
                    .map(|v| v.and_then(Self::parse_number))
                    .collect()
            }
        };
        Ok(values)
    }

    /// Read a column as optional calendar dates.
    pub fn date_values(column: &Column) -> PolarsResult<Vec<Option<NaiveDate>>> {
        if column.dtype() == &DataType::Date {
            let days = column.cast(&DataType::Int32)?;
            return Ok(days
                .i32()?
                .into_iter()
                .map(|d| d.and_then(Self::days_to_date))
                .collect());
        }

        let text = column.cast(&DataType::String)?;
        Ok(text
            .str()?
            .into_iter()
            .map(|v| v.and_then(Self::parse_date))
            .collect())
    }

    /// Read a column as optional strings, whatever its type.
    pub fn text_values(column: &Column) -> PolarsResult<Vec<Option<String>>> {
        if column.dtype() == &DataType::Date {
            return Ok(Self::date_values(column)?
                .into_iter()
                .map(|d| d.map(|d| d.to_string()))
                .collect());
        }

        let text = column.cast(&DataType::String)?;
        Ok(text
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Convert a column to `Float64`, unparseable values become null.
    pub fn to_numeric(column: &Column) -> Result<Column, ProcessorError> {
        let values = Self::numeric_values(column)?;
        Ok(Column::new(column.name().clone(), values))
    }

    /// Convert a column to `Date`, unparseable values become null.
    pub fn to_date(column: &Column) -> Result<Column, ProcessorError> {
        if column.dtype() == &DataType::Date {
            return Ok(column.clone());
        }

        let days: Vec<Option<i32>> = Self::date_values(column)?
            .into_iter()
            .map(|d| d.map(Self::date_to_days))
            .collect();

        Ok(Column::new(column.name().clone(), days).cast(&DataType::Date)?)
    }

    /// Coerce `column` to dates. A frame without that column is returned as is.
    pub fn coerce_date(df: &DataFrame, column: &str) -> Result<DataFrame, ProcessorError> {
        let Some(source) = ColumnMap::new(df).get(column) else {
            return Ok(df.clone());
        };

        let parsed = Self::to_date(source)?;
        Self::log_coercion_losses(source, &parsed);

        let mut out = df.clone();
        out.with_column(parsed)?;
        Ok(out)
    }

    /// Coerce each present column in `columns` to `Float64`; absent names are skipped.
    pub fn coerce_numeric(df: &DataFrame, columns: &[&str]) -> Result<DataFrame, ProcessorError> {
        let mut out = df.clone();

        for name in ColumnMap::new(df).present(columns) {
            let source = out.column(name)?;
            let parsed = Self::to_numeric(source)?;
            Self::log_coercion_losses(source, &parsed);
            out.with_column(parsed)?;
        }

        Ok(out)
    }

    fn log_coercion_losses(source: &Column, parsed: &Column) {
        let lost = parsed.null_count().saturating_sub(source.null_count());
        if lost > 0 {
            debug!(
                column = source.name().as_str(),
                values = lost,
                "Unparseable values coerced to missing"
            );
        }
    }

    /// Apply a percent fallback rule, always leaving `rule.target` on the frame.
    pub fn apply_percent_rule(
        df: &DataFrame,
        dataset: &str,
        rule: &PercentRule,
    ) -> Result<(DataFrame, PercentDiagnostic), ProcessorError> {
        let columns = ColumnMap::new(df);
        let source = rule.source(&columns);

        let (values, report) = match source.and_then(|name| columns.get(name)) {
            Some(column) => {
                let values = Self::numeric_values(column)?;
                PercentNormalizer::fix_values(&values)
            }
            None => {
                warn!(
                    dataset,
                    column = rule.target,
                    "No percent source column, filling with missing values"
                );
                let values = vec![None; df.height()];
                let report = PercentReport::unchanged(&values);
                (values, report)
            }
        };

        if report.discarded > 0 {
            warn!(
                dataset,
                column = rule.target,
                discarded = report.discarded,
                "Out-of-range percent values set to missing"
            );
        }

        let mut out = df.clone();
        out.with_column(Column::new(rule.target.into(), values))?;

        let diagnostic = PercentDiagnostic {
            dataset: dataset.to_string(),
            target_column: rule.target.to_string(),
            source_column: source.map(str::to_string),
            report,
        };
        Ok((out, diagnostic))
    }

    /// Run the date, numeric and percent normalization a dataset's schema asks for.
    pub fn normalize(
        df: &DataFrame,
        schema: &DatasetSchema,
    ) -> Result<(DataFrame, Option<PercentDiagnostic>), ProcessorError> {
        let mut out = match schema.date_column {
            Some(date_column) => Self::coerce_date(df, date_column)?,
            None => df.clone(),
        };
        out = Self::coerce_numeric(&out, schema.numeric_columns)?;

        match &schema.percent {
            Some(rule) => {
                let (out, diagnostic) = Self::apply_percent_rule(&out, schema.name, rule)?;
                Ok((out, Some(diagnostic)))
            }
            None => Ok((out, None)),
        }
    }
}
