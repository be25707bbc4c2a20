//! Dashboard View Module
//! Presentation-ready series, rankings and tables built from normalized data.

use super::{DashboardData, FilteredData, Kpis, MOM_GROWTH_PCT, RETURN_RATE_PCT, REVENUE};
use crate::config::DashboardSettings;
use crate::data::schema::{self, ColumnMap, ORDER_MONTH};
use crate::data::{DataProcessor, DateInterval, PercentDiagnostic, ProcessorError};
use crate::error::DashboardError;
use crate::stats::{Describe, StatsCalculator};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

/// One point of a monthly line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// One bar of a ranked bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPoint {
    pub label: Option<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityView {
    pub return_rate_pct: Describe,
    pub mom_growth_pct: Describe,
    pub percent_columns: Vec<PercentDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub interval: DateInterval,
    pub kpis: Kpis,
    pub revenue_by_month: Vec<SeriesPoint>,
    pub return_rate_by_month: Vec<SeriesPoint>,
    pub mom_growth: Vec<SeriesPoint>,
    pub segment_revenue: Vec<BarPoint>,
    pub top_categories: TableView,
    pub top_brands: TableView,
    pub top_rfm: TableView,
    pub quality: QualityView,
}

impl DashboardView {
    pub fn build(
        data: &DashboardData,
        filtered: &FilteredData,
        settings: &DashboardSettings,
    ) -> Result<Self, DashboardError> {
        let revenue_by_month = date_series(&filtered.revenue_by_month, REVENUE)
            .map_err(DashboardError::processing(schema::REVENUE_BY_MONTH.name))?;
        let return_rate_by_month = date_series(&filtered.return_by_month, RETURN_RATE_PCT)
            .map_err(DashboardError::processing(schema::RETURN_RATE_BY_MONTH.name))?;
        let mom_growth = date_series(&filtered.mom_growth, MOM_GROWTH_PCT)
            .map_err(DashboardError::processing(schema::MOM_REVENUE_GROWTH.name))?;
        let segment_revenue = ranked_bars(&data.segment_summary, "segment", "total_revenue")
            .map_err(DashboardError::processing(schema::CUSTOMER_SEGMENT_SUMMARY.name))?;

        let top_categories = TopTable {
            title: "Return Rate by Category",
            sort_by: RETURN_RATE_PCT,
            columns: &["product_category", RETURN_RATE_PCT, "total_items"],
            limit: settings.top_categories,
            drop_missing: true,
        }
        .build(&data.return_by_category)
        .map_err(DashboardError::processing(schema::RETURN_RATE_BY_CATEGORY.name))?;

        let top_brands = TopTable {
            title: "Return Rate by Brand",
            sort_by: RETURN_RATE_PCT,
            columns: &["product_brand", RETURN_RATE_PCT, "total_items", REVENUE],
            limit: settings.top_brands,
            drop_missing: true,
        }
        .build(&data.return_by_brand)
        .map_err(DashboardError::processing(schema::RETURN_RATE_BY_BRAND.name))?;

        let top_rfm = TopTable {
            title: "RFM Summary (Top by Revenue)",
            sort_by: "total_revenue",
            columns: &[
                "rfm_code",
                "customers",
                "total_revenue",
                "avg_frequency",
                "avg_recency",
                "avg_return_rate_pct",
            ],
            limit: settings.top_rfm,
            drop_missing: false,
        }
        .build(&data.rfm_summary)
        .map_err(DashboardError::processing(schema::RFM_SUMMARY.name))?;

        let quality = QualityView {
            return_rate_pct: StatsCalculator::column_describe(
                &filtered.return_by_month,
                RETURN_RATE_PCT,
            )
            .map_err(|err| DashboardError::processing(schema::RETURN_RATE_BY_MONTH.name)(err.into()))?,
            mom_growth_pct: StatsCalculator::column_describe(&filtered.mom_growth, MOM_GROWTH_PCT)
                .map_err(|err| {
                    DashboardError::processing(schema::MOM_REVENUE_GROWTH.name)(err.into())
                })?,
            percent_columns: data.percent_diagnostics.clone(),
        };

        Ok(Self {
            interval: filtered.interval,
            kpis: filtered.kpis()?,
            revenue_by_month,
            return_rate_by_month,
            mom_growth,
            segment_revenue,
            top_categories,
            top_brands,
            top_rfm,
            quality,
        })
    }
}

/// Date-sorted `(order_month, value)` points; rows without a date are skipped.
fn date_series(df: &DataFrame, value_column: &str) -> Result<Vec<SeriesPoint>, ProcessorError> {
    let columns = ColumnMap::new(df);
    let Some(dates) = columns.get(ORDER_MONTH) else {
        return Ok(Vec::new());
    };

    let dates = DataProcessor::date_values(dates)?;
    let values = DataProcessor::numeric_values(&columns.numeric_or_missing(value_column))?;

    let mut points: Vec<SeriesPoint> = dates
        .into_iter()
        .zip(values)
        .filter_map(|(date, value)| date.map(|date| SeriesPoint { date, value }))
        .collect();
    points.sort_by_key(|p| p.date);
    Ok(points)
}

/// Descending by value, missing values last.
fn cmp_desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn ranked_bars(
    df: &DataFrame,
    label_column: &str,
    value_column: &str,
) -> Result<Vec<BarPoint>, ProcessorError> {
    let columns = ColumnMap::new(df);
    let Some(labels) = columns.get(label_column) else {
        return Ok(Vec::new());
    };

    let labels = DataProcessor::text_values(labels)?;
    let values = DataProcessor::numeric_values(&columns.numeric_or_missing(value_column))?;

    let mut bars: Vec<BarPoint> = labels
        .into_iter()
        .zip(values)
        .map(|(label, value)| BarPoint { label, value })
        .collect();
    bars.sort_by(|a, b| cmp_desc_missing_last(a.value, b.value));
    Ok(bars)
}

/// A "top N by column" table over whichever of `columns` the frame has.
struct TopTable<'a> {
    title: &'a str,
    sort_by: &'a str,
    columns: &'a [&'a str],
    limit: usize,
    drop_missing: bool,
}

impl TopTable<'_> {
    fn build(&self, df: &DataFrame) -> Result<TableView, ProcessorError> {
        let available = ColumnMap::new(df);
        let selection: Vec<Expr> = available
            .present(self.columns)
            .into_iter()
            .map(col)
            .collect();

        let mut lf = df.clone().lazy();
        if available.contains(self.sort_by) {
            if self.drop_missing {
                lf = lf.filter(col(self.sort_by).is_not_null());
            }
            lf = lf.sort_by_exprs(
                vec![col(self.sort_by)],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            );
        }

        let limit = IdxSize::try_from(self.limit).unwrap_or(IdxSize::MAX);
        let top = lf.limit(limit).select(selection).collect()?;
        TableView::from_frame(self.title, &top)
    }
}

impl TableView {
    pub fn from_frame(title: &str, df: &DataFrame) -> Result<Self, ProcessorError> {
        let mut cells_by_column: Vec<Vec<Cell>> = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let cells = if DataProcessor::is_numeric_dtype(column.dtype()) {
                DataProcessor::numeric_values(column)?
                    .into_iter()
                    .map(|v| v.map_or(Cell::Missing, Cell::Number))
                    .collect()
            } else {
                DataProcessor::text_values(column)?
                    .into_iter()
                    .map(|v| v.map_or(Cell::Missing, Cell::Text))
                    .collect()
            };
            cells_by_column.push(cells);
        }

        let rows = (0..df.height())
            .map(|i| cells_by_column.iter().map(|cells| cells[i].clone()).collect())
            .collect();

        Ok(Self {
            title: title.to_string(),
            columns: df
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            rows,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brands() -> DataFrame {
        DataFrame::new(vec![
            Column::new("product_brand".into(), ["a", "b", "c", "d"]),
            Column::new("return_rate_pct".into(), [Some(5.0), None, Some(40.0), Some(12.5)]),
            Column::new("total_items".into(), [10.0, 20.0, 30.0, 40.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_top_table_sorts_drops_missing_and_limits() {
        let table = TopTable {
            title: "Brands",
            sort_by: "return_rate_pct",
            columns: &["product_brand", "return_rate_pct", "total_items", "revenue"],
            limit: 2,
            drop_missing: true,
        }
        .build(&brands())
        .unwrap();

        // Absent `revenue` is left out of the table.
        assert_eq!(
            table.columns,
            vec!["product_brand", "return_rate_pct", "total_items"]
        );
        assert_eq!(
            table.rows,
            vec![
                vec![Cell::Text("c".into()), Cell::Number(40.0), Cell::Number(30.0)],
                vec![Cell::Text("d".into()), Cell::Number(12.5), Cell::Number(40.0)],
            ]
        );
    }

    #[test]
    fn test_top_table_keeps_missing_last_when_not_dropping() {
        let table = TopTable {
            title: "Brands",
            sort_by: "return_rate_pct",
            columns: &["product_brand", "return_rate_pct"],
            limit: 10,
            drop_missing: false,
        }
        .build(&brands())
        .unwrap();

        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[3], vec![Cell::Text("b".into()), Cell::Missing]);
    }

    #[test]
    fn test_top_table_without_sort_column_keeps_order() {
        let table = TopTable {
            title: "Brands",
            sort_by: "revenue",
            columns: &["product_brand"],
            limit: 3,
            drop_missing: true,
        }
        .build(&brands())
        .unwrap();

        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0], vec![Cell::Text("a".into())]);
    }

    #[test]
    fn test_ranked_bars_descending_missing_last() {
        let df = DataFrame::new(vec![
            Column::new("segment".into(), ["low", "unknown", "high"]),
            Column::new("total_revenue".into(), [Some(10.0), None, Some(99.0)]),
        ])
        .unwrap();

        let bars = ranked_bars(&df, "segment", "total_revenue").unwrap();
        let labels: Vec<_> = bars.iter().map(|b| b.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("high"), Some("low"), Some("unknown")]);
        assert_eq!(bars[2].value, None);
    }

    #[test]
    fn test_date_series_sorted_and_skips_missing_dates() {
        let df = DataFrame::new(vec![
            Column::new("order_month".into(), ["2023-03-01", "", "2023-01-01"]),
            Column::new("revenue".into(), [3.0, 2.0, 1.0]),
        ])
        .unwrap();

        let points = date_series(&df, "revenue").unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, Some(1.0));
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
    }

    #[test]
    fn test_cell_serializes_untagged() {
        let row = vec![Cell::Text("x".into()), Cell::Number(1.5), Cell::Missing];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["x",1.5,null]"#);
    }
}
