//! Dashboard module - runs the normalization pipeline over every dataset,
//! applies the date interval and computes the KPIs the report shows.

mod view;

pub use view::{BarPoint, Cell, DashboardView, QualityView, SeriesPoint, TableView};

use crate::data::schema::{self, DatasetSchema, ORDER_MONTH};
use crate::data::{
    date_bounds, filter_by_interval, DataLoader, DataProcessor, DateInterval, PercentDiagnostic,
};
use crate::error::DashboardError;
use crate::stats::StatsCalculator;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

pub const REVENUE: &str = "revenue";
pub const MOM_GROWTH_PCT: &str = "mom_growth_pct";
pub const RETURN_RATE_PCT: &str = "return_rate_pct";

/// Headline numbers over the date-filtered datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub avg_monthly_revenue: Option<f64>,
    pub avg_mom_growth_pct: Option<f64>,
    pub avg_return_rate_pct: Option<f64>,
}

/// All seven datasets after type and percent normalization.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub revenue_by_month: DataFrame,
    pub mom_growth: DataFrame,
    pub return_by_month: DataFrame,
    pub return_by_category: DataFrame,
    pub return_by_brand: DataFrame,
    pub segment_summary: DataFrame,
    pub rfm_summary: DataFrame,
    pub percent_diagnostics: Vec<PercentDiagnostic>,
}

/// The time-indexed datasets restricted to one interval.
#[derive(Debug, Clone)]
pub struct FilteredData {
    pub interval: DateInterval,
    pub revenue_by_month: DataFrame,
    pub mom_growth: DataFrame,
    pub return_by_month: DataFrame,
}

impl DashboardData {
    /// Load and normalize every dataset. Any missing or malformed file aborts.
    pub fn load(loader: &DataLoader) -> Result<Self, DashboardError> {
        let mut diagnostics = Vec::new();
        let mut normalized = |schema: &DatasetSchema| -> Result<DataFrame, DashboardError> {
            let raw = loader.load(schema.name)?;
            let (df, diagnostic) = DataProcessor::normalize(&raw, schema)
                .map_err(DashboardError::processing(schema.name))?;
            diagnostics.extend(diagnostic);
            Ok(df)
        };

        let revenue_by_month = normalized(&schema::REVENUE_BY_MONTH)?;
        let mom_growth = normalized(&schema::MOM_REVENUE_GROWTH)?;
        let return_by_month = normalized(&schema::RETURN_RATE_BY_MONTH)?;
        let return_by_category = normalized(&schema::RETURN_RATE_BY_CATEGORY)?;
        let return_by_brand = normalized(&schema::RETURN_RATE_BY_BRAND)?;
        let segment_summary = normalized(&schema::CUSTOMER_SEGMENT_SUMMARY)?;
        let rfm_summary = normalized(&schema::RFM_SUMMARY)?;

        info!(
            datasets = schema::ALL_DATASETS.len(),
            cached = loader.cache().len(),
            "Datasets normalized"
        );

        Ok(Self {
            revenue_by_month,
            mom_growth,
            return_by_month,
            return_by_category,
            return_by_brand,
            segment_summary,
            rfm_summary,
            percent_diagnostics: diagnostics,
        })
    }

    /// First and last month of the revenue dataset.
    pub fn default_interval(&self) -> Result<DateInterval, DashboardError> {
        date_bounds(&self.revenue_by_month, ORDER_MONTH)
            .map_err(DashboardError::processing(schema::REVENUE_BY_MONTH.name))
    }

    pub fn filter(&self, interval: DateInterval) -> Result<FilteredData, DashboardError> {
        let filter = |df: &DataFrame, dataset: &str| {
            filter_by_interval(df, ORDER_MONTH, &interval).map_err(DashboardError::processing(dataset))
        };

        Ok(FilteredData {
            interval,
            revenue_by_month: filter(&self.revenue_by_month, schema::REVENUE_BY_MONTH.name)?,
            mom_growth: filter(&self.mom_growth, schema::MOM_REVENUE_GROWTH.name)?,
            return_by_month: filter(&self.return_by_month, schema::RETURN_RATE_BY_MONTH.name)?,
        })
    }

    /// Build the presentation view. With no bounds requested the revenue
    /// dataset's date range is used; a half-open request is kept as is and
    /// leaves the datasets unfiltered.
    pub fn view(
        &self,
        requested: DateInterval,
        settings: &crate::config::DashboardSettings,
    ) -> Result<DashboardView, DashboardError> {
        let interval = if requested == DateInterval::default() {
            self.default_interval()?
        } else {
            requested
        };
        info!(start = ?interval.start, end = ?interval.end, "Applying date interval");

        let filtered = self.filter(interval)?;
        DashboardView::build(self, &filtered, settings)
    }
}

impl FilteredData {
    pub fn kpis(&self) -> Result<Kpis, DashboardError> {
        let in_dataset = |dataset: &'static str| {
            move |err: PolarsError| DashboardError::processing(dataset)(err.into())
        };

        Ok(Kpis {
            total_revenue: StatsCalculator::column_sum(&self.revenue_by_month, REVENUE)
                .map_err(in_dataset(schema::REVENUE_BY_MONTH.name))?,
            avg_monthly_revenue: StatsCalculator::column_mean(&self.revenue_by_month, REVENUE)
                .map_err(in_dataset(schema::REVENUE_BY_MONTH.name))?,
            avg_mom_growth_pct: StatsCalculator::column_mean(&self.mom_growth, MOM_GROWTH_PCT)
                .map_err(in_dataset(schema::MOM_REVENUE_GROWTH.name))?,
            avg_return_rate_pct: StatsCalculator::column_mean(
                &self.return_by_month,
                RETURN_RATE_PCT,
            )
            .map_err(in_dataset(schema::RETURN_RATE_BY_MONTH.name))?,
        })
    }
}
