//! Dataset Schema Module
//! Declares which columns each dataset is expected to carry and how optional
//! columns are looked up.

use polars::prelude::*;

pub const ORDER_MONTH: &str = "order_month";

/// Percent column fallback: normalize `target` when present, otherwise
/// derive `target` from `fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentRule {
    pub target: &'static str,
    pub fallback: Option<&'static str>,
}

impl PercentRule {
    /// Column the percent values are read from, if the frame has one.
    pub fn source(&self, columns: &ColumnMap<'_>) -> Option<&'static str> {
        std::iter::once(self.target)
            .chain(self.fallback)
            .find(|name| columns.contains(name))
    }
}

/// Static description of one input dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSchema {
    pub name: &'static str,
    pub date_column: Option<&'static str>,
    pub numeric_columns: &'static [&'static str],
    pub percent: Option<PercentRule>,
}

pub const REVENUE_BY_MONTH: DatasetSchema = DatasetSchema {
    name: "revenue_by_month",
    date_column: Some(ORDER_MONTH),
    numeric_columns: &["revenue"],
    percent: None,
};

pub const MOM_REVENUE_GROWTH: DatasetSchema = DatasetSchema {
    name: "mom_revenue_growth",
    date_column: Some(ORDER_MONTH),
    numeric_columns: &["mom_growth_pct"],
    percent: Some(PercentRule {
        target: "mom_growth_pct",
        fallback: None,
    }),
};

const RETURN_RATE: PercentRule = PercentRule {
    target: "return_rate_pct",
    fallback: Some("return_rate"),
};

const AVG_RETURN_RATE: PercentRule = PercentRule {
    target: "avg_return_rate_pct",
    fallback: Some("avg_return_rate"),
};

pub const RETURN_RATE_BY_MONTH: DatasetSchema = DatasetSchema {
    name: "return_rate_by_month",
    date_column: Some(ORDER_MONTH),
    numeric_columns: &["returned_items", "total_items", "return_rate", "return_rate_pct"],
    percent: Some(RETURN_RATE),
};

pub const RETURN_RATE_BY_CATEGORY: DatasetSchema = DatasetSchema {
    name: "return_rate_by_category",
    date_column: None,
    numeric_columns: &["total_items", "return_rate", "return_rate_pct"],
    percent: Some(RETURN_RATE),
};

pub const RETURN_RATE_BY_BRAND: DatasetSchema = DatasetSchema {
    name: "return_rate_by_brand",
    date_column: None,
    numeric_columns: &["total_items", "revenue", "return_rate", "return_rate_pct"],
    percent: Some(RETURN_RATE),
};

pub const CUSTOMER_SEGMENT_SUMMARY: DatasetSchema = DatasetSchema {
    name: "customer_segment_summary",
    date_column: None,
    numeric_columns: &[
        "customers",
        "avg_revenue_per_user",
        "total_revenue",
        "avg_return_rate",
        "avg_return_rate_pct",
        "avg_frequency",
        "avg_recency",
    ],
    percent: Some(AVG_RETURN_RATE),
};

pub const RFM_SUMMARY: DatasetSchema = DatasetSchema {
    name: "rfm_summary",
    date_column: None,
    numeric_columns: &[
        "customers",
        "total_revenue",
        "avg_return_rate",
        "avg_return_rate_pct",
        "avg_frequency",
        "avg_recency",
    ],
    percent: Some(AVG_RETURN_RATE),
};

pub const ALL_DATASETS: [DatasetSchema; 7] = [
    REVENUE_BY_MONTH,
    MOM_REVENUE_GROWTH,
    RETURN_RATE_BY_MONTH,
    RETURN_RATE_BY_CATEGORY,
    RETURN_RATE_BY_BRAND,
    CUSTOMER_SEGMENT_SUMMARY,
    RFM_SUMMARY,
];

/// Lookup of optional columns on a frame.
///
/// Absent columns are answered with a default rather than an error, so not
/// every input file has to expose every optional column.
#[derive(Clone, Copy)]
pub struct ColumnMap<'a> {
    df: &'a DataFrame,
}

impl<'a> ColumnMap<'a> {
    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&'a Column> {
        self.df.column(name).ok()
    }

    /// The named column, or an all-missing `Float64` column of matching height.
    pub fn numeric_or_missing(&self, name: &str) -> Column {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| Column::full_null(name.into(), self.df.height(), &DataType::Float64))
    }

    /// The subset of `names` present on the frame, order preserved.
    pub fn present<'n>(&self, names: &[&'n str]) -> Vec<&'n str> {
        names
            .iter()
            .copied()
            .filter(|name| self.contains(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("product_brand".into(), ["a", "b"]),
            Column::new("return_rate".into(), [0.1, 0.2]),
        ])
        .unwrap()
    }

    #[test]
    fn test_percent_rule_prefers_target() {
        let df = DataFrame::new(vec![
            Column::new("return_rate".into(), [0.1]),
            Column::new("return_rate_pct".into(), [10.0]),
        ])
        .unwrap();

        assert_eq!(RETURN_RATE.source(&ColumnMap::new(&df)), Some("return_rate_pct"));
    }

    #[test]
    fn test_percent_rule_falls_back() {
        let df = frame();
        assert_eq!(RETURN_RATE.source(&ColumnMap::new(&df)), Some("return_rate"));
        assert_eq!(AVG_RETURN_RATE.source(&ColumnMap::new(&df)), None);
    }

    #[test]
    fn test_numeric_or_missing_defaults_to_nulls() {
        let df = frame();
        let columns = ColumnMap::new(&df);

        let missing = columns.numeric_or_missing("revenue");
        assert_eq!(missing.len(), 2);
        assert_eq!(missing.null_count(), 2);
        assert_eq!(missing.dtype(), &DataType::Float64);

        let present = columns.numeric_or_missing("return_rate");
        assert_eq!(present.null_count(), 0);
    }

    #[test]
    fn test_present_keeps_order() {
        let df = frame();
        let columns = ColumnMap::new(&df);
        assert_eq!(
            columns.present(&["total_items", "return_rate", "product_brand"]),
            vec!["return_rate", "product_brand"]
        );
    }

    #[test]
    fn test_dataset_names_are_unique() {
        let mut names: Vec<&str> = ALL_DATASETS.iter().map(|d| d.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ALL_DATASETS.len());
    }
}
