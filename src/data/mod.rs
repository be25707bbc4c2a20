//! Data module - CSV loading, type normalization and date filtering
//!
//! ```text
//!  data/processed/*.csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  read file → DataFrame (text columns), cached by name
//!   └──────────┘
//!        │
//!        ▼
//!   ┌────────────────────┐
//!   │ processor / percent │  dates, numbers, 0-100 percent columns
//!   └────────────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  inclusive date interval
//!   └──────────┘
//! ```

mod filter;
mod loader;
mod percent;
mod processor;
pub mod schema;

pub use filter::{date_bounds, filter_by_date, filter_by_interval, DateInterval};
pub use loader::{read_csv, DataLoader, DatasetCache, LoaderError};
pub use percent::{
    PercentNormalizer, PercentReport, FRACTION_MAX, FRACTION_MIN, FRACTION_RATIO_THRESHOLD,
    FRACTION_SCALE, PERCENT_MAX, PERCENT_MIN,
};
pub use processor::{DataProcessor, PercentDiagnostic, ProcessorError};
pub use schema::{ColumnMap, DatasetSchema, PercentRule};
