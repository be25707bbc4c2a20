//! CSV Data Loader Module
//! Reads named datasets from the data directory using Polars, backed by a shared cache.

use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read dataset file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed CSV in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}

/// Dataset cache keyed by dataset name.
///
/// Entries live as long as the cache itself. Concurrent loads of the same
/// name may both read the file, the first insert wins.
#[derive(Debug, Default)]
pub struct DatasetCache {
    frames: RwLock<HashMap<String, Arc<DataFrame>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<DataFrame>> {
        let frames = self.frames.read().unwrap_or_else(PoisonError::into_inner);
        frames.get(name).cloned()
    }

    /// Insert a freshly loaded frame and return whatever is cached under `name`.
    pub fn insert(&self, name: &str, df: DataFrame) -> Arc<DataFrame> {
        let mut frames = self.frames.write().unwrap_or_else(PoisonError::into_inner);
        frames
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(df))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.frames
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.frames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Loads datasets by name from a fixed base directory.
pub struct DataLoader {
    base_dir: PathBuf,
    cache: Arc<DatasetCache>,
}

impl DataLoader {
    pub fn new(base_dir: impl Into<PathBuf>, cache: Arc<DatasetCache>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn cache(&self) -> &Arc<DatasetCache> {
        &self.cache
    }

    /// File backing a dataset. Bare names get a `.csv` extension.
    pub fn dataset_path(&self, name: &str) -> PathBuf {
        let path = self.base_dir.join(name);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension("csv")
        }
    }

    /// Load a dataset, reading storage only on the first request for `name`.
    pub fn load(&self, name: &str) -> Result<Arc<DataFrame>, LoaderError> {
        if let Some(df) = self.cache.get(name) {
            debug!(dataset = name, "Dataset served from cache");
            return Ok(df);
        }

        let path = self.dataset_path(name);
        let df = read_csv(&path)?;
        info!(
            dataset = name,
            rows = df.height(),
            columns = df.width(),
            "Loaded dataset"
        );

        Ok(self.cache.insert(name, df))
    }
}

/// Read a comma-delimited file with a header row. Every column is kept as
/// text so that type coercion stays explicit.
pub fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
    let file = File::open(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|source| LoaderError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_dataset(dir: &TempDir, file: &str, content: &str) {
        fs::write(dir.path().join(file), content).unwrap();
    }

    fn loader_for(dir: &TempDir) -> DataLoader {
        DataLoader::new(dir.path(), Arc::new(DatasetCache::new()))
    }

    #[test]
    fn test_load_reads_all_columns_as_text() {
        let dir = TempDir::new().unwrap();
        write_dataset(
            &dir,
            "revenue_by_month.csv",
            "order_month,revenue\n2023-01-01,100\n2023-02-01,200\n",
        );

        let df = loader_for(&dir).load("revenue_by_month").unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
        assert_eq!(df.column("revenue").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("order_month").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_load_accepts_explicit_extension() {
        let dir = TempDir::new().unwrap();
        write_dataset(&dir, "rfm_summary.csv", "rfm_code,customers\n111,5\n");

        let loader = loader_for(&dir);
        assert_eq!(loader.base_dir(), dir.path());
        assert_eq!(
            loader.dataset_path("rfm_summary.csv"),
            loader.dataset_path("rfm_summary")
        );
        assert_eq!(loader.load("rfm_summary.csv").unwrap().height(), 1);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = loader_for(&dir).load("revenue_by_month").unwrap_err();

        assert!(matches!(err, LoaderError::Io { .. }));
        assert!(err.to_string().contains("revenue_by_month.csv"));
    }

    #[test]
    fn test_load_ragged_rows_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write_dataset(&dir, "broken.csv", "a,b\n1,2\n3,4,5,6\n");

        let err = loader_for(&dir).load("broken").unwrap_err();
        assert!(matches!(err, LoaderError::Parse { .. }));
    }

    #[test]
    fn test_load_empty_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write_dataset(&dir, "empty.csv", "");

        let err = loader_for(&dir).load("empty").unwrap_err();
        assert!(matches!(err, LoaderError::Parse { .. }));
    }

    #[test]
    fn test_repeated_load_returns_cached_instance() {
        let dir = TempDir::new().unwrap();
        write_dataset(&dir, "segments.csv", "segment,customers\nVIP,10\n");

        let loader = loader_for(&dir);
        let first = loader.load("segments").unwrap();

        // Storage is not consulted again once cached.
        fs::remove_file(dir.path().join("segments.csv")).unwrap();
        let second = loader.load("segments").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.cache().len(), 1);
    }

    #[test]
    fn test_cache_is_shared_between_loaders() {
        let dir = TempDir::new().unwrap();
        write_dataset(&dir, "segments.csv", "segment,customers\nVIP,10\n");

        let cache = Arc::new(DatasetCache::new());
        let a = DataLoader::new(dir.path(), cache.clone());
        let b = DataLoader::new(dir.path(), cache.clone());

        let first = a.load("segments").unwrap();
        let second = b.load("segments").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_first_insert_wins() {
        let cache = DatasetCache::new();
        let first = cache.insert("x", DataFrame::empty());
        let second = cache.insert("x", DataFrame::empty());
        assert!(Arc::ptr_eq(&first, &second));
    }
}
