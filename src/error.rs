use thiserror::Error;

use crate::config::ConfigError;
use crate::data::{LoaderError, ProcessorError};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("Data processing error in {dataset}: {source}")]
    Processing {
        dataset: String,
        #[source]
        source: ProcessorError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Report serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DashboardError {
    pub fn processing(dataset: &str) -> impl FnOnce(ProcessorError) -> Self + '_ {
        move |source| DashboardError::Processing {
            dataset: dataset.to_string(),
            source,
        }
    }
}
