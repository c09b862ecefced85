//! Error types for the estimation engine

use thiserror::Error;

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Failures surfaced by ingestion, training and estimation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    /// The historical table could not be read or parsed
    #[error("failed to load dataset: {0}")]
    DatasetLoad(String),

    /// A column required for the requested computation is absent
    #[error("missing column '{column}' required for {context}")]
    MissingColumn {
        column: &'static str,
        context: &'static str,
    },

    /// Not enough labelled rows to form a train/test split
    #[error("insufficient training data: {rows} usable rows, at least {required} required")]
    TrainingDataInsufficient { rows: usize, required: usize },

    /// No registry entry exists for the company
    #[error("unknown company '{0}'")]
    UnknownCompany(String),

    /// Required project fields are absent from a request
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

impl EstimatorError {
    /// True for failures caused by the supplied dataset rather than the engine
    pub fn is_dataset_error(&self) -> bool {
        matches!(
            self,
            EstimatorError::DatasetLoad(_)
                | EstimatorError::MissingColumn { .. }
                | EstimatorError::TrainingDataInsufficient { .. }
        )
    }
}

impl From<csv::Error> for EstimatorError {
    fn from(err: csv::Error) -> Self {
        EstimatorError::DatasetLoad(err.to_string())
    }
}
