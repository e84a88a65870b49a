use crate::types::CustomerId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid generation parameter: {0}")]
    Generation(String),

    #[error("Parse error in {table} row {row}, column '{column}': cannot parse {value:?}")]
    Parse {
        table:  &'static str,
        row:    usize,
        column: &'static str,
        value:  String,
    },

    #[error("Customer {customer_id} violates lifecycle ordering: {reason}")]
    Consistency { customer_id: CustomerId, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path:   PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Cohort date range spans {days} days, limit is {limit}")]
    CohortRangeTooLarge { days: u64, limit: u64 },

    #[error("Stage '{stage}' failed on {file}: {source}")]
    StageFailed {
        stage:  &'static str,
        file:   String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv { path: path.into(), source }
    }

    pub fn consistency(customer_id: CustomerId, reason: impl Into<String>) -> Self {
        Self::Consistency { customer_id, reason: reason.into() }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
