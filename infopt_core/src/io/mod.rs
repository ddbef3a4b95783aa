//! Module for writing the results of models
use thiserror::Error;

use crate::results::ResultError;

pub mod json;

/// Errors from writing results
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Failed to write file: {0}")]
    FileWrite(#[from] std::io::Error),
    #[error("Failed to serialize results: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("Failed to collect results: {0}")]
    Results(#[from] ResultError),
}
