//! Persistence errors

use thiserror::Error;

/// Errors that can occur while loading or saving the persistent record
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record file could not be read or written
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Record file is not valid JSON
    #[error("Invalid record JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// No record file exists at the path
    #[error("Record file not found: {0}")]
    NotFound(String),
}
