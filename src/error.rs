//! Error types for weight-insights
//!
//! The analytics core never fails; these errors belong to the boundary layer
//! that turns fetched records into validated observations.

use thiserror::Error;

/// Errors that can occur while ingesting or encoding data
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    #[error("Source error: {0}")]
    SourceError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
