//! Error types for the pipesearch crate

use thiserror::Error;

/// Result type alias for pipesearch operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Main error type for the pipesearch crate
///
/// Per-trial evaluation failures are not errors: they are carried as
/// [`crate::pipeline::Evaluation::Failure`] values and handled inside the
/// search loop. Only faults that prevent a session from running at all
/// surface here.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Serialization(err.to_string())
    }
}
