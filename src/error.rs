//! Error types for the files field type.

use thiserror::Error;

/// Common error type for the files field type.
#[derive(Error, Debug)]
pub enum FieldTypeError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The relation cannot be built or synced.
    #[error("relation error: {0}")]
    Relation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// View rendering error.
    #[error("template error: {0}")]
    Template(#[from] crate::template::TemplateError),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for FieldTypeError {
    fn from(e: sqlx::Error) -> Self {
        FieldTypeError::Database(e.to_string())
    }
}

/// Result type alias for files field type operations.
pub type Result<T> = std::result::Result<T, FieldTypeError>;
