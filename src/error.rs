//! Error types for feedhub.

use thiserror::Error;

/// Common error type for feedhub.
#[derive(Error, Debug)]
pub enum FeedhubError {
    /// Database error.
    ///
    /// Generic database error wrapping non-conflict failures from sqlx.
    #[error("database error: {0}")]
    Database(String),

    /// Uniqueness conflict on (feed_id, url).
    ///
    /// Signals that a post with the same URL already exists for the feed.
    /// The ingestor treats this as success-with-no-effect; it must stay
    /// distinguishable from every other database failure.
    #[error("duplicate post: {0}")]
    Duplicate(String),

    /// Feed fetch error: network failure, timeout, non-2xx status,
    /// wrong content-type, or an unparseable document.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Conversion from sqlx errors; unique violations become Duplicate so
// callers can tell an already-ingested post from a real failure.
impl From<sqlx::Error> for FeedhubError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return FeedhubError::Duplicate(db_err.to_string());
            }
        }
        FeedhubError::Database(e.to_string())
    }
}

impl FeedhubError {
    /// Check whether this error is the benign (feed_id, url) conflict.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, FeedhubError::Duplicate(_))
    }
}

/// Result type alias for feedhub operations.
pub type Result<T> = std::result::Result<T, FeedhubError>;
