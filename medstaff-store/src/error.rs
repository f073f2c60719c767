//! Crate-level error type
//!
//! Storage operations report [`RepositoryError`] directly; this type covers
//! everything around them (configuration, pool setup, table resolution) and
//! wraps repository errors for callers that want one error type.

use thiserror::Error;

use crate::repository::RepositoryError;
use crate::table::InvalidIdentifier;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised outside of individual storage operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Configuration loaded but holds unusable values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A storage operation failed
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// The store could not be reached while setting up the pool
    #[error("Database error: {0}")]
    Database(String),

    /// Schema or table name rejected during resolution
    #[error("{0}")]
    InvalidIdentifier(#[from] InvalidIdentifier),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryOperation;

    #[test]
    fn test_repository_error_converts() {
        let err: Error =
            RepositoryError::store_unavailable(RepositoryOperation::Get, "refused").into();
        assert!(matches!(err, Error::Repository(_)));
        assert!(err.to_string().contains("store_unavailable"));
    }

    #[test]
    fn test_invalid_identifier_converts() {
        let err: Error = crate::table::TableName::new("clinic", "").unwrap_err().into();
        assert!(matches!(err, Error::InvalidIdentifier(_)));
        assert!(err.to_string().contains("invalid table name"));
    }

    #[test]
    fn test_figment_error_is_boxed() {
        let err: Error = figment::Error::from("missing field".to_string()).into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
