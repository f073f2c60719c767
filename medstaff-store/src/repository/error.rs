//! Repository error types
//!
//! Every storage operation reports failures as a [`RepositoryError`] carrying
//! the operation, the error category and the affected entity.
//!
//! Absent rows are never an error: `get` returns `None` and bulk reads simply
//! omit missing ids.
//!
//! # Example
//!
//! ```rust
//! use medstaff_store::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
//!
//! let error = RepositoryError::store_unavailable(RepositoryOperation::Get, "connection refused")
//!     .with_entity("Doctor", "5");
//! assert!(matches!(error.kind, RepositoryErrorKind::StoreUnavailable));
//! assert!(error.is_retriable());
//! ```

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Fetching a single entity by UId
    Get,
    /// Fetching a set of entities by UId
    GetMany,
    /// Scanning the whole table
    GetAll,
    /// Upserting a single entity
    Set,
    /// Upserting a batch of entities
    SetMany,
    /// Updating a single entity
    Update,
    /// Updating a batch of entities
    UpdateMany,
    /// Deleting an entity by UId
    Remove,
    /// Running a filtered query
    Find,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::GetMany => write!(f, "get_many"),
            Self::GetAll => write!(f, "get_all"),
            Self::Set => write!(f, "set"),
            Self::SetMany => write!(f, "set_many"),
            Self::Update => write!(f, "update"),
            Self::UpdateMany => write!(f, "update_many"),
            Self::Remove => write!(f, "remove"),
            Self::Find => write!(f, "find"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// The caller passed arguments that cannot be turned into a statement.
    /// Raised before any store access.
    InvalidArgument,
    /// No connection to the store could be obtained
    StoreUnavailable,
    /// The store rejected or failed the statement (syntax, constraint, type mismatch)
    QueryExecution,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::StoreUnavailable => write!(f, "store_unavailable"),
            Self::QueryExecution => write!(f, "query_execution"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The entity type involved (e.g. "Doctor")
    pub entity_type: Option<String>,
    /// The UId(s) involved, comma separated for bulk operations
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create an invalid argument error
    ///
    /// # Example
    ///
    /// ```rust
    /// use medstaff_store::repository::{RepositoryError, RepositoryOperation};
    ///
    /// let error = RepositoryError::invalid_argument(
    ///     RepositoryOperation::SetMany,
    ///     "UId 5 appears twice in the batch",
    /// );
    /// assert!(!error.is_retriable());
    /// ```
    pub fn invalid_argument(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::InvalidArgument, message)
    }

    /// Create a store unavailable error
    pub fn store_unavailable(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::StoreUnavailable, message)
    }

    /// Create a query execution error
    pub fn query_execution(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::QueryExecution, message)
    }

    /// Classify a driver error raised while running `operation`
    pub fn from_sqlx(operation: RepositoryOperation, err: &sqlx::Error) -> Self {
        use sqlx::Error as E;
        let kind = match err {
            E::Io(_)
            | E::Tls(_)
            | E::Configuration(_)
            | E::PoolTimedOut
            | E::PoolClosed
            | E::WorkerCrashed => RepositoryErrorKind::StoreUnavailable,
            _ => RepositoryErrorKind::QueryExecution,
        };
        Self::new(operation, kind, err.to_string())
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Add the entity type without an id (full scans, filtered queries)
    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Transient failures that may succeed when the caller tries again.
    ///
    /// The repository never retries on its own.
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, RepositoryErrorKind::StoreUnavailable)
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(entity_type), Some(entity_id)) => write!(f, " [{}: {}]", entity_type, entity_id)?,
            (Some(entity_type), None) => write!(f, " [{}]", entity_type)?,
            _ => {}
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}
