//! Repository error types
//!
//! Structured errors for repository operations: what was being done, what
//! went wrong, and which entity was involved.
//!
//! # Example
//!
//! ```rust
//! use user_directory::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("User", "42");
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert!(error.entity_id.is_some());
//! ```

use std::fmt;

use sqlx::error::ErrorKind as SqlxErrorKind;

/// What the repository was doing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    FindById,
    /// Listing, with or without a page window
    FindAll,
    Count,
    Exists,
    Create,
    /// Column changes and location replacement
    Update,
    Delete,
    /// Location lookup by name, inserting it when missing
    GetOrCreate,
    /// Location names for one or many users
    BatchLoad,
}

impl RepositoryOperation {
    /// Snake-case name used in logs and messages
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FindById => "find_by_id",
            Self::FindAll => "find_all",
            Self::Count => "count",
            Self::Exists => "exists",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::GetOrCreate => "get_or_create",
            Self::BatchLoad => "batch_load",
        }
    }
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure category; decides the HTTP status of the error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    NotFound,
    /// Unique key collision, e.g. a taken username
    AlreadyExists,
    /// Foreign key, NOT NULL or CHECK failure
    ConstraintViolation,
    /// Rejected before reaching the database
    ValidationFailed,
    /// Closed pool or I/O failure
    ConnectionFailed,
    /// No pooled connection within the acquire timeout
    Timeout,
    DatabaseError,
    Other,
}

impl RepositoryErrorKind {
    /// Snake-case name; upper-cased it becomes the response error code
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::ConstraintViolation => "constraint_violation",
            Self::ValidationFailed => "validation_failed",
            Self::ConnectionFailed => "connection_failed",
            Self::Timeout => "timeout",
            Self::DatabaseError => "database_error",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
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
    /// The type of entity involved (e.g., "User", "Location")
    pub entity_type: Option<String>,
    /// The ID of the entity involved
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

    /// Create a "not found" error with entity context
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::FindById,
            RepositoryErrorKind::NotFound,
            "Entity not found",
        )
        .with_entity(entity_type, entity_id)
    }

    /// Create an "already exists" error with entity context
    pub fn already_exists(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Create,
            RepositoryErrorKind::AlreadyExists,
            "Entity already exists",
        )
        .with_entity(entity_type, identifier)
    }

    /// Create a validation failed error
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Create,
            RepositoryErrorKind::ValidationFailed,
            message,
        )
    }

    /// Create a database error
    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// Adapter for `map_err` that tags a sqlx failure with the operation
    ///
    /// ```rust,ignore
    /// sqlx::query("DELETE FROM users WHERE id = ?")
    ///     .bind(id)
    ///     .execute(&self.pool)
    ///     .await
    ///     .map_err(RepositoryError::during(RepositoryOperation::Delete))?;
    /// ```
    pub fn during(operation: RepositoryOperation) -> impl FnOnce(sqlx::Error) -> Self {
        move |err| Self::from(err).with_operation(operation)
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

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Transient errors that may succeed on retry
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;

        // Operation defaults to a read; callers refine it via `during`/`with_operation`
        let op = RepositoryOperation::FindById;
        match err {
            E::RowNotFound => Self::new(op, RepositoryErrorKind::NotFound, "Row not found"),
            E::PoolTimedOut => Self::new(
                op,
                RepositoryErrorKind::Timeout,
                "Connection pool timed out",
            ),
            E::PoolClosed => Self::new(
                op,
                RepositoryErrorKind::ConnectionFailed,
                "Connection pool is closed",
            ),
            E::Io(e) => Self::new(op, RepositoryErrorKind::ConnectionFailed, e.to_string()),
            E::Database(db) => {
                let kind = match db.kind() {
                    SqlxErrorKind::UniqueViolation => RepositoryErrorKind::AlreadyExists,
                    SqlxErrorKind::ForeignKeyViolation
                    | SqlxErrorKind::NotNullViolation
                    | SqlxErrorKind::CheckViolation => RepositoryErrorKind::ConstraintViolation,
                    _ => RepositoryErrorKind::DatabaseError,
                };
                Self::new(op, kind, db.message().to_string())
            }
            unreachable_db @ (E::WorkerCrashed | E::Tls(_) | E::Configuration(_)) => Self::new(
                op,
                RepositoryErrorKind::ConnectionFailed,
                unreachable_db.to_string(),
            ),
            mapping @ (E::ColumnDecode { .. } | E::ColumnNotFound(_) | E::Decode(_) | E::Encode(_)) => {
                Self::new(op, RepositoryErrorKind::DatabaseError, mapping.to_string())
            }
            other => Self::new(op, RepositoryErrorKind::Other, other.to_string()),
        }
    }
}
