//! Database Error Types
//!
//! This module defines error types for database operations, providing
//! clear error handling for connection, initialization, and query failures,
//! and the `StoreError` surfaced through the `NodeStore` trait.

use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
///
/// Covers all error cases for database connection, initialization,
/// and basic operations. Constraint violations are classified into
/// `StoreError` variants by the store implementation.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an initialization failed error
    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }
}

/// Which write-time constraint rejected a store write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueConstraint {
    /// Two nodes with the same role
    Role,
    /// A second node without a parent
    SingleRoot,
    /// Duplicate primary key
    Id,
}

impl std::fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueConstraint::Role => write!(f, "role"),
            UniqueConstraint::SingleRoot => write!(f, "single root"),
            UniqueConstraint::Id => write!(f, "id"),
        }
    }
}

/// Errors surfaced by `NodeStore` implementations
///
/// The constraint variants are authoritative: the hierarchy service treats
/// them as the final word even when its own pre-checks passed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Target record does not exist
    #[error("Node not found: {id}")]
    NotFound { id: String },

    /// A uniqueness constraint was violated at write time
    #[error("Unique constraint violated: {constraint} ({detail})")]
    UniqueViolation {
        constraint: UniqueConstraint,
        detail: String,
    },

    /// A parent reference points at a missing node, or a delete would
    /// leave children pointing at a missing node
    #[error("Missing referenced node: {id}")]
    MissingReference { id: String },

    /// Stored data could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Backend failure
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a unique violation error
    pub fn unique_violation(constraint: UniqueConstraint, detail: impl Into<String>) -> Self {
        Self::UniqueViolation {
            constraint,
            detail: detail.into(),
        }
    }

    /// Create a missing reference error
    pub fn missing_reference(id: impl Into<String>) -> Self {
        Self::MissingReference { id: id.into() }
    }
}
