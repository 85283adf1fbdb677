//! Service Layer Error Types
//!
//! This module defines the errors returned by `HierarchyService`. Each
//! variant belongs to one stable `ErrorKind`, which is what the HTTP
//! boundary maps to a status code.

use crate::db::StoreError;
use crate::services::tree_projection::ProjectionError;
use std::fmt;
use thiserror::Error;

/// What a `NotFound` error was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Node,
    Role,
    Parent,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Node => write!(f, "Node"),
            Missing::Role => write!(f, "Role"),
            Missing::Parent => write!(f, "Parent node"),
        }
    }
}

/// Hierarchy operation errors
///
/// Validation failures are raised before any write; store failures are
/// reported as-is, since store batches are atomic there is nothing to undo.
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// The request is malformed or violates a policy
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced node, role or parent does not exist
    #[error("{what} not found: {key}")]
    NotFound { what: Missing, key: String },

    /// The write would break a hierarchy invariant
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data already breaks an invariant (cycle, runaway ancestry)
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// Backend failure
    #[error("Storage operation failed: {0}")]
    Storage(#[from] StoreError),
}

/// Stable error category, one per `HierarchyError` variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Conflict,
    InternalInconsistency,
    Storage,
}

impl HierarchyError {
    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            what: Missing::Node,
            key: id.into(),
        }
    }

    /// Create a role not found error
    pub fn role_not_found(role: impl Into<String>) -> Self {
        Self::NotFound {
            what: Missing::Role,
            key: role.into(),
        }
    }

    /// Create a parent not found error
    pub fn parent_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            what: Missing::Parent,
            key: id.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an internal inconsistency error
    pub fn inconsistency(msg: impl Into<String>) -> Self {
        Self::InternalInconsistency(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InternalInconsistency(_) => ErrorKind::InternalInconsistency,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<ProjectionError> for HierarchyError {
    fn from(err: ProjectionError) -> Self {
        Self::InternalInconsistency(err.to_string())
    }
}
