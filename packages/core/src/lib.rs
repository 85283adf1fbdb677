//! OrgChart Core Business Logic Layer
//!
//! This crate maintains a single-rooted reporting tree of organizational
//! roles and keeps it consistent across insert, reparent, query and delete.
//!
//! # Architecture
//!
//! - **Adjacency list**: every node stores its `parent_id`; children are derived
//! - **Store-enforced constraints**: unique roles, one root, valid parent links
//! - **libsql/Turso**: Embedded SQLite-compatible database, or an in-memory store
//!
//! # Modules
//!
//! - [`models`] - Data structures (OrgNode, NewOrgNode, OrgTree, ...)
//! - [`db`] - Node Store trait and its backends
//! - [`services`] - Hierarchy engine and tree projection

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::{InMemoryStore, NodeStore, StoreError, TursoStore};
pub use models::*;
pub use services::{ErrorKind, HierarchyError, HierarchyPolicy, HierarchyService, RootDeletion};
