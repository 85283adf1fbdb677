//! Database Layer
//!
//! This module handles persistence of organization nodes:
//!
//! - Database initialization and connection management (`DatabaseService`)
//! - The `NodeStore` abstraction the hierarchy service is written against
//! - Two backends: `TursoStore` (embedded libsql file) and `InMemoryStore`
//!
//! # Architecture
//!
//! Nodes live in a single adjacency-list table. Role uniqueness, the single
//! root slot and parent references are enforced by the store at write time;
//! the service layer pre-checks the same rules only to produce better errors.

mod database;
mod error;
mod memory_store;
mod node_store;
mod turso_store;

pub use database::DatabaseService;
pub use error::{DatabaseError, StoreError, UniqueConstraint};
pub use memory_store::InMemoryStore;
pub use node_store::NodeStore;
pub use turso_store::TursoStore;
