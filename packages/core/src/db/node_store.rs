//! NodeStore Trait - Storage Abstraction Layer
//!
//! This module defines the `NodeStore` trait that abstracts persistence of
//! organization nodes. The trait lets the hierarchy service run unchanged on
//! top of different backends (libsql via `TursoStore`, `InMemoryStore`).
//!
//! # Architecture
//!
//! - **Abstraction Point**: Between `HierarchyService` (business rules) and storage
//! - **Adjacency List**: Nodes carry a `parent_id`; children are a query, never a stored list
//! - **Authoritative Constraints**: Role uniqueness, the single-root slot and parent
//!   references are enforced at write time, independent of service pre-checks
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so embedded and networked backends
//!    share one interface
//! 2. **Ownership Semantics**: Write methods take ownership of their payloads
//! 3. **Typed Errors**: `StoreError` keeps constraint violations distinguishable
//!    from backend failures
//! 4. **Atomic Batches**: `create_many` and `apply_batch` are all-or-nothing; a
//!    concurrent reader never observes half of a batch
//!
//! # Examples
//!
//! ```rust,no_run
//! use orgchart_core::db::{DatabaseService, NodeStore, TursoStore};
//! use orgchart_core::models::OrgNode;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/orgchart.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
//!
//!     let ceo = store.create(OrgNode::new("Alice", "CEO", "", None)).await?;
//!     let roots = store.find_roots().await?;
//!     assert_eq!(roots[0].id, ceo.id);
//!     Ok(())
//! }
//! ```

use crate::db::error::StoreError;
use crate::models::{BatchWrite, NodePatch, OrgNode};
use async_trait::async_trait;

/// Abstraction layer for organization node persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single store can be shared
/// across concurrently running requests.
///
/// # Method Categories
///
/// - **Lookup**: `find_by_id`, `find_by_role`, `find_roots`, `find_all`, `count`
/// - **Hierarchy**: `find_direct_children`, `find_subtree`
/// - **Writes**: `create`, `create_many`, `update`, `delete`, `apply_batch`
#[async_trait]
pub trait NodeStore: Send + Sync {
    //
    // LOOKUP OPERATIONS
    //

    /// Get node by ID
    ///
    /// # Returns
    ///
    /// - `Ok(Some(node))` if node exists
    /// - `Ok(None)` if node doesn't exist (not an error)
    /// - `Err(_)` if the backend fails
    async fn find_by_id(&self, id: &str) -> Result<Option<OrgNode>, StoreError>;

    /// Get node by its (unique) role label
    async fn find_by_role(&self, role: &str) -> Result<Option<OrgNode>, StoreError>;

    /// Get every node without a parent
    ///
    /// Under the single-root invariant this returns zero or one node, but
    /// callers must not rely on the store having enforced that.
    async fn find_roots(&self) -> Result<Vec<OrgNode>, StoreError>;

    /// Get every node, in insertion order
    async fn find_all(&self) -> Result<Vec<OrgNode>, StoreError>;

    /// Number of stored nodes
    async fn count(&self) -> Result<usize, StoreError>;

    //
    // HIERARCHY OPERATIONS
    //

    /// Get the nodes whose `parent_id` equals `id`, in insertion order
    ///
    /// Does NOT validate that `id` exists; an unknown id yields an empty list.
    async fn find_direct_children(&self, id: &str) -> Result<Vec<OrgNode>, StoreError>;

    /// Get the node and all of its transitive descendants
    ///
    /// The result is in topological order (every parent precedes its
    /// children), so a single pass can build the nested tree. An unknown id
    /// yields an empty list. Traversal is bounded by the number of stored
    /// nodes, so corrupt cyclic data cannot make this loop.
    async fn find_subtree(&self, id: &str) -> Result<Vec<OrgNode>, StoreError>;

    //
    // WRITE OPERATIONS
    //

    /// Insert a node
    ///
    /// # Errors
    ///
    /// - `UniqueViolation` if the role is taken, or the node has no parent
    ///   while a root already exists
    /// - `MissingReference` if `parent_id` names a missing node
    async fn create(&self, node: OrgNode) -> Result<OrgNode, StoreError>;

    /// Insert several nodes atomically, in order
    ///
    /// A node may reference a parent created earlier in the same call.
    /// Either every node is persisted or none is.
    async fn create_many(&self, nodes: Vec<OrgNode>) -> Result<Vec<OrgNode>, StoreError>;

    /// Apply a field-level patch to an existing node
    ///
    /// # Errors
    ///
    /// - `NotFound` if `id` is absent
    /// - `UniqueViolation` / `MissingReference` as for `create`
    async fn update(&self, id: &str, patch: NodePatch) -> Result<OrgNode, StoreError>;

    /// Remove a node
    ///
    /// # Errors
    ///
    /// - `NotFound` if `id` is absent
    /// - `MissingReference` if other nodes still report to it
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Apply several writes as one atomic unit
    ///
    /// Writes are applied in order. If any write fails the whole batch is
    /// rolled back and the first error is returned.
    async fn apply_batch(&self, writes: Vec<BatchWrite>) -> Result<(), StoreError>;
}
