//! Business Services
//!
//! This module contains the hierarchy-integrity engine:
//!
//! - `HierarchyService` - insert, update/reparent, delete-with-reattachment and reads
//! - `tree_projection` - flat parent-linked rows to nested trees
//! - `HierarchyPolicy` - deployment-specific rules (root deletion, role mutability)
//!
//! Services coordinate between the database layer and the HTTP boundary,
//! implementing business rules on top of the `NodeStore` abstraction.

pub mod error;
pub mod hierarchy_service;
pub mod policy;
pub mod tree_projection;

pub use error::{ErrorKind, HierarchyError, Missing};
pub use hierarchy_service::HierarchyService;
pub use policy::{HierarchyPolicy, RootDeletion};
pub use tree_projection::{project_forest, project_subtree, ProjectionError};
