//! Organization Node Data Structures
//!
//! This module defines the `OrgNode` record and the request/response shapes
//! built around it.
//!
//! # Architecture
//!
//! - **Single entity**: every position in the reporting tree is an `OrgNode`
//! - **Derived children**: children are never stored; they are the nodes whose
//!   `parent_id` points at a given node
//! - **Explicit partial updates**: `OrgNodeUpdate` names every field that may
//!   change, so internal relation fields can never be written by accident
//!
//! # Examples
//!
//! ```rust
//! use orgchart_core::models::{NewOrgNode, OrgNodeUpdate};
//!
//! // A manager created together with one direct report
//! let cto = NewOrgNode::new("Grace", "CTO")
//!     .with_description("Runs engineering")
//!     .reporting_to("3f1c2a0e-5c8e-4f57-9a43-0d6f1f6b2b11")
//!     .with_child(NewOrgNode::new("Linus", "VP_ENG"));
//!
//! // Rename a node without touching anything else
//! let update = OrgNodeUpdate::new().with_name("Grace Hopper");
//! assert!(!update.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted position in the reporting tree.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID v4), assigned at creation and never changed
/// - `name`: Display name of the person holding the position
/// - `role`: Unique position label (e.g. "CEO", "VP_ENG")
/// - `description`: Free text, may be empty
/// - `parent_id`: The node this one reports to; `None` only for the root
/// - `created_at` / `modified_at`: Maintained by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNode {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Display name
    pub name: String,

    /// Unique role label
    pub role: String,

    /// Free-text description
    pub description: String,

    /// Node this one reports to (`None` for the root)
    pub parent_id: Option<String>,

    /// Timestamp when the node was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the node was last modified
    pub modified_at: DateTime<Utc>,
}

impl OrgNode {
    /// Create a new node with an auto-generated UUID
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        description: impl Into<String>,
        parent_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            role: role.into(),
            description: description.into(),
            parent_id,
            created_at: now,
            modified_at: now,
        }
    }

    /// Check if this node is the root (reports to nobody)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Insert payload: a new node, optionally together with its direct reports.
///
/// `report_to` is required once a root exists and ignored (or rejected,
/// depending on policy) for the very first node. `children` may nest; every
/// level is attached to the node that lists it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrgNode {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_to: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NewOrgNode>,
}

impl NewOrgNode {
    /// Create an insert payload with the required fields
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn reporting_to(mut self, parent_id: impl Into<String>) -> Self {
        self.report_to = Some(parent_id.into());
        self
    }

    pub fn with_child(mut self, child: NewOrgNode) -> Self {
        self.children.push(child);
        self
    }

    /// Total number of records this payload will create (itself included)
    pub fn family_size(&self) -> usize {
        1 + self.children.iter().map(NewOrgNode::family_size).sum::<usize>()
    }
}

/// Partial node update for PATCH operations
///
/// Only the recognized options below can change. Absent fields, and fields
/// supplied as blank strings, are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// New parent (reparent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_to: Option<String>,
}

impl OrgNodeUpdate {
    /// Create a new empty update
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn reporting_to(mut self, parent_id: impl Into<String>) -> Self {
        self.report_to = Some(parent_id.into());
        self
    }

    /// Check if the update carries any non-blank field
    pub fn is_empty(&self) -> bool {
        non_blank(&self.name).is_none()
            && non_blank(&self.description).is_none()
            && non_blank(&self.role).is_none()
            && non_blank(&self.report_to).is_none()
    }
}

/// Returns the value when it is present and not whitespace-only
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Field-level patch applied by a node store
///
/// This is the storage-facing counterpart of `OrgNodeUpdate`: the service has
/// already resolved and validated every value.
///
/// `parent_id` uses the double-Option pattern:
/// - `None`: Don't change parent_id
/// - `Some(None)`: Set parent_id to NULL
/// - `Some(Some(id))`: Set parent_id to the specified ID
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub role: Option<String>,
    pub parent_id: Option<Option<String>>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.role.is_none()
            && self.parent_id.is_none()
    }

    /// Apply the patch to a node in place
    pub fn apply_to(&self, node: &mut OrgNode) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(description) = &self.description {
            node.description = description.clone();
        }
        if let Some(role) = &self.role {
            node.role = role.clone();
        }
        if let Some(parent_id) = &self.parent_id {
            node.parent_id = parent_id.clone();
        }
        node.modified_at = Utc::now();
    }
}

/// One write in an atomic multi-record batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchWrite {
    /// Point `id` at a new parent
    Reparent {
        id: String,
        parent_id: Option<String>,
    },
    /// Remove `id`
    Delete { id: String },
}

/// Nested view of a node and its materialized descendants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgTree {
    #[serde(flatten)]
    pub node: OrgNode,

    /// Direct reports, in store order
    pub children: Vec<OrgTree>,
}

impl OrgTree {
    pub fn leaf(node: OrgNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this tree, itself included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(OrgTree::size).sum::<usize>()
    }

    /// Depth-first search for a node by id
    pub fn find(&self, id: &str) -> Option<&OrgTree> {
        if self.node.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Single-node read view: the subtree rooted at the node plus a
/// back-reference to the node it reports to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    #[serde(flatten)]
    pub tree: OrgTree,

    pub parent: Option<OrgNode>,
}

impl NodeDetail {
    pub fn node(&self) -> &OrgNode {
        &self.tree.node
    }

    pub fn children(&self) -> &[OrgTree] {
        &self.tree.children
    }
}

/// Result of an insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    /// The inserted node
    pub node: OrgNode,

    /// Ids of the children created alongside it (pre-order)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_ids: Vec<String>,
}
