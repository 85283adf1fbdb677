//! Data Models
//!
//! This module contains the data structures used throughout OrgChart:
//!
//! - `OrgNode` - The persisted position record
//! - `NewOrgNode` / `OrgNodeUpdate` - Insert and partial-update payloads
//! - `OrgTree` / `NodeDetail` - Nested read views produced by tree projection
//! - `NodePatch` / `BatchWrite` - Storage-facing write descriptions

mod org_node;

pub(crate) use org_node::non_blank;
pub use org_node::{
    BatchWrite, CreateOutcome, NewOrgNode, NodeDetail, NodePatch, OrgNode, OrgNodeUpdate, OrgTree,
};
