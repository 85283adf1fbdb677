//! Hierarchy policy knobs
//!
//! Deployments differ on a few rules the hierarchy engine otherwise applies
//! uniformly. They are collected here instead of being hard-coded.

use serde::{Deserialize, Serialize};

/// When the root node may be deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootDeletion {
    /// The root can never be deleted
    Never,
    /// The root can be deleted once nobody reports to it
    #[default]
    WhenChildless,
}

/// Configurable hierarchy rules
///
/// ```rust
/// use orgchart_core::services::{HierarchyPolicy, RootDeletion};
///
/// let policy = HierarchyPolicy {
///     root_deletion: RootDeletion::Never,
///     ..Default::default()
/// };
/// assert!(policy.role_mutable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HierarchyPolicy {
    pub root_deletion: RootDeletion,

    /// Whether an update may change a node's role
    pub role_mutable: bool,

    /// Fail (instead of ignore) a `report_to` supplied for the first node
    pub reject_report_to_for_root: bool,
}

impl Default for HierarchyPolicy {
    fn default() -> Self {
        Self {
            root_deletion: RootDeletion::WhenChildless,
            role_mutable: true,
            reject_report_to_for_root: false,
        }
    }
}
