//! In-memory NodeStore. Not persistent.
//!
//! Enforces the same write-time constraints as `TursoStore` (unique role,
//! single root, existing parent, no delete with remaining reports) so the
//! hierarchy service behaves identically on either backend. Used for tests
//! and for `ORGCHART_STORE=memory` runs.
//!
//! Multi-record writes are staged on a copy of the table and swapped in only
//! when every write succeeded, so readers never observe a partial batch.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::error::{StoreError, UniqueConstraint};
use crate::db::node_store::NodeStore;
use crate::models::{BatchWrite, NodePatch, OrgNode};

/// Rows in insertion order
#[derive(Debug, Clone, Default)]
struct Table {
    rows: Vec<OrgNode>,
}

impl Table {
    fn position(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|n| n.id == id)
    }

    fn get(&self, id: &str) -> Option<&OrgNode> {
        self.rows.iter().find(|n| n.id == id)
    }

    /// Check role, root and parent constraints for `node` as if it were
    /// stored at `slot` (None for a fresh insert)
    fn check(&self, node: &OrgNode, slot: Option<usize>) -> Result<(), StoreError> {
        let others = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != slot)
            .map(|(_, n)| n);

        for other in others {
            if other.role == node.role {
                return Err(StoreError::unique_violation(
                    UniqueConstraint::Role,
                    format!("role '{}' is held by {}", node.role, other.id),
                ));
            }
            if node.parent_id.is_none() && other.parent_id.is_none() {
                return Err(StoreError::unique_violation(
                    UniqueConstraint::SingleRoot,
                    format!("{} is already the root", other.id),
                ));
            }
        }

        if let Some(parent_id) = &node.parent_id {
            if self.get(parent_id).is_none() {
                return Err(StoreError::missing_reference(parent_id.clone()));
            }
        }

        Ok(())
    }

    fn insert(&mut self, node: OrgNode) -> Result<(), StoreError> {
        if self.get(&node.id).is_some() {
            return Err(StoreError::unique_violation(
                UniqueConstraint::Id,
                format!("id '{}' already exists", node.id),
            ));
        }
        self.check(&node, None)?;
        self.rows.push(node);
        Ok(())
    }

    fn update(&mut self, id: &str, patch: &NodePatch) -> Result<OrgNode, StoreError> {
        let slot = self.position(id).ok_or_else(|| StoreError::not_found(id))?;

        let mut node = self.rows[slot].clone();
        patch.apply_to(&mut node);
        self.check(&node, Some(slot))?;

        self.rows[slot] = node.clone();
        Ok(node)
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let slot = self.position(id).ok_or_else(|| StoreError::not_found(id))?;

        if self.rows.iter().any(|n| n.parent_id.as_deref() == Some(id)) {
            return Err(StoreError::missing_reference(id));
        }

        self.rows.remove(slot);
        Ok(())
    }

    fn apply(&mut self, write: &BatchWrite) -> Result<(), StoreError> {
        match write {
            BatchWrite::Reparent { id, parent_id } => {
                let patch = NodePatch {
                    parent_id: Some(parent_id.clone()),
                    ..Default::default()
                };
                self.update(id, &patch).map(|_| ())
            }
            BatchWrite::Delete { id } => self.delete(id),
        }
    }

    fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a OrgNode> + 'a {
        self.rows
            .iter()
            .filter(move |n| n.parent_id.as_deref() == Some(id))
    }

    /// Level-by-level walk, each level in insertion order
    ///
    /// Bounded by the row count, matching the recursive query in `TursoStore`.
    fn subtree(&self, id: &str) -> Vec<OrgNode> {
        let Some(start) = self.get(id) else {
            return Vec::new();
        };

        let mut result = vec![start.clone()];
        let mut level: Vec<&str> = vec![start.id.as_str()];
        let mut depth = 0;

        while !level.is_empty() && depth < self.rows.len() {
            let parents: HashSet<&str> = level.iter().copied().collect();
            let next: Vec<&OrgNode> = self
                .rows
                .iter()
                .filter(|n| {
                    n.parent_id
                        .as_deref()
                        .is_some_and(|p| parents.contains(p))
                })
                .collect();

            result.extend(next.iter().map(|n| (*n).clone()));
            level = next.iter().map(|n| n.id.as_str()).collect();
            depth += 1;
        }

        result
    }
}

/// NodeStore backed by a lock-protected vector
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Table>>,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row without any constraint checks
    ///
    /// Lets tests build corrupt hierarchies (cycles, several roots) that the
    /// checked write path refuses.
    pub async fn insert_unchecked(&self, node: OrgNode) {
        self.inner.write().await.rows.push(node);
    }
}

#[async_trait]
impl NodeStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<OrgNode>, StoreError> {
        Ok(self.inner.read().await.get(id).cloned())
    }

    async fn find_by_role(&self, role: &str) -> Result<Option<OrgNode>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.rows.iter().find(|n| n.role == role).cloned())
    }

    async fn find_roots(&self) -> Result<Vec<OrgNode>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.rows.iter().filter(|n| n.is_root()).cloned().collect())
    }

    async fn find_all(&self) -> Result<Vec<OrgNode>, StoreError> {
        Ok(self.inner.read().await.rows.clone())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.rows.len())
    }

    async fn find_direct_children(&self, id: &str) -> Result<Vec<OrgNode>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.children_of(id).cloned().collect())
    }

    async fn find_subtree(&self, id: &str) -> Result<Vec<OrgNode>, StoreError> {
        Ok(self.inner.read().await.subtree(id))
    }

    async fn create(&self, node: OrgNode) -> Result<OrgNode, StoreError> {
        self.inner.write().await.insert(node.clone())?;
        Ok(node)
    }

    async fn create_many(&self, nodes: Vec<OrgNode>) -> Result<Vec<OrgNode>, StoreError> {
        let mut guard = self.inner.write().await;
        let mut staged = guard.clone();
        for node in &nodes {
            staged.insert(node.clone())?;
        }
        *guard = staged;
        Ok(nodes)
    }

    async fn update(&self, id: &str, patch: NodePatch) -> Result<OrgNode, StoreError> {
        self.inner.write().await.update(id, &patch)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.write().await.delete(id)
    }

    async fn apply_batch(&self, writes: Vec<BatchWrite>) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let mut staged = guard.clone();
        for write in &writes {
            staged.apply(write)?;
        }
        *guard = staged;
        Ok(())
    }
}
