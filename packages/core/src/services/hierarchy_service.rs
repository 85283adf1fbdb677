//! Hierarchy Service - Reporting Tree Business Rules
//!
//! This module provides the business logic layer over a `NodeStore`:
//!
//! - Insert (first node becomes the root, later nodes report to an existing one)
//! - Reads composed into nested views (whole organization, subtree by id or role)
//! - Update with reparenting guarded against cycles
//! - Delete with reattachment of direct reports to the grandparent
//!
//! # Invariants
//!
//! After every successful write the hierarchy has at most one root, unique
//! roles, no cycles, and no parent reference to a missing node. The service
//! pre-checks each rule to report a precise error; the store enforces the
//! same rules at write time, and its verdict wins when a concurrent request
//! slipped in between check and write.
//!
//! # Ordering
//!
//! Each operation performs its reads, then at most one store write (a single
//! insert, update, or atomic batch). A failed validation therefore never
//! leaves partial state behind.

use crate::db::{NodeStore, StoreError, UniqueConstraint};
use crate::models::{
    non_blank, BatchWrite, CreateOutcome, NewOrgNode, NodeDetail, NodePatch, OrgNode,
    OrgNodeUpdate, OrgTree,
};
use crate::services::error::HierarchyError;
use crate::services::policy::{HierarchyPolicy, RootDeletion};
use crate::services::tree_projection::{project_forest, project_subtree};
use std::collections::HashSet;
use std::sync::Arc;

/// Business-rule layer for the reporting tree
///
/// Cheap to clone; every clone shares the same store.
///
/// # Examples
///
/// ```rust
/// use orgchart_core::db::InMemoryStore;
/// use orgchart_core::models::NewOrgNode;
/// use orgchart_core::services::HierarchyService;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = HierarchyService::new(Arc::new(InMemoryStore::new()));
///
/// let ceo = service.create_role(NewOrgNode::new("Alice", "CEO")).await?;
/// let vp = service
///     .create_role(NewOrgNode::new("Bob", "VP").reporting_to(ceo.node.id.clone()))
///     .await?;
///
/// let children = service.list_children(&ceo.node.id).await?;
/// assert_eq!(children[0].id, vp.node.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HierarchyService {
    store: Arc<dyn NodeStore>,
    policy: HierarchyPolicy,
}

impl HierarchyService {
    /// Create a service with the default policy
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self::with_policy(store, HierarchyPolicy::default())
    }

    pub fn with_policy(store: Arc<dyn NodeStore>, policy: HierarchyPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &HierarchyPolicy {
        &self.policy
    }

    /// Insert a node, optionally together with nested direct reports
    ///
    /// # Rules
    ///
    /// - Empty organization: the node becomes the root. A supplied
    ///   `report_to` is ignored, or rejected when
    ///   `policy.reject_report_to_for_root` is set.
    /// - Otherwise `report_to` is required and must name an existing node.
    /// - Every role in the request must be new, and distinct within the request.
    /// - A node with children is written as one atomic batch.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: blank name/role, missing or rejected `report_to`
    /// - `NotFound`: `report_to` names a missing node
    /// - `Conflict`: role already taken (including the root's role)
    pub async fn create_role(&self, request: NewOrgNode) -> Result<CreateOutcome, HierarchyError> {
        let roles = Self::validate_family(&request)?;

        let roots = self.store.find_roots().await?;
        let parent_id = if roots.is_empty() {
            if let Some(hint) = non_blank(&request.report_to) {
                if self.policy.reject_report_to_for_root {
                    return Err(HierarchyError::invalid_request(
                        "The first node becomes the root and cannot report to anyone",
                    ));
                }
                tracing::warn!(
                    "Ignoring reportTo '{}' for {}: first node becomes the root",
                    hint,
                    request.role
                );
            }
            None
        } else {
            let Some(report_to) = non_blank(&request.report_to) else {
                return Err(HierarchyError::invalid_request(
                    "reportTo is required once the organization has a root",
                ));
            };

            if let Some(root) = roots.iter().find(|root| roles.contains(root.role.as_str())) {
                return Err(HierarchyError::conflict(format!(
                    "Role '{}' is held by the root node",
                    root.role
                )));
            }

            let parent = self
                .store
                .find_by_id(report_to)
                .await?
                .ok_or_else(|| HierarchyError::parent_not_found(report_to))?;
            Some(parent.id)
        };

        for role in &roles {
            if self.store.find_by_role(role).await?.is_some() {
                return Err(HierarchyError::conflict(format!(
                    "Role '{}' already exists",
                    role
                )));
            }
        }

        let mut records = Self::flatten_family(&request, parent_id);
        let created = match records.len() {
            1 => {
                let node = records.remove(0);
                vec![self.store.create(node).await.map_err(Self::write_error)?]
            }
            _ => self
                .store
                .create_many(records)
                .await
                .map_err(Self::write_error)?,
        };

        let mut created = created.into_iter();
        let node = created
            .next()
            .ok_or_else(|| HierarchyError::inconsistency("Insert returned no rows"))?;
        let child_ids: Vec<String> = created.map(|child| child.id).collect();

        tracing::info!(
            "Created node {} ({}) with {} reports",
            node.id,
            node.role,
            child_ids.len()
        );
        Ok(CreateOutcome { node, child_ids })
    }

    /// Whole organization as a forest (normally one tree, or none when empty)
    pub async fn list_organization(&self) -> Result<Vec<OrgTree>, HierarchyError> {
        let nodes = self.store.find_all().await?;
        let forest = project_forest(&nodes)?;
        tracing::debug!("Projected {} nodes into {} trees", nodes.len(), forest.len());
        Ok(forest)
    }

    /// Subtree rooted at `id`, plus the node it reports to
    pub async fn get_node(&self, id: &str) -> Result<NodeDetail, HierarchyError> {
        let node = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(id))?;
        self.detail(node).await
    }

    /// Same view as `get_node`, looked up by role
    pub async fn get_node_by_role(&self, role: &str) -> Result<NodeDetail, HierarchyError> {
        let node = self
            .store
            .find_by_role(role)
            .await?
            .ok_or_else(|| HierarchyError::role_not_found(role))?;
        self.detail(node).await
    }

    /// Direct reports of `id`, in insertion order
    pub async fn list_children(&self, id: &str) -> Result<Vec<OrgNode>, HierarchyError> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(HierarchyError::node_not_found(id));
        }
        Ok(self.store.find_direct_children(id).await?)
    }

    /// Apply a partial update, optionally moving the node under a new parent
    ///
    /// Blank fields are treated as absent. Reparenting is refused when the
    /// new parent is the node itself or any of its descendants.
    ///
    /// # Errors
    ///
    /// - `NotFound`: target or new parent missing
    /// - `InvalidRequest`: nothing to update, self-report, immutable role
    /// - `Conflict`: cycle, or role taken by another node
    /// - `InternalInconsistency`: the stored ancestor chain does not end at a root
    pub async fn update_node(
        &self,
        id: &str,
        update: OrgNodeUpdate,
    ) -> Result<NodeDetail, HierarchyError> {
        let target = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(id))?;

        if update.is_empty() {
            return Err(HierarchyError::invalid_request("Nothing to update"));
        }

        let mut patch = NodePatch::default();

        if let Some(report_to) = non_blank(&update.report_to) {
            if report_to == target.id {
                return Err(HierarchyError::invalid_request(
                    "A node cannot report to itself",
                ));
            }

            let candidate = self
                .store
                .find_by_id(report_to)
                .await?
                .ok_or_else(|| HierarchyError::parent_not_found(report_to))?;

            if candidate.parent_id.as_deref() == Some(target.id.as_str()) {
                tracing::warn!(
                    "Rejected reparent of {} under its direct report {}",
                    target.id,
                    candidate.id
                );
                return Err(HierarchyError::conflict(format!(
                    "'{}' reports directly to '{}'; the move would create a cycle",
                    candidate.role, target.role
                )));
            }

            self.ensure_not_descendant(&target, &candidate).await?;
            patch.parent_id = Some(Some(candidate.id));
        }

        if let Some(name) = non_blank(&update.name) {
            patch.name = Some(name.to_string());
        }
        if let Some(description) = non_blank(&update.description) {
            patch.description = Some(description.to_string());
        }
        if let Some(role) = non_blank(&update.role) {
            if role != target.role {
                if !self.policy.role_mutable {
                    return Err(HierarchyError::invalid_request(
                        "Roles cannot be changed once assigned",
                    ));
                }
                if let Some(holder) = self.store.find_by_role(role).await? {
                    return Err(HierarchyError::conflict(format!(
                        "Role '{}' is already held by node {}",
                        role, holder.id
                    )));
                }
                patch.role = Some(role.to_string());
            }
        }

        let updated = self
            .store
            .update(id, patch)
            .await
            .map_err(Self::write_error)?;

        tracing::info!("Updated node {} ({})", updated.id, updated.role);
        self.detail(updated).await
    }

    /// Delete a node, handing its direct reports to its own parent
    ///
    /// Reattachment and removal are one atomic store batch. The root can only
    /// be deleted once it has no reports, and only if the policy allows it.
    pub async fn delete_node(&self, id: &str) -> Result<(), HierarchyError> {
        let target = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(id))?;

        let children = self.store.find_direct_children(id).await?;

        let Some(grandparent_id) = target.parent_id.clone() else {
            if !children.is_empty() {
                tracing::warn!(
                    "Rejected deletion of root {} with {} reports",
                    id,
                    children.len()
                );
                return Err(HierarchyError::conflict(format!(
                    "Cannot delete the root while {} node(s) report to it",
                    children.len()
                )));
            }
            if self.policy.root_deletion == RootDeletion::Never {
                return Err(HierarchyError::conflict("Root deletion is disabled"));
            }

            self.store.delete(id).await.map_err(Self::delete_error)?;
            tracing::info!("Deleted root node {}", id);
            return Ok(());
        };

        let reattached = children.len();
        let mut writes: Vec<BatchWrite> = children
            .into_iter()
            .map(|child| BatchWrite::Reparent {
                id: child.id,
                parent_id: Some(grandparent_id.clone()),
            })
            .collect();
        writes.push(BatchWrite::Delete { id: id.to_string() });

        self.store
            .apply_batch(writes)
            .await
            .map_err(Self::delete_error)?;

        tracing::info!(
            "Deleted node {} and reattached {} reports to {}",
            id,
            reattached,
            grandparent_id
        );
        Ok(())
    }

    /// Nested subtree under `node` plus its parent
    async fn detail(&self, node: OrgNode) -> Result<NodeDetail, HierarchyError> {
        let rows = self.store.find_subtree(&node.id).await?;
        let tree = project_subtree(&node.id, &rows)?
            .ok_or_else(|| HierarchyError::node_not_found(&node.id))?;

        let parent = match tree.node.parent_id.as_deref() {
            Some(parent_id) => self.store.find_by_id(parent_id).await?,
            None => None,
        };

        Ok(NodeDetail { tree, parent })
    }

    /// Walk the ancestors of `candidate` and fail if `target` is among them
    ///
    /// The walk is bounded by the node count. A longer chain, a revisited
    /// node, or a dangling parent link means the stored data is already
    /// inconsistent.
    async fn ensure_not_descendant(
        &self,
        target: &OrgNode,
        candidate: &OrgNode,
    ) -> Result<(), HierarchyError> {
        let limit = self.store.count().await?;
        let mut seen: HashSet<String> = HashSet::from([candidate.id.clone()]);
        let mut next = candidate.parent_id.clone();

        while let Some(current_id) = next {
            if current_id == target.id {
                tracing::warn!(
                    "Rejected reparent of {} under its descendant {}",
                    target.id,
                    candidate.id
                );
                return Err(HierarchyError::conflict(format!(
                    "'{}' is a descendant of '{}'; the move would create a cycle",
                    candidate.role, target.role
                )));
            }

            if seen.len() > limit || !seen.insert(current_id.clone()) {
                return Err(HierarchyError::inconsistency(format!(
                    "Ancestor chain of node {} does not reach a root",
                    candidate.id
                )));
            }

            let ancestor = self.store.find_by_id(&current_id).await?.ok_or_else(|| {
                HierarchyError::inconsistency(format!(
                    "Node {} is referenced as a parent but does not exist",
                    current_id
                ))
            })?;
            next = ancestor.parent_id;
        }

        Ok(())
    }

    /// Check names and roles of an insert payload and collect its roles
    fn validate_family(request: &NewOrgNode) -> Result<HashSet<&str>, HierarchyError> {
        let mut roles = HashSet::new();
        let mut stack = vec![request];

        while let Some(payload) = stack.pop() {
            if payload.name.trim().is_empty() {
                return Err(HierarchyError::invalid_request("name must not be blank"));
            }
            if payload.role.trim().is_empty() {
                return Err(HierarchyError::invalid_request("role must not be blank"));
            }
            if !roles.insert(payload.role.as_str()) {
                return Err(HierarchyError::conflict(format!(
                    "Role '{}' appears more than once in the request",
                    payload.role
                )));
            }
            stack.extend(payload.children.iter());
        }

        Ok(roles)
    }

    /// Turn a payload into records, parents before children (pre-order)
    fn flatten_family(request: &NewOrgNode, parent_id: Option<String>) -> Vec<OrgNode> {
        let mut records = Vec::with_capacity(request.family_size());
        let mut stack = vec![(request, parent_id)];

        while let Some((payload, parent_id)) = stack.pop() {
            let node = OrgNode::new(
                payload.name.clone(),
                payload.role.clone(),
                payload.description.clone(),
                parent_id,
            );
            for child in payload.children.iter().rev() {
                stack.push((child, Some(node.id.clone())));
            }
            records.push(node);
        }

        records
    }

    /// Map write-time store failures of inserts and updates
    fn write_error(err: StoreError) -> HierarchyError {
        match err {
            StoreError::UniqueViolation { constraint, .. } => match constraint {
                UniqueConstraint::Role => HierarchyError::conflict("Role already exists"),
                UniqueConstraint::SingleRoot => {
                    HierarchyError::conflict("The organization already has a root")
                }
                UniqueConstraint::Id => HierarchyError::conflict("Node id already exists"),
            },
            StoreError::MissingReference { id } => HierarchyError::parent_not_found(id),
            StoreError::NotFound { id } => HierarchyError::node_not_found(id),
            other => other.into(),
        }
    }

    /// Map store failures of deletes (both single and batched)
    fn delete_error(err: StoreError) -> HierarchyError {
        match err {
            StoreError::NotFound { id } => HierarchyError::node_not_found(id),
            StoreError::MissingReference { id } => HierarchyError::conflict(format!(
                "Reports of node {} changed during deletion",
                id
            )),
            StoreError::UniqueViolation { constraint, .. } => HierarchyError::conflict(format!(
                "Deletion violates the {} constraint",
                constraint
            )),
            other => other.into(),
        }
    }
}

#[cfg(test)]
#[path = "hierarchy_service_test.rs"]
mod hierarchy_service_test;
