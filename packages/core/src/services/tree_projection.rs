//! Tree Projection
//!
//! Converts flat parent-linked rows into nested `OrgTree` views.
//!
//! Construction goes through an adjacency list (`parent_id → child indexes`,
//! in input order) and walks it with an explicit stack, so neither deep
//! hierarchies nor corrupt cyclic data can overflow the call stack or loop.

use crate::models::{OrgNode, OrgTree};
use std::collections::HashMap;
use thiserror::Error;

/// Structural problems found while projecting rows
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// Parent links loop back on themselves around `id`
    #[error("Cycle in parent links involving node {id}")]
    Cycle { id: String },

    /// The same id appears more than once in the input
    #[error("Duplicate node id in input: {id}")]
    DuplicateId { id: String },
}

/// Index rows by id and group child indexes under their parent id
struct Adjacency<'a> {
    index: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> Adjacency<'a> {
    fn build(nodes: &'a [OrgNode]) -> Result<Self, ProjectionError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(ProjectionError::DuplicateId {
                    id: node.id.clone(),
                });
            }
        }

        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            if let Some(parent_id) = node.parent_id.as_deref() {
                if index.contains_key(parent_id) {
                    children.entry(parent_id).or_default().push(i);
                }
            }
        }

        Ok(Self { index, children })
    }

    fn children_of(&self, node: &OrgNode) -> &[usize] {
        self.children
            .get(node.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A node is a root if it has no parent or its parent is not in the input
    fn is_root(&self, node: &OrgNode) -> bool {
        node.parent_id
            .as_deref()
            .map_or(true, |parent_id| !self.index.contains_key(parent_id))
    }
}

struct Frame {
    index: usize,
    next_child: usize,
    children: Vec<OrgTree>,
}

impl Frame {
    fn new(index: usize) -> Self {
        Self {
            index,
            next_child: 0,
            children: Vec::new(),
        }
    }
}

/// Depth-first build of the tree under `root`, marking every node reached
fn build(
    root: usize,
    nodes: &[OrgNode],
    adjacency: &Adjacency<'_>,
    visited: &mut [bool],
) -> Result<OrgTree, ProjectionError> {
    visited[root] = true;
    let mut stack = vec![Frame::new(root)];

    while let Some(frame) = stack.last_mut() {
        let kids = adjacency.children_of(&nodes[frame.index]);

        if let Some(&child) = kids.get(frame.next_child) {
            frame.next_child += 1;
            if visited[child] {
                return Err(ProjectionError::Cycle {
                    id: nodes[child].id.clone(),
                });
            }
            visited[child] = true;
            stack.push(Frame::new(child));
            continue;
        }

        let Some(done) = stack.pop() else { break };
        let tree = OrgTree {
            node: nodes[done.index].clone(),
            children: done.children,
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(tree),
            None => return Ok(tree),
        }
    }

    unreachable!("the root frame is only popped by returning its tree")
}

/// Project every row into a forest
///
/// Roots are rows without a parent or whose parent is absent from the input.
/// Rows that no root reaches sit on a cycle and are reported as one.
///
/// ```rust
/// use orgchart_core::models::OrgNode;
/// use orgchart_core::services::tree_projection::project_forest;
///
/// let ceo = OrgNode::new("Alice", "CEO", "", None);
/// let vp = OrgNode::new("Bob", "VP", "", Some(ceo.id.clone()));
///
/// let forest = project_forest(&[ceo, vp]).unwrap();
/// assert_eq!(forest.len(), 1);
/// assert_eq!(forest[0].children.len(), 1);
/// ```
pub fn project_forest(nodes: &[OrgNode]) -> Result<Vec<OrgTree>, ProjectionError> {
    let adjacency = Adjacency::build(nodes)?;
    let mut visited = vec![false; nodes.len()];
    let mut forest = Vec::new();

    for (i, node) in nodes.iter().enumerate() {
        if adjacency.is_root(node) {
            forest.push(build(i, nodes, &adjacency, &mut visited)?);
        }
    }

    if let Some(stranded) = visited.iter().position(|seen| !seen) {
        return Err(ProjectionError::Cycle {
            id: nodes[stranded].id.clone(),
        });
    }

    Ok(forest)
}

/// Project the tree rooted at `root_id`
///
/// Returns `Ok(None)` when `root_id` is not in the input. Rows outside the
/// subtree are ignored.
pub fn project_subtree(
    root_id: &str,
    nodes: &[OrgNode],
) -> Result<Option<OrgTree>, ProjectionError> {
    let adjacency = Adjacency::build(nodes)?;
    let Some(&root) = adjacency.index.get(root_id) else {
        return Ok(None);
    };

    let mut visited = vec![false; nodes.len()];
    build(root, nodes, &adjacency, &mut visited).map(Some)
}

#[cfg(test)]
#[path = "tree_projection_test.rs"]
mod tree_projection_test;
