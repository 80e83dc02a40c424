//! Tree builder: turns an external snapshot into a [`TreeArena`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::entities::{NodeId, NodeKind};
use crate::domain::error::{DomainError, DomainResult};

/// One node of a flat snapshot; children are referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: NodeId,
    #[serde(alias = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

/// Flat snapshot: roots are the nodes nobody lists as a child.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub nodes: Vec<SnapshotNode>,
}

/// Nested snapshot node, as served by the requirement tree endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedNode {
    pub id: NodeId,
    #[serde(alias = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub children: Vec<NestedNode>,
}

fn default_level() -> u32 {
    1
}

impl TreeSnapshot {
    /// Flatten a nested forest into id-referencing nodes, keeping pre-order.
    pub fn from_nested(roots: &[NestedNode]) -> Self {
        let mut nodes = Vec::new();
        let mut stack: Vec<&NestedNode> = roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            nodes.push(SnapshotNode {
                id: node.id.clone(),
                kind: node.kind,
                code: node.code.clone(),
                title: node.title.clone(),
                level: node.level,
                children: node.children.iter().map(|c| c.id.clone()).collect(),
            });
            stack.extend(node.children.iter().rev());
        }
        Self { nodes }
    }
}

/// Constructs the arena forest from a snapshot, validating its shape.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    visited: HashSet<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "debug", skip(self, snapshot), fields(nodes = snapshot.nodes.len()))]
    pub fn build(&mut self, snapshot: &TreeSnapshot) -> DomainResult<TreeArena> {
        self.visited.clear();

        let mut by_id: HashMap<&NodeId, &SnapshotNode> = HashMap::new();
        for node in &snapshot.nodes {
            if by_id.insert(&node.id, node).is_some() {
                return Err(DomainError::DuplicateNode(node.id.clone()));
            }
        }

        // Record parents, rejecting dangling and shared children
        let mut parent_of: HashMap<&NodeId, &NodeId> = HashMap::new();
        for node in &snapshot.nodes {
            if node.kind == NodeKind::Requirement && !node.children.is_empty() {
                return Err(DomainError::RequirementWithChildren(node.id.clone()));
            }
            for child in &node.children {
                if !by_id.contains_key(child) {
                    return Err(DomainError::UnknownChild {
                        parent: node.id.clone(),
                        child: child.clone(),
                    });
                }
                if let Some(first) = parent_of.insert(child, &node.id) {
                    return Err(DomainError::MultipleParents {
                        child: child.clone(),
                        first: first.clone(),
                        second: node.id.clone(),
                    });
                }
            }
        }

        let roots: Vec<&SnapshotNode> = snapshot
            .nodes
            .iter()
            .filter(|n| !parent_of.contains_key(&n.id))
            .collect();

        // Every node has exactly one parent: no roots means the whole snapshot is a cycle
        if roots.is_empty() {
            if let Some(first) = snapshot.nodes.first() {
                return Err(DomainError::CycleDetected(first.id.clone()));
            }
        }

        let mut tree = TreeArena::new();
        for root in roots {
            self.build_subtree(&mut tree, root, &by_id)?;
        }

        // Nodes unreachable from any root sit on a cycle
        if let Some(orphan) = snapshot.nodes.iter().find(|n| !self.visited.contains(&n.id)) {
            return Err(DomainError::CycleDetected(orphan.id.clone()));
        }

        debug!("built tree with {} nodes, depth {}", tree.len(), tree.depth());
        Ok(tree)
    }

    fn build_subtree(
        &mut self,
        tree: &mut TreeArena,
        root: &SnapshotNode,
        by_id: &HashMap<&NodeId, &SnapshotNode>,
    ) -> DomainResult<()> {
        let mut stack = vec![(root, None)];

        while let Some((current, parent_idx)) = stack.pop() {
            // Cycle detection
            if !self.visited.insert(current.id.clone()) {
                return Err(DomainError::CycleDetected(current.id.clone()));
            }

            let node_data = NodeData {
                id: current.id.clone(),
                kind: current.kind,
                code: current.code.clone(),
                title: current.title.clone(),
                level: current.level,
            };
            let current_idx = tree.insert_node(node_data, parent_idx);

            // Reverse push keeps children in snapshot order
            for child_id in current.children.iter().rev() {
                if let Some(&child) = by_id.get(child_id) {
                    stack.push((child, Some(current_idx)));
                }
            }
        }
        Ok(())
    }
}
