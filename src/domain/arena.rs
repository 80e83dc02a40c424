use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{NodeId, NodeKind};
use crate::domain::error::{DomainError, DomainResult};

/// Data payload for tree nodes: one category or requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Stable identifier of the node
    pub id: NodeId,
    /// Category or requirement
    pub kind: NodeKind,
    /// Display code, e.g. "1.2.3"
    pub code: String,
    /// Display title
    pub title: String,
    /// 1-based depth, only used for default seeding
    pub level: u32,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} {}", self.code, self.title)
        }
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    /// Category or requirement data for this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in display order
    pub children: Vec<Index>,
}

impl TreeNode {
    /// Childless nodes carry stored weights: requirements and empty categories.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-based forest of requirement trees.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Nodes are also indexed by their [`NodeId`]. The structure is built once from
/// a snapshot and never changes shape afterwards.
#[derive(Debug)]
pub struct TreeArena {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Root nodes in display order
    roots: Vec<Index>,
    /// Lookup from node id to arena index
    ids: HashMap<NodeId, Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
            ids: HashMap::new(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let id = data.id.clone();
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.roots.push(node_idx);
        }
        self.ids.insert(id, node_idx);

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, id: &NodeId) -> Option<Index> {
        self.ids.get(id).copied()
    }

    /// Resolve an id, failing with [`DomainError::NodeNotFound`].
    pub fn lookup(&self, id: &NodeId) -> DomainResult<Index> {
        self.index_of(id)
            .ok_or_else(|| DomainError::NodeNotFound(id.clone()))
    }

    pub fn node(&self, id: &NodeId) -> Option<&TreeNode> {
        self.index_of(id).and_then(|idx| self.get_node(idx))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.ids.contains_key(id)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    /// Children of `parent`, or the roots when `parent` is None.
    pub fn children_of(&self, parent: Option<Index>) -> &[Index] {
        match parent {
            Some(idx) => self
                .get_node(idx)
                .map(|n| n.children.as_slice())
                .unwrap_or(&[]),
            None => &self.roots,
        }
    }

    pub fn parent_of(&self, idx: Index) -> Option<Index> {
        self.get_node(idx).and_then(|n| n.parent)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal over the whole forest, roots in order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.roots.clone())
    }

    /// Pre-order traversal of the subtree rooted at `idx`.
    pub fn iter_subtree(&self, idx: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, vec![idx])
    }

    /// Post-order traversal: children are yielded before their parent.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Childless descendants of `idx` in pre-order, `idx` itself if it is a leaf.
    pub fn leaf_descendants(&self, idx: Index) -> Vec<Index> {
        self.iter_subtree(idx)
            .filter(|(_, node)| node.is_leaf())
            .map(|(i, _)| i)
            .collect()
    }

    /// Ids of all childless nodes in the forest.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.data.id.clone())
            .collect()
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena, mut start: Vec<Index>) -> Self {
        start.reverse();
        Self {
            arena,
            stack: start,
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let stack = arena.roots().iter().rev().map(|&r| (r, false)).collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(id: &str, kind: NodeKind, level: u32) -> NodeData {
        NodeData {
            id: NodeId::from(id),
            kind,
            code: String::new(),
            title: id.to_string(),
            level,
        }
    }

    //   a        d
    //  / \
    // b   c
    fn sample() -> TreeArena {
        let mut tree = TreeArena::new();
        let a = tree.insert_node(data("a", NodeKind::Category, 1), None);
        tree.insert_node(data("b", NodeKind::Requirement, 2), Some(a));
        tree.insert_node(data("c", NodeKind::Requirement, 2), Some(a));
        tree.insert_node(data("d", NodeKind::Category, 1), None);
        tree
    }

    fn ids<'a>(it: impl Iterator<Item = (Index, &'a TreeNode)>) -> Vec<String> {
        it.map(|(_, n)| n.data.id.to_string()).collect()
    }

    #[test]
    fn given_forest_when_iterating_then_preorder_across_roots() {
        let tree = sample();
        assert_eq!(ids(tree.iter()), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn given_forest_when_iterating_postorder_then_children_first() {
        let tree = sample();
        assert_eq!(ids(tree.iter_postorder()), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn given_forest_when_collecting_leaves_then_includes_empty_category() {
        let tree = sample();
        let leaves: Vec<String> = tree.leaf_nodes().iter().map(|i| i.to_string()).collect();
        assert_eq!(leaves, vec!["b", "c", "d"]);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn given_unknown_id_when_lookup_then_node_not_found() {
        let tree = sample();
        assert_eq!(
            tree.lookup(&"zz".into()),
            Err(DomainError::NodeNotFound("zz".into()))
        );
    }
}
