//! Effective weight resolution and local percentage projection.
//!
//! Effective weights are always derived bottom-up: a leaf's effective weight is
//! its stored weight, a category's is the sum over its direct children.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::instrument;

use crate::domain::arena::TreeArena;
use crate::domain::entities::{NodeId, WeightMap, EPSILON};

/// Per-node numeric values keyed by node id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeValues {
    values: HashMap<NodeId, f64>,
}

impl NodeValues {
    /// Value for `id`, 0 when absent.
    pub fn get(&self, id: &NodeId) -> f64 {
        self.values.get(id).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }
}

/// Absolute effective weight per node.
pub type EffectiveWeights = NodeValues;
/// Local percentage per node, relative to the parent's effective weight.
pub type LocalPercentages = NodeValues;

/// Resolve every node's effective weight in one post-order pass.
#[instrument(level = "trace", skip_all)]
pub fn resolve_effective(tree: &TreeArena, weights: &WeightMap) -> EffectiveWeights {
    let mut by_index: HashMap<Index, f64> = HashMap::with_capacity(tree.len());
    let mut values = HashMap::with_capacity(tree.len());

    for (idx, node) in tree.iter_postorder() {
        let effective = if node.is_leaf() {
            weights.get(&node.data.id)
        } else {
            node.children
                .iter()
                .map(|c| by_index.get(c).copied().unwrap_or(0.0))
                .sum()
        };
        by_index.insert(idx, effective);
        values.insert(node.data.id.clone(), effective);
    }

    NodeValues { values }
}

/// Effective weight of a single subtree: the sum of its leaves' stored weights.
pub fn subtree_effective(tree: &TreeArena, weights: &WeightMap, idx: Index) -> f64 {
    tree.leaf_descendants(idx)
        .into_iter()
        .filter_map(|leaf| tree.get_node(leaf))
        .map(|node| weights.get(&node.data.id))
        .sum()
}

/// Local percentage of `effective` against `parent_effective`, guarded against
/// near-zero parents.
pub fn local_percentage(effective: f64, parent_effective: f64) -> f64 {
    if parent_effective < EPSILON {
        0.0
    } else {
        effective / parent_effective * 100.0
    }
}

/// Project effective weights to local percentages in one top-down pass.
///
/// Roots are measured against an implicit parent effective weight of 1.
#[instrument(level = "trace", skip_all)]
pub fn project_local(tree: &TreeArena, effective: &EffectiveWeights) -> LocalPercentages {
    let mut values = HashMap::with_capacity(tree.len());

    for (_, node) in tree.iter() {
        let parent_effective = node
            .parent
            .and_then(|p| tree.get_node(p))
            .map(|p| effective.get(&p.data.id))
            .unwrap_or(1.0);
        let local = local_percentage(effective.get(&node.data.id), parent_effective);
        values.insert(node.data.id.clone(), local);
    }

    NodeValues { values }
}
