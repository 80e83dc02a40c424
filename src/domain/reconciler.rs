//! Default seeding and reconciliation of persisted absolute weights.
//!
//! Storage holds absolute, bottom-up weights for categories and requirements;
//! editing works on stored leaf weights. Reconciliation rebuilds the stored
//! leaf weights from whatever subset of absolute weights was persisted.

use std::collections::BTreeMap;

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::TreeArena;
use crate::domain::entities::{NodeId, PersistedWeights, WeightMap};

/// Flat first-use default: every node at a level gets `1 / nodes_at_level`.
#[instrument(level = "debug", skip_all)]
pub fn seed_defaults(tree: &TreeArena) -> WeightMap {
    let per_level = tree.iter().map(|(_, n)| n.data.level).counts();

    tree.iter()
        .map(|(_, node)| {
            let count = per_level.get(&node.data.level).copied().unwrap_or(1);
            (node.data.id.clone(), 1.0 / count as f64)
        })
        .collect()
}

/// Rebuild stored weights from persisted absolute weights.
///
/// Persisted leaves are taken as-is. Below every persisted category (and below
/// the forest, which owns 1.0) the unpersisted leaves share evenly whatever the
/// persisted nodes leave over, looking through unpersisted categories in
/// between. Falls back to [`seed_defaults`] when nothing persisted matches the
/// tree.
#[instrument(level = "debug", skip_all)]
pub fn reconcile_loaded(tree: &TreeArena, persisted: &PersistedWeights) -> WeightMap {
    let lookup = persisted.merged();

    let unknown = lookup.keys().filter(|id| !tree.contains(id)).count();
    if unknown > 0 {
        debug!("ignoring {} persisted weights for nodes not in the tree", unknown);
    }
    if unknown == lookup.len() {
        debug!("no persisted weights for this tree, seeding defaults");
        return seed_defaults(tree);
    }

    let mut weights = WeightMap::new();
    let reconciler = Reconciler {
        tree,
        lookup: &lookup,
    };
    reconciler.reconcile_group(&mut weights, tree.roots(), 1.0);
    weights
}

struct Reconciler<'a> {
    tree: &'a TreeArena,
    lookup: &'a BTreeMap<NodeId, f64>,
}

impl Reconciler<'_> {
    /// Spend `budget` on the subtrees below `group`.
    ///
    /// Unpersisted categories are transparent: the frontier runs through them
    /// down to the first persisted node or unpersisted leaf on every path.
    /// Persisted nodes keep their value, open leaves share what is left evenly.
    fn reconcile_group(&self, weights: &mut WeightMap, group: &[Index], budget: f64) {
        let mut fixed = Vec::new();
        let mut open = Vec::new();
        self.collect_frontier(group, &mut fixed, &mut open);

        let used: f64 = fixed.iter().map(|(_, value)| value).sum();
        for (idx, value) in fixed {
            let Some(node) = self.tree.get_node(idx) else {
                continue;
            };
            if node.is_leaf() {
                weights.set(node.data.id.clone(), value);
            } else {
                self.reconcile_group(weights, &node.children, value);
            }
        }

        if open.is_empty() {
            return;
        }
        let share = (budget - used).max(0.0) / open.len() as f64;
        for leaf in open {
            if let Some(node) = self.tree.get_node(leaf) {
                weights.set(node.data.id.clone(), share);
            }
        }
    }

    fn collect_frontier(
        &self,
        group: &[Index],
        fixed: &mut Vec<(Index, f64)>,
        open: &mut Vec<Index>,
    ) {
        for &idx in group {
            let Some(node) = self.tree.get_node(idx) else {
                continue;
            };
            match self.lookup.get(&node.data.id) {
                Some(&value) => fixed.push((idx, value)),
                None if node.is_leaf() => open.push(idx),
                None => self.collect_frontier(&node.children, fixed, open),
            }
        }
    }
}
