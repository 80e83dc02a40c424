//! Weight mutator: the only write path into a [`WeightMap`].
//!
//! Setting a category's share never discards how that share was split among its
//! descendants. A category that already carries weight is rescaled
//! proportionally; a category at zero is seeded with an even split over its
//! leaves.
//!
//! Every childless node is a leaf, empty categories included, so a category
//! that is not a leaf always has at least one leaf descendant to carry its
//! share. An empty category takes its weight directly, like a requirement.

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::domain::arena::TreeArena;
use crate::domain::entities::{is_zero, NodeId, WeightMap};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::resolver::subtree_effective;

/// How a target weight ended up in the stored weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    /// Written directly to a childless node
    Stored,
    /// Spread evenly over leaves of a category at zero
    EvenSplit { leaves: usize },
    /// Leaves of a weighted category multiplied by `ratio`
    Rescaled { ratio: f64 },
    /// Index no longer in the tree: nothing to store against
    Dropped,
}

/// Set a node's share of its parent to `new_local_pct` percent.
///
/// Roots are measured against an implicit parent weight of 1. Negative
/// percentages are clamped to zero. Returns the absolute target weight.
#[instrument(level = "debug", skip(tree, weights))]
pub fn set_local_percentage(
    tree: &TreeArena,
    weights: &mut WeightMap,
    node_id: &NodeId,
    new_local_pct: f64,
) -> DomainResult<f64> {
    let idx = tree.lookup(node_id)?;
    if !new_local_pct.is_finite() {
        return Err(DomainError::InvalidPercentage {
            id: node_id.clone(),
            value: new_local_pct,
        });
    }

    let parent_effective = tree
        .parent_of(idx)
        .map(|p| subtree_effective(tree, weights, p))
        .unwrap_or(1.0);
    let target = (new_local_pct.max(0.0) / 100.0 * parent_effective).max(0.0);

    let outcome = apply_target(tree, weights, idx, target);
    debug!(%node_id, target, ?outcome, "local percentage applied");
    Ok(target)
}

/// Give every sibling an equal share of the total.
///
/// The total is the parent's effective weight, or the siblings' combined
/// effective weight at root level. A zero total leaves everything untouched.
#[instrument(level = "debug", skip(tree, weights))]
pub fn equidistribute(
    tree: &TreeArena,
    weights: &mut WeightMap,
    parent_id: Option<&NodeId>,
    sibling_ids: &[NodeId],
) -> DomainResult<()> {
    let parent_idx = parent_id.map(|p| tree.lookup(p)).transpose()?;

    let siblings: Vec<Index> = sibling_ids
        .iter()
        .unique()
        .map(|id| {
            let idx = tree.lookup(id)?;
            if tree.parent_of(idx) != parent_idx {
                return Err(DomainError::NotASibling {
                    id: id.clone(),
                    parent: parent_id.cloned(),
                });
            }
            Ok(idx)
        })
        .collect::<DomainResult<_>>()?;

    if siblings.is_empty() {
        return Ok(());
    }

    let total = match parent_idx {
        Some(p) => subtree_effective(tree, weights, p),
        None => siblings
            .iter()
            .map(|&s| subtree_effective(tree, weights, s))
            .sum(),
    };
    if is_zero(total) {
        debug!("equidistribute: total is zero, nothing to distribute");
        return Ok(());
    }

    let per_child = total / siblings.len() as f64;
    for idx in siblings {
        apply_target(tree, weights, idx, per_child);
    }
    Ok(())
}

/// Make the subtree at `idx` resolve to `target`.
pub fn apply_target(
    tree: &TreeArena,
    weights: &mut WeightMap,
    idx: Index,
    target: f64,
) -> Distribution {
    let Some(node) = tree.get_node(idx) else {
        warn!(?idx, target, "node not in tree, weight dropped");
        return Distribution::Dropped;
    };
    let target = target.max(0.0);

    if node.is_leaf() {
        weights.set(node.data.id.clone(), target);
        return Distribution::Stored;
    }

    let leaves = tree.leaf_descendants(idx);
    let current = subtree_effective(tree, weights, idx);

    if is_zero(current) {
        let share = target / leaves.len() as f64;
        for leaf in &leaves {
            if let Some(leaf_node) = tree.get_node(*leaf) {
                weights.set(leaf_node.data.id.clone(), share);
            }
        }
        Distribution::EvenSplit {
            leaves: leaves.len(),
        }
    } else {
        let ratio = target / current;
        for leaf in &leaves {
            if let Some(leaf_node) = tree.get_node(*leaf) {
                let id = &leaf_node.data.id;
                let scaled = weights.get(id) * ratio;
                weights.set(id.clone(), scaled);
            }
        }
        Distribution::Rescaled { ratio }
    }
}
