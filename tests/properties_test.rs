//! Property tests over randomly shaped trees and weights

use proptest::prelude::*;
use proptest::sample::Index as Pick;

use rfpweights::domain::{
    equidistribute, flush, reconcile_loaded, resolve_effective, set_local_percentage,
    subtree_effective, NodeId, NodeKind, SnapshotNode, TreeArena, TreeBuilder, TreeSnapshot,
    WeightMap,
};

const MAX_NODES: usize = 16;
const TOL: f64 = 1e-9;
/// Largest change rounding to four places can make to one value.
const ROUNDING: f64 = 5e-5;

/// Node 0 is always a root; node i either starts a new root or hangs below an
/// earlier node. Nodes that end up with children become categories; a
/// childless node is an empty category when its `empty` flag is set.
fn build_tree(parents: &[Option<Pick>], empty: &[bool]) -> TreeArena {
    let count = parents.len() + 1;
    let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); count];
    for (offset, parent) in parents.iter().enumerate() {
        let i = offset + 1;
        if let Some(pick) = parent {
            children[pick.index(i)].push(node_id(i));
        }
    }
    let nodes = (0..count)
        .map(|i| SnapshotNode {
            id: node_id(i),
            kind: if children[i].is_empty() && !empty[i] {
                NodeKind::Requirement
            } else {
                NodeKind::Category
            },
            code: i.to_string(),
            title: format!("node {i}"),
            level: 1,
            children: children[i].clone(),
        })
        .collect();
    TreeBuilder::new()
        .build(&TreeSnapshot { nodes })
        .expect("generated tree is valid")
}

fn node_id(i: usize) -> NodeId {
    NodeId::new(format!("n{i}"))
}

fn leaf_weights(tree: &TreeArena, raw: &[f64]) -> WeightMap {
    tree.leaf_nodes()
        .into_iter()
        .zip(raw.iter().copied())
        .collect()
}

type Shape = (Vec<Option<Pick>>, Vec<bool>, Vec<f64>);

fn tree_strategy() -> impl Strategy<Value = Shape> {
    (
        prop::collection::vec(prop::option::weighted(0.8, any::<Pick>()), 0..MAX_NODES),
        prop::collection::vec(prop::bool::weighted(0.25), MAX_NODES),
        prop::collection::vec(0.0f64..1.0, MAX_NODES),
    )
}

proptest! {
    #[test]
    fn category_effective_is_sum_of_children((parents, empty, raw) in tree_strategy()) {
        let tree = build_tree(&parents, &empty);
        let weights = leaf_weights(&tree, &raw);

        let effective = resolve_effective(&tree, &weights);

        for (_, node) in tree.iter().filter(|(_, n)| !n.is_leaf()) {
            let sum: f64 = node
                .children
                .iter()
                .filter_map(|&c| tree.get_node(c))
                .map(|c| effective.get(&c.data.id))
                .sum();
            prop_assert!((effective.get(&node.data.id) - sum).abs() < TOL);
        }
    }

    #[test]
    fn set_local_percentage_hits_target_and_keeps_leaf_ratios(
        (parents, empty, raw) in tree_strategy(),
        pick in any::<Pick>(),
        pct in 0.0f64..150.0,
    ) {
        let tree = build_tree(&parents, &empty);
        let mut weights = leaf_weights(&tree, &raw);
        let (idx, node) = tree.iter().nth(pick.index(tree.len())).expect("node exists");
        let id = node.data.id.clone();
        let before = weights.clone();
        let current = subtree_effective(&tree, &weights, idx);

        let target = set_local_percentage(&tree, &mut weights, &id, pct).unwrap();

        let effective = resolve_effective(&tree, &weights);
        prop_assert!((effective.get(&id) - target).abs() < TOL);

        // Rescaling multiplies every leaf below the node by the same ratio
        if !node.is_leaf() && current > 1e-6 {
            let ratio = target / current;
            for leaf in tree.leaf_descendants(idx) {
                let leaf_id = &tree.get_node(leaf).expect("leaf exists").data.id;
                prop_assert!((weights.get(leaf_id) - before.get(leaf_id) * ratio).abs() < TOL);
            }
        }

        // Leaves outside the subtree never move
        let inside: Vec<NodeId> = tree
            .iter_subtree(idx)
            .map(|(_, n)| n.data.id.clone())
            .collect();
        for leaf in tree.leaf_nodes().iter().filter(|l| !inside.contains(l)) {
            prop_assert_eq!(weights.get(leaf), before.get(leaf));
        }
    }

    #[test]
    fn equidistribute_over_roots_gives_equal_shares((parents, empty, raw) in tree_strategy()) {
        let tree = build_tree(&parents, &empty);
        let mut weights = leaf_weights(&tree, &raw);
        let roots: Vec<NodeId> = tree
            .roots()
            .iter()
            .filter_map(|&r| tree.get_node(r))
            .map(|n| n.data.id.clone())
            .collect();
        let total: f64 = roots.iter().map(|r| resolve_effective(&tree, &weights).get(r)).sum();
        prop_assume!(total > 1e-6);

        equidistribute(&tree, &mut weights, None, &roots).unwrap();

        let effective = resolve_effective(&tree, &weights);
        let share = total / roots.len() as f64;
        for root in &roots {
            prop_assert!((effective.get(root) - share).abs() < TOL);
        }
    }

    #[test]
    fn reload_after_flush_is_stable((parents, empty, raw) in tree_strategy()) {
        let tree = build_tree(&parents, &empty);
        let weights = leaf_weights(&tree, &raw);

        let first = flush(&tree, &weights);
        let restored = reconcile_loaded(&tree, &first);
        let settled = flush(&tree, &restored);
        let again = flush(&tree, &reconcile_loaded(&tree, &settled));

        // Each leaf moves at most half a unit in the last kept digit
        let before = resolve_effective(&tree, &weights);
        let after = resolve_effective(&tree, &restored);
        for (idx, node) in tree.iter() {
            let bound = tree.leaf_descendants(idx).len() as f64 * ROUNDING + TOL;
            let id = &node.data.id;
            prop_assert!(
                (after.get(id) - before.get(id)).abs() <= bound,
                "{} moved from {} to {}", id, before.get(id), after.get(id)
            );
        }

        prop_assert_eq!(&first.requirements, &settled.requirements);
        prop_assert_eq!(
            serde_json::to_string(&settled).unwrap(),
            serde_json::to_string(&again).unwrap()
        );
    }
}
