//! Persistence codec: effective weights of every node in storage format.

use tracing::instrument;

use crate::domain::arena::TreeArena;
use crate::domain::entities::{round_to, NodeKind, PersistedWeights, WeightMap};
use crate::domain::resolver::resolve_effective;

/// Decimal places kept in persisted weights.
pub const DEFAULT_PRECISION: u32 = 4;

/// Flush with the default precision.
pub fn flush(tree: &TreeArena, weights: &WeightMap) -> PersistedWeights {
    flush_with_precision(tree, weights, DEFAULT_PRECISION)
}

/// Resolve every node and split the result by node kind.
///
/// Values are absolute 0..1 decimals rounded to `precision` places. Output maps
/// are ordered by id, so serializing the same state twice is byte-identical.
#[instrument(level = "debug", skip(tree, weights))]
pub fn flush_with_precision(
    tree: &TreeArena,
    weights: &WeightMap,
    precision: u32,
) -> PersistedWeights {
    let effective = resolve_effective(tree, weights);
    let mut out = PersistedWeights::default();

    for (_, node) in tree.iter() {
        let value = round_to(effective.get(&node.data.id), precision);
        let target = match node.data.kind {
            NodeKind::Category => &mut out.categories,
            NodeKind::Requirement => &mut out.requirements,
        };
        target.insert(node.data.id.clone(), value);
    }
    out
}
