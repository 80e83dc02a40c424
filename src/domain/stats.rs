//! Read-only summaries over resolved weights.

use serde::Serialize;

use crate::domain::arena::TreeArena;
use crate::domain::entities::{NodeId, NodeKind, EPSILON};
use crate::domain::resolver::{EffectiveWeights, LocalPercentages};

/// Sibling totals within this many percentage points of 100 count as balanced.
pub const BALANCE_TOLERANCE_PCT: f64 = 0.01;

/// One requirement and its share of the whole evaluation, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementWeight {
    pub id: NodeId,
    pub code: String,
    pub percent: f64,
}

/// Summary of requirement weights across the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeightStats {
    pub count: usize,
    /// Sum of requirement weights, in percent
    pub total: f64,
    /// Mean requirement weight, in percent
    pub average: f64,
    pub max: Option<RequirementWeight>,
    pub min: Option<RequirementWeight>,
}

/// Requirement statistics; on ties the first requirement in tree order wins.
pub fn requirement_stats(tree: &TreeArena, effective: &EffectiveWeights) -> WeightStats {
    let requirements: Vec<RequirementWeight> = tree
        .iter()
        .filter(|(_, n)| n.data.kind == NodeKind::Requirement)
        .map(|(_, n)| RequirementWeight {
            id: n.data.id.clone(),
            code: n.data.code.clone(),
            percent: effective.get(&n.data.id) * 100.0,
        })
        .collect();

    if requirements.is_empty() {
        return WeightStats::default();
    }

    let total: f64 = requirements.iter().map(|r| r.percent).sum();
    let mut max = &requirements[0];
    let mut min = &requirements[0];
    for r in &requirements[1..] {
        if r.percent > max.percent {
            max = r;
        }
        if r.percent < min.percent {
            min = r;
        }
    }

    WeightStats {
        count: requirements.len(),
        total,
        average: total / requirements.len() as f64,
        max: Some(max.clone()),
        min: Some(min.clone()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    /// Local percentages add up to 100
    Balanced,
    /// Every sibling is at zero
    Empty,
    Unbalanced,
}

/// Local percentage total of one sibling group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiblingTotal {
    /// Owning category, None for the roots
    pub parent: Option<NodeId>,
    pub siblings: usize,
    pub total_pct: f64,
    pub status: BalanceStatus,
}

fn status_of(total_pct: f64) -> BalanceStatus {
    if total_pct.abs() < EPSILON {
        BalanceStatus::Empty
    } else if (total_pct - 100.0).abs() <= BALANCE_TOLERANCE_PCT {
        BalanceStatus::Balanced
    } else {
        BalanceStatus::Unbalanced
    }
}

/// Totals for the root group and for every category with children, in tree order.
///
/// Sibling groups are not required to balance; this only reports.
pub fn sibling_totals(tree: &TreeArena, local: &LocalPercentages) -> Vec<SiblingTotal> {
    let group_total = |group: &[generational_arena::Index]| -> f64 {
        group
            .iter()
            .filter_map(|&idx| tree.get_node(idx))
            .map(|n| local.get(&n.data.id))
            .sum()
    };

    let mut totals = Vec::new();
    if !tree.roots().is_empty() {
        let total_pct = group_total(tree.roots());
        totals.push(SiblingTotal {
            parent: None,
            siblings: tree.roots().len(),
            total_pct,
            status: status_of(total_pct),
        });
    }
    for (_, node) in tree.iter().filter(|(_, n)| !n.is_leaf()) {
        let total_pct = group_total(&node.children);
        totals.push(SiblingTotal {
            parent: Some(node.data.id.clone()),
            siblings: node.children.len(),
            total_pct,
            status: status_of(total_pct),
        });
    }
    totals
}
