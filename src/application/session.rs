//! Editing session: one tree, one weight map, and the operations on them.

use tracing::{debug, instrument};

use crate::domain::{
    self, equidistribute, project_local, reconcile_loaded, requirement_stats,
    resolve_effective, seed_defaults, set_local_percentage, sibling_totals, DomainResult,
    EffectiveWeights, LocalPercentages, NodeId, NodeView, PersistedWeights, SiblingTotal,
    TreeArena, TreeBuilder, TreeSnapshot, WeightMap, WeightStats, DEFAULT_PRECISION,
};

/// State of one weight-editing session.
///
/// Reads always re-resolve from the stored weights; nothing derived is cached
/// between edits.
#[derive(Debug)]
pub struct WeightSession {
    tree: TreeArena,
    weights: WeightMap,
    precision: u32,
}

impl WeightSession {
    pub fn new(tree: TreeArena, weights: WeightMap) -> Self {
        Self {
            tree,
            weights,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Build the tree and merge persisted weights, seeding defaults when there are none.
    #[instrument(level = "debug", skip_all)]
    pub fn from_snapshot(
        snapshot: &TreeSnapshot,
        persisted: Option<&PersistedWeights>,
    ) -> DomainResult<Self> {
        let tree = TreeBuilder::new().build(snapshot)?;
        let weights = match persisted {
            Some(p) => reconcile_loaded(&tree, p),
            None => seed_defaults(&tree),
        };
        debug!(nodes = tree.len(), stored = weights.len(), "session opened");
        Ok(Self::new(tree, weights))
    }

    /// Decimal places used by [`WeightSession::flush`].
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn tree(&self) -> &TreeArena {
        &self.tree
    }

    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }

    pub fn effective(&self) -> EffectiveWeights {
        resolve_effective(&self.tree, &self.weights)
    }

    pub fn local(&self) -> LocalPercentages {
        project_local(&self.tree, &self.effective())
    }

    pub fn view(&self, id: &NodeId) -> DomainResult<NodeView> {
        self.tree.lookup(id)?;
        let effective = self.effective();
        let local = project_local(&self.tree, &effective);
        Ok(NodeView {
            local_percentage: local.get(id),
            effective_weight: effective.get(id),
        })
    }

    /// Views of every node in pre-order.
    pub fn views(&self) -> Vec<(NodeId, NodeView)> {
        let effective = self.effective();
        let local = project_local(&self.tree, &effective);
        self.tree
            .iter()
            .map(|(_, node)| {
                let id = node.data.id.clone();
                let view = NodeView {
                    local_percentage: local.get(&id),
                    effective_weight: effective.get(&id),
                };
                (id, view)
            })
            .collect()
    }

    pub fn set_local_percentage(&mut self, id: &NodeId, percent: f64) -> DomainResult<NodeView> {
        set_local_percentage(&self.tree, &mut self.weights, id, percent)?;
        self.view(id)
    }

    pub fn equidistribute(
        &mut self,
        parent: Option<&NodeId>,
        siblings: &[NodeId],
    ) -> DomainResult<()> {
        equidistribute(&self.tree, &mut self.weights, parent, siblings)
    }

    /// Equidistribute over all children of `parent`, or over the roots.
    pub fn equidistribute_children(&mut self, parent: Option<&NodeId>) -> DomainResult<()> {
        let parent_idx = parent.map(|p| self.tree.lookup(p)).transpose()?;
        let siblings: Vec<NodeId> = self
            .tree
            .children_of(parent_idx)
            .iter()
            .filter_map(|&idx| self.tree.get_node(idx))
            .map(|n| n.data.id.clone())
            .collect();
        self.equidistribute(parent, &siblings)
    }

    /// Discard all weights and start over from the per-level defaults.
    pub fn reset_defaults(&mut self) {
        self.weights = seed_defaults(&self.tree);
    }

    pub fn stats(&self) -> WeightStats {
        requirement_stats(&self.tree, &self.effective())
    }

    pub fn sibling_totals(&self) -> Vec<SiblingTotal> {
        sibling_totals(&self.tree, &self.local())
    }

    pub fn flush(&self) -> PersistedWeights {
        domain::flush_with_precision(&self.tree, &self.weights, self.precision)
    }
}
