//! Render a weight session as a terminal tree.

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::application::WeightSession;
use crate::cli::output;
use crate::domain::{EffectiveWeights, LocalPercentages, NodeKind};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for WeightSession {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let effective = self.effective();
        let local = self.local();
        let total: f64 = self
            .tree()
            .roots()
            .iter()
            .filter_map(|&idx| self.tree().get_node(idx))
            .map(|n| effective.get(&n.data.id))
            .sum();
        let mut top = Tree::new(format!("Evaluation ({})", output::percent(total * 100.0)));
        for &root in self.tree().roots() {
            top.push(build_tree(self, root, &effective, &local));
        }
        top
    }
}

fn build_tree(
    session: &WeightSession,
    idx: Index,
    effective: &EffectiveWeights,
    local: &LocalPercentages,
) -> Tree<String> {
    let Some(node) = session.tree().get_node(idx) else {
        return Tree::new(String::new());
    };
    let marker = match node.data.kind {
        NodeKind::Category => "",
        NodeKind::Requirement => "• ",
    };
    let label = format!(
        "{marker}{}  {} of parent, {} overall",
        node.data,
        output::percent(local.get(&node.data.id)),
        output::percent(effective.get(&node.data.id) * 100.0)
    );
    let leaves: Vec<_> = node
        .children
        .iter()
        .map(|&child| build_tree(session, child, effective, local))
        .collect();
    Tree::new(label).with_leaves(leaves)
}
