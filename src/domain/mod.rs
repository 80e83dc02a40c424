//! Domain layer: requirement tree and weight engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod codec;
pub mod entities;
pub mod error;
pub mod mutator;
pub mod reconciler;
pub mod resolver;
pub mod stats;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use builder::{NestedNode, SnapshotNode, TreeBuilder, TreeSnapshot};
pub use codec::{flush, flush_with_precision, DEFAULT_PRECISION};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use mutator::{apply_target, equidistribute, set_local_percentage, Distribution};
pub use reconciler::{reconcile_loaded, seed_defaults};
pub use resolver::{
    project_local, resolve_effective, subtree_effective, EffectiveWeights, LocalPercentages,
    NodeValues,
};
pub use stats::{requirement_stats, sibling_totals, BalanceStatus, SiblingTotal, WeightStats};
