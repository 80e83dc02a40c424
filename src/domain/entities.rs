//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tolerance for every "is zero" and "is equal" check on weights.
pub const EPSILON: f64 = 1e-6;

/// Opaque node identifier, stable across loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Node kind. Requirements are always leaves; categories may have children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Category,
    Requirement,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Category => f.write_str("category"),
            NodeKind::Requirement => f.write_str("requirement"),
        }
    }
}

/// Stored weights keyed by node id.
///
/// Values are absolute fractions of the whole evaluation. Only childless nodes
/// carry a meaningful value; entries for categories with children are ignored
/// when resolving.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightMap {
    weights: BTreeMap<NodeId, f64>,
}

impl WeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored weight of `id`, 0 when unset.
    pub fn get(&self, id: &NodeId) -> f64 {
        self.weights.get(id).copied().unwrap_or(0.0)
    }

    /// Set the stored weight, clamping negatives to zero.
    pub fn set(&mut self, id: NodeId, weight: f64) {
        self.weights.insert(id, weight.max(0.0));
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.weights.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, f64)> {
        self.weights.iter().map(|(k, v)| (k, *v))
    }
}

impl FromIterator<(NodeId, f64)> for WeightMap {
    fn from_iter<T: IntoIterator<Item = (NodeId, f64)>>(iter: T) -> Self {
        let mut map = WeightMap::new();
        for (id, w) in iter {
            map.set(id, w);
        }
        map
    }
}

/// Absolute weights as exchanged with external storage (0..1 decimals).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedWeights {
    #[serde(default)]
    pub categories: BTreeMap<NodeId, f64>,
    #[serde(default)]
    pub requirements: BTreeMap<NodeId, f64>,
}

impl PersistedWeights {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.requirements.is_empty()
    }

    /// All persisted values, categories and requirements merged.
    ///
    /// A requirement entry wins when the same id appears in both maps.
    pub fn merged(&self) -> BTreeMap<NodeId, f64> {
        let mut all = self.categories.clone();
        all.extend(self.requirements.iter().map(|(k, v)| (k.clone(), *v)));
        all
    }
}

/// Per-node values handed to a rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeView {
    /// Effective weight relative to the parent, in percent
    pub local_percentage: f64,
    /// Absolute effective weight (0..1)
    pub effective_weight: f64,
}

/// True when `value` is within [`EPSILON`] of zero.
pub fn is_zero(value: f64) -> bool {
    value.abs() <= EPSILON
}

/// Round to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
