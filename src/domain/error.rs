//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::NodeId;

/// Domain errors represent violations of the tree or weight model.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("duplicate node id in snapshot: {0}")]
    DuplicateNode(NodeId),

    #[error("node {parent} references unknown child: {child}")]
    UnknownChild { parent: NodeId, child: NodeId },

    #[error("node {child} is listed under more than one parent: {first}, {second}")]
    MultipleParents {
        child: NodeId,
        first: NodeId,
        second: NodeId,
    },

    #[error("cycle detected in hierarchy: {0}")]
    CycleDetected(NodeId),

    #[error("requirement cannot have children: {0}")]
    RequirementWithChildren(NodeId),

    #[error("invalid percentage for {id}: {value}")]
    InvalidPercentage { id: NodeId, value: f64 },

    #[error("node {id} is not a child of {}", parent.as_ref().map(|p| p.as_str()).unwrap_or("<root>"))]
    NotASibling { id: NodeId, parent: Option<NodeId> },
}

/// Result type for tree and weight operations.
pub type DomainResult<T> = Result<T, DomainError>;
