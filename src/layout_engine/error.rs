use thiserror::Error;

use crate::layout_engine::NodeKind;
use crate::model::tree::NodeId;

/// Structural misuse of the layout tree.
///
/// None of these leave the tree modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("node {node:?} is not a descendant of {ancestor:?}")]
    NotADescendant { node: NodeId, ancestor: NodeId },
    #[error("reference node {reference:?} is not a child of {parent:?}")]
    NotAChild { reference: NodeId, parent: NodeId },
    #[error("attaching {node:?} under {parent:?} would create a cycle")]
    WouldCreateCycle { node: NodeId, parent: NodeId },
    #[error("{kind:?} nodes cannot {operation}")]
    IllegalKind { kind: NodeKind, operation: &'static str },
}
