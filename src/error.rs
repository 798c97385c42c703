//! Error type for programmer-error class failures.
//!
//! Runtime data problems (a rejected connection, a link that references a
//! port nobody owns, geometry that cannot be measured yet) are not errors:
//! they are logged and reported through outcome enums. Only misuse of the
//! API ends up here.

use crate::ids::{LinkId, NodeId, PortId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("invalid link line type: {0}")]
    UnknownLineType(String),
    #[error("invalid link line style: {0}")]
    UnknownLineStyle(String),
    #[error("unknown link end type: {0}")]
    UnknownEndKind(String),
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("port {0} does not exist")]
    UnknownPort(PortId),
    #[error("node {node} has no item {index}")]
    UnknownItem { node: NodeId, index: usize },
    #[error("link {0} does not exist")]
    UnknownLink(LinkId),
    #[error("link cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, GraphError>;
