use thiserror::Error;

use crate::execution::ValidationIssue;
use crate::graph::{LinkId, NodeId};

/// Model-integrity errors. Every graph operation that returns one of these
/// has left the model untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown node type: '{0}'")]
    UnknownNodeType(String),

    #[error("Node {0} does not exist in the graph")]
    NodeNotFound(NodeId),

    #[error("Node {node_id} has no {direction} port at index {index}")]
    PortNotFound {
        node_id: NodeId,
        direction: &'static str,
        index: usize,
    },

    #[error("Cannot connect a '{source_type}' output to a '{target_type}' input")]
    PortTypeMismatch {
        source_type: String,
        target_type: String,
    },

    #[error("Input {target_port} of node {target_node_id} already has link {existing_link}")]
    TargetPortOccupied {
        target_node_id: NodeId,
        target_port: usize,
        existing_link: LinkId,
    },

    #[error("Link {link_id} is referenced but does not match the links table: {message}")]
    DanglingLink { link_id: LinkId, message: String },

    #[error("Duplicate {what} id {id} in serialized graph")]
    DuplicateId { what: &'static str, id: u64 },

    #[error("No {what} ids left after the highest id in the serialized graph")]
    IdSpaceExhausted { what: &'static str },

    #[error("Properties of node type '{type_id}' are invalid: {message}")]
    InvalidProperties { type_id: String, message: String },

    #[error("Failed to parse graph JSON: {0}")]
    Parse(String),
}

/// Errors raised by the run bookkeeping of the execution client.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("A run is already in flight for this graph")]
    RunInFlight,

    #[error("No run is in flight")]
    NoRunInFlight,

    #[error("Executor rejected the graph with {} validation error(s)", .0.len())]
    Rejected(Vec<ValidationIssue>),

    #[error("Executor request failed: {0:#}")]
    Executor(#[source] anyhow::Error),

    #[error("Event bridge closed before the run completed")]
    BridgeClosed,
}

/// Errors returned by the persistence client.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Scope '{0}' is read-only")]
    ReadOnlyScope(String),

    #[error("Saved graph '{0}' not found")]
    NotFound(String),

    #[error("Saved graph could not be restored: {0}")]
    Corrupt(#[from] GraphError),

    #[error("Storage request failed: {0:#}")]
    Store(#[source] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
