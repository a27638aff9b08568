pub mod model;
pub mod serialization;
pub mod types;

pub use model::GraphModel;
pub use serialization::{
    SerializedGraph, SerializedInput, SerializedLink, SerializedNode, SerializedOutput,
};
pub use types::{
    ExecutionState, GraphLink, GraphMeta, GraphNode, LinkId, NodeId, NodeStatus, Position, Size,
};
