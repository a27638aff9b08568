//! Node-graph editor core for building dataset view pipelines.
//!
//! The graph is edited locally and handed to an out-of-process executor;
//! per-node status flows back through [`events::EventBridge`] and is fanned
//! out to views by [`events::StatusBus`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod execution;
pub mod graph;
pub mod nodes;
pub mod persistence;
pub mod populator;
pub mod schema;
pub mod session;

pub use catalog::NodeCatalog;
pub use error::{ExecutionError, GraphError, PersistenceError};
pub use graph::GraphModel;
pub use session::EditorSession;
