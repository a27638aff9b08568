use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RunId;
use crate::catalog::NodeTypeDefinition;
use crate::graph::{NodeId, SerializedGraph};
use crate::persistence::{DeleteReceipt, GraphScope, GraphSummary, LoadedGraph, SaveReceipt};
use crate::schema::DatasetSchemaSnapshot;

/// One problem found by the executor before it runs anything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// `None` for problems with the graph as a whole, e.g. a cycle
    #[serde(default)]
    pub node_id: Option<NodeId>,
    pub message: String,
}

impl ValidationIssue {
    pub fn node(node_id: NodeId, message: impl Into<String>) -> Self {
        Self { node_id: Some(node_id), message: message.into() }
    }

    pub fn graph(message: impl Into<String>) -> Self {
        Self { node_id: None, message: message.into() }
    }
}

/// Reply to `execute_graph`. Results arrive later as status events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteAck {
    pub accepted: bool,
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
}

impl ExecuteAck {
    pub fn accepted() -> Self {
        Self { accepted: true, errors: Vec::new() }
    }

    pub fn rejected(errors: Vec<ValidationIssue>) -> Self {
        Self { accepted: false, errors }
    }
}

/// RPC surface of the out-of-process graph executor.
///
/// Every call may suspend; failures are transport or executor errors and
/// never leave local state half-applied.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    /// Submit a graph. Progress streams back through the event bridge,
    /// stamped with `run_id`.
    async fn execute_graph(&self, run_id: &RunId, graph: &SerializedGraph) -> Result<ExecuteAck>;

    /// Check a graph without running it
    async fn validate_graph(&self, _graph: &SerializedGraph) -> Result<Vec<ValidationIssue>> {
        Ok(Vec::new())
    }

    async fn save_graph(
        &self,
        scope: &GraphScope,
        name: &str,
        graph: &SerializedGraph,
        overwrite: bool,
    ) -> Result<SaveReceipt>;

    async fn load_graphs(&self, scope: &GraphScope) -> Result<Vec<GraphSummary>>;

    async fn load_graph(&self, scope: &GraphScope, id: &str) -> Result<Option<LoadedGraph>>;

    async fn delete_graph(&self, scope: &GraphScope, id: &str) -> Result<DeleteReceipt>;

    async fn get_dataset_schema(&self) -> Result<DatasetSchemaSnapshot>;

    /// Node types the executor understands. An empty list means "use the
    /// bundled catalog".
    async fn get_node_catalog(&self) -> Result<Vec<NodeTypeDefinition>> {
        Ok(Vec::new())
    }
}
