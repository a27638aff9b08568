use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::{DeleteReceipt, GraphScope, GraphStore, GraphSummary, LoadedGraph, SaveReceipt};
use crate::execution::GraphExecutor;
use crate::graph::SerializedGraph;

/// Store that keeps snapshots on the executor side
#[derive(Clone)]
pub struct ExecutorStore {
    executor: Arc<dyn GraphExecutor>,
}

impl ExecutorStore {
    pub fn new(executor: Arc<dyn GraphExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl GraphStore for ExecutorStore {
    async fn save(
        &self,
        scope: &GraphScope,
        name: &str,
        graph: &SerializedGraph,
        overwrite: bool,
    ) -> Result<SaveReceipt> {
        self.executor.save_graph(scope, name, graph, overwrite).await
    }

    async fn list(&self, scope: &GraphScope) -> Result<Vec<GraphSummary>> {
        self.executor.load_graphs(scope).await
    }

    async fn load(&self, scope: &GraphScope, id: &str) -> Result<Option<LoadedGraph>> {
        self.executor.load_graph(scope, id).await
    }

    async fn delete(&self, scope: &GraphScope, id: &str) -> Result<DeleteReceipt> {
        self.executor.delete_graph(scope, id).await
    }
}
