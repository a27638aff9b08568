#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use viewgraph::catalog::NodeTypeDefinition;
use viewgraph::config::{CatalogSource, EditorConfig};
use viewgraph::execution::{ExecuteAck, GraphExecutor, RunId, ValidationIssue};
use viewgraph::graph::SerializedGraph;
use viewgraph::persistence::{
    DeleteReceipt, GraphScope, GraphStore, GraphSummary, LoadedGraph, MemoryStore, SaveReceipt,
};
use viewgraph::schema::DatasetSchemaSnapshot;
use viewgraph::{EditorSession, NodeCatalog};

/// Executor double: records submissions and answers from canned replies.
#[derive(Default)]
pub struct ScriptedExecutor {
    pub submitted: Mutex<Vec<(RunId, SerializedGraph)>>,
    pub ack: Mutex<Option<ExecuteAck>>,
    pub issues: Mutex<Vec<ValidationIssue>>,
    pub schema: Mutex<Option<DatasetSchemaSnapshot>>,
    pub catalog: Mutex<Option<Vec<NodeTypeDefinition>>>,
    pub fail_execute: AtomicBool,
    pub store: MemoryStore,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_schema(schema: DatasetSchemaSnapshot) -> Arc<Self> {
        let executor = Self::default();
        *executor.schema.lock().unwrap() = Some(schema);
        Arc::new(executor)
    }

    pub fn reject_with(&self, errors: Vec<ValidationIssue>) {
        *self.ack.lock().unwrap() = Some(ExecuteAck::rejected(errors));
    }

    pub fn submissions(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn last_submission(&self) -> Option<(RunId, SerializedGraph)> {
        self.submitted.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GraphExecutor for ScriptedExecutor {
    async fn execute_graph(&self, run_id: &RunId, graph: &SerializedGraph) -> Result<ExecuteAck> {
        if self.fail_execute.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        self.submitted
            .lock()
            .unwrap()
            .push((run_id.clone(), graph.clone()));
        Ok(self.ack.lock().unwrap().clone().unwrap_or_else(ExecuteAck::accepted))
    }

    async fn validate_graph(&self, _graph: &SerializedGraph) -> Result<Vec<ValidationIssue>> {
        Ok(self.issues.lock().unwrap().clone())
    }

    async fn save_graph(
        &self,
        scope: &GraphScope,
        name: &str,
        graph: &SerializedGraph,
        overwrite: bool,
    ) -> Result<SaveReceipt> {
        self.store.save(scope, name, graph, overwrite).await
    }

    async fn load_graphs(&self, scope: &GraphScope) -> Result<Vec<GraphSummary>> {
        self.store.list(scope).await
    }

    async fn load_graph(&self, scope: &GraphScope, id: &str) -> Result<Option<LoadedGraph>> {
        self.store.load(scope, id).await
    }

    async fn delete_graph(&self, scope: &GraphScope, id: &str) -> Result<DeleteReceipt> {
        self.store.delete(scope, id).await
    }

    async fn get_dataset_schema(&self) -> Result<DatasetSchemaSnapshot> {
        self.schema
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("no dataset loaded"))
    }

    async fn get_node_catalog(&self) -> Result<Vec<NodeTypeDefinition>> {
        Ok(self.catalog.lock().unwrap().clone().unwrap_or_default())
    }
}

pub fn quickstart_schema() -> DatasetSchemaSnapshot {
    DatasetSchemaSnapshot {
        dataset_name: "quickstart".to_string(),
        fields: vec!["id".into(), "filepath".into(), "ground_truth".into(), "predictions".into()],
        label_fields: vec!["ground_truth".into(), "predictions".into()],
        detection_fields: vec!["ground_truth".into(), "predictions".into()],
        tag_values: vec!["validation".into(), "train".into()],
        ..Default::default()
    }
}

pub fn bundled_config() -> EditorConfig {
    EditorConfig {
        catalog_source: CatalogSource::Bundled,
        ..EditorConfig::default()
    }
}

/// Session over the bundled catalog, an in-memory store and `executor`
pub fn session_with(executor: Arc<ScriptedExecutor>) -> EditorSession {
    EditorSession::with_parts(
        bundled_config(),
        NodeCatalog::bundled(),
        Arc::new(MemoryStore::new()),
        Some(executor as Arc<dyn GraphExecutor>),
    )
}
