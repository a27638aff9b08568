use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::OnceCell;

use viewgraph::config::{CatalogSource, EditorConfig};
use viewgraph::events::{EventSender, ExecutionCompleteEvent, NodeStatusEvent, RunStatus, StatusEvent};
use viewgraph::execution::{ExecuteAck, GraphExecutor, RunId};
use viewgraph::graph::{NodeStatus, Position, SerializedGraph};
use viewgraph::persistence::{
    DeleteReceipt, GraphScope, GraphStore, GraphSummary, LoadedGraph, MemoryStore, SaveReceipt,
};
use viewgraph::schema::DatasetSchemaSnapshot;
use viewgraph::EditorSession;

/// Stand-in executor: "runs" each node in order and pushes status events
/// back through the bridge.
struct ScriptedExecutor {
    events: OnceCell<EventSender>,
    store: MemoryStore,
}

#[async_trait]
impl GraphExecutor for ScriptedExecutor {
    async fn execute_graph(&self, run_id: &RunId, graph: &SerializedGraph) -> Result<ExecuteAck> {
        println!("Executor received run {}:", run_id);
        println!("{}", graph.to_json_pretty()?);

        let Some(events) = self.events.get().cloned() else {
            anyhow::bail!("executor not connected to a session");
        };
        let mut nodes: Vec<_> = graph.nodes.iter().map(|n| (n.order, n.id)).collect();
        nodes.sort();
        let run_id = run_id.clone();

        tokio::spawn(async move {
            for (_, node_id) in &nodes {
                events.send(NodeStatusEvent::new(*node_id, NodeStatus::Running).for_run(run_id.clone()));
                tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
                events.send(
                    NodeStatusEvent::new(*node_id, NodeStatus::Complete)
                        .for_run(run_id.clone())
                        .with_duration(20),
                );
            }
            events.send(ExecutionCompleteEvent {
                run_id: Some(run_id),
                status: RunStatus::Complete,
                total_nodes: nodes.len(),
                completed: nodes.len(),
                failed: 0,
            });
        });

        Ok(ExecuteAck::accepted())
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
        Ok(DatasetSchemaSnapshot {
            dataset_name: "quickstart".to_string(),
            fields: vec!["id".into(), "filepath".into(), "ground_truth".into(), "predictions".into()],
            label_fields: vec!["ground_truth".into(), "predictions".into()],
            detection_fields: vec!["ground_truth".into(), "predictions".into()],
            tag_values: vec!["validation".into()],
            ..Default::default()
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("View Graph Editor - Demo");
    println!("========================\n");

    let executor = Arc::new(ScriptedExecutor {
        events: OnceCell::new(),
        store: MemoryStore::new(),
    });
    let config = EditorConfig {
        catalog_source: CatalogSource::Bundled,
        ..EditorConfig::default()
    };

    let mut session = EditorSession::new(config, Some(executor.clone() as Arc<dyn GraphExecutor>)).await?;
    let _ = executor.events.set(session.event_sender());

    println!("{} node types in the palette", session.palette().len());
    println!("Hidden for this dataset: {:?}\n", session.hidden_types());

    let _view = session.subscribe(|event: &StatusEvent| {
        match event {
            StatusEvent::NodeStatus(status) => {
                println!("  node {} -> {}", status.node_id, status.status.name());
            }
            StatusEvent::ExecutionComplete(complete) => {
                println!("  run finished: {:?}", complete.status);
            }
        }
        Ok(())
    });

    let source = session.add_node("Source/Current Dataset", Position::new(60.0, 120.0))?;
    let filter = session.append_node("View Stages/Filter Labels")?;
    let limit = session.append_node("View Stages/Limit")?;
    session.set_property(filter, "field", json!("predictions"))?;
    session.set_property(filter, "expression", json!("F('confidence') > 0.9"))?;
    session.set_property(limit, "count", json!(25))?;
    session.connect(source, 0, filter, 0)?;
    session.connect(filter, 0, limit, 0)?;

    if let Some(node) = session.model().node(filter) {
        println!("Filter Labels field choices: {:?}\n", node.choices("field"));
    }

    session.run().await?;
    let complete = session.wait_for_completion().await?;
    println!("\n{}/{} node(s) complete\n", complete.completed, complete.total_nodes);

    let scope = session.dataset_scope();
    let receipt = session.save(&scope, "High confidence sample", false).await?;
    println!("Saved as {}", receipt.id);
    for summary in session.list(&scope).await? {
        println!("  {} ({} nodes)", summary.name, summary.node_count);
    }

    Ok(())
}
