//! Application-root owner of the editor state.
//!
//! One `EditorSession` owns the catalog, the graph, the schema-derived
//! widget state, the status bus and the collaborator clients. Views attach
//! by subscribing to the bus and detach by dropping their subscription.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::{NodeCatalog, NodeTypeDefinition};
use crate::config::{CatalogSource, EditorConfig, StorageConfig};
use crate::error::{ExecutionError, GraphError, PersistenceError};
use crate::events::{EventBridge, EventSender, ExecutionCompleteEvent, StatusBus, StatusEvent, Subscription};
use crate::execution::{
    route_validation_errors, DropReason, EventVerdict, ExecutionClient, GraphExecutor, RunId,
    ValidationIssue,
};
use crate::graph::{GraphLink, GraphModel, LinkId, NodeId, Position};
use crate::nodes::NodeKind;
use crate::persistence::{
    DeleteReceipt, ExecutorStore, FileStore, GraphScope, GraphStore, GraphSummary, MemoryStore,
    PersistenceClient, SaveReceipt,
};
use crate::populator::{StaleSelection, WidgetPopulator};
use crate::schema::DatasetSchemaSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-visible message
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Outcome of feeding one status event into the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Applied,
    Dropped(DropReason),
}

pub struct EditorSession {
    config: EditorConfig,
    catalog: NodeCatalog,
    model: GraphModel,
    populator: WidgetPopulator,
    schema: DatasetSchemaSnapshot,
    hidden: BTreeSet<String>,
    stale: Vec<StaleSelection>,
    bus: StatusBus,
    sender: EventSender,
    bridge: EventBridge,
    execution: ExecutionClient,
    executor: Option<Arc<dyn GraphExecutor>>,
    persistence: PersistenceClient,
    notices: Vec<Notice>,
}

impl EditorSession {
    /// Build a session from explicit parts. The schema starts out
    /// unavailable, so dynamic widgets show placeholders until a schema
    /// is applied.
    pub fn with_parts(
        config: EditorConfig,
        catalog: NodeCatalog,
        store: Arc<dyn GraphStore>,
        executor: Option<Arc<dyn GraphExecutor>>,
    ) -> Self {
        let (sender, bridge) = EventBridge::channel();
        let model = GraphModel::new().with_default_size(config.node_size());
        let mut session = Self {
            config,
            catalog,
            model,
            populator: WidgetPopulator::default(),
            schema: DatasetSchemaSnapshot::unavailable(),
            hidden: BTreeSet::new(),
            stale: Vec::new(),
            bus: StatusBus::new(),
            sender,
            bridge,
            execution: ExecutionClient::new(),
            executor,
            persistence: PersistenceClient::new(store),
            notices: Vec::new(),
        };
        session.apply_schema(DatasetSchemaSnapshot::unavailable());
        session
    }

    /// Build a session as `config` describes, then fetch the dataset schema.
    pub async fn new(
        config: EditorConfig,
        executor: Option<Arc<dyn GraphExecutor>>,
    ) -> anyhow::Result<Self> {
        let catalog = match config.catalog_source {
            CatalogSource::Bundled => NodeCatalog::bundled(),
            CatalogSource::Executor => NodeCatalog::load(executor.as_deref()).await,
        };

        let store: Arc<dyn GraphStore> = match (&config.storage, &executor) {
            (StorageConfig::Memory, _) => Arc::new(MemoryStore::new()),
            (StorageConfig::File { dir }, _) => Arc::new(FileStore::new(dir.clone()).await?),
            (StorageConfig::Executor, Some(executor)) => Arc::new(ExecutorStore::new(executor.clone())),
            (StorageConfig::Executor, None) => {
                warn!("Executor storage configured without an executor, keeping graphs in memory");
                Arc::new(MemoryStore::new())
            }
        };

        info!("Editor session starting with {} node types", catalog.len());
        let mut session = Self::with_parts(config, catalog, store, executor);
        session.refresh_schema().await;
        Ok(session)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn schema(&self) -> &DatasetSchemaSnapshot {
        &self.schema
    }

    pub fn hidden_types(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    /// Node types currently offered in the palette
    pub fn palette(&self) -> Vec<&NodeTypeDefinition> {
        self.catalog
            .definitions()
            .iter()
            .filter(|d| !self.hidden.contains(&d.type_id))
            .collect()
    }

    /// Selections outside their refreshed choices, when flagging is enabled
    pub fn stale_selections(&self) -> &[StaleSelection] {
        &self.stale
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
            at: Utc::now(),
        });
    }

    /// Handle given to whatever receives pushes from the executor
    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn bus(&self) -> &StatusBus {
        &self.bus
    }

    /// Attach a view. It stays attached until the subscription is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StatusEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bus.subscribe(listener)
    }

    // ---- schema ----

    /// Replace the dataset schema and rebuild everything derived from it
    pub fn apply_schema(&mut self, schema: DatasetSchemaSnapshot) {
        self.schema = schema;
        self.populator
            .apply_schema_all(&mut self.model, &self.catalog, &self.schema);
        self.hidden = self.populator.recompute_visibility(&self.catalog, &self.schema);
        self.refresh_stale();
        debug!("{} node type(s) hidden", self.hidden.len());
    }

    /// Fetch the schema from the executor. When that fails the session keeps
    /// working with placeholder choices.
    pub async fn refresh_schema(&mut self) -> bool {
        let fetched = match &self.executor {
            Some(executor) => executor.get_dataset_schema().await,
            None => Err(anyhow!("no executor attached")),
        };

        match fetched {
            Ok(schema) => {
                info!("Loaded schema for dataset '{}'", schema.dataset_name);
                self.apply_schema(schema);
                true
            }
            Err(e) => {
                warn!("Dataset schema unavailable: {:#}", e);
                self.notify(NoticeLevel::Warning, format!("Dataset schema unavailable: {:#}", e));
                self.apply_schema(DatasetSchemaSnapshot::unavailable());
                false
            }
        }
    }

    fn refresh_stale(&mut self) {
        self.stale = if self.config.flag_stale_selections {
            self.populator.stale_selections(&self.model)
        } else {
            Vec::new()
        };
    }

    /// The definition of `type_id` with dynamic choices resolved against the
    /// current schema
    pub fn node_defaults(&self, type_id: &str) -> Result<NodeTypeDefinition, GraphError> {
        let definition = self.catalog.require(type_id)?;
        Ok(self.populator.resolve_definition(definition, &self.schema))
    }

    /// Swap in a new catalog. The graph is re-resolved against it; if any
    /// node's type is missing the old catalog stays in place.
    pub fn replace_catalog(&mut self, catalog: NodeCatalog) -> Result<(), GraphError> {
        let snapshot = self.model.serialize();
        let mut model = self.model.clone();
        model.deserialize(&snapshot, &catalog)?;

        self.catalog = catalog;
        self.model = model;
        let schema = std::mem::take(&mut self.schema);
        self.apply_schema(schema);
        Ok(())
    }

    /// Re-fetch the catalog from the executor and swap it in
    pub async fn refresh_catalog(&mut self) -> Result<(), GraphError> {
        let catalog = NodeCatalog::load(self.executor.as_deref()).await;
        let result = self.replace_catalog(catalog);
        if let Err(e) = &result {
            warn!("Keeping the previous node catalog: {}", e);
            self.notify(NoticeLevel::Warning, format!("Node catalog not refreshed: {}", e));
        }
        result
    }

    // ---- graph edits ----

    /// Add a node; its dynamic widgets are populated before it is returned.
    pub fn add_node(&mut self, type_id: &str, position: Position) -> Result<NodeId, GraphError> {
        let definition = self.catalog.require(type_id)?;
        let node = self.model.add_node(&self.catalog, type_id, position)?;
        self.populator.apply_schema(node, definition, &self.schema);
        let id = node.id;
        self.refresh_stale();
        Ok(id)
    }

    /// Add a node one spacing step to the right of the rightmost node
    pub fn append_node(&mut self, type_id: &str) -> Result<NodeId, GraphError> {
        let position = self
            .model
            .nodes()
            .map(|n| n.position)
            .max_by(|a, b| a.x.total_cmp(&b.x))
            .map(|p| Position::new(p.x + self.config.node_spacing, p.y))
            .unwrap_or_default();
        self.add_node(type_id, position)
    }

    pub fn remove_node(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        self.model.remove_node(node_id)?;
        self.refresh_stale();
        Ok(())
    }

    pub fn connect(
        &mut self,
        source_node_id: NodeId,
        source_port: usize,
        target_node_id: NodeId,
        target_port: usize,
    ) -> Result<GraphLink, GraphError> {
        self.model
            .connect(source_node_id, source_port, target_node_id, target_port)
    }

    pub fn disconnect(&mut self, link_id: LinkId) -> Option<GraphLink> {
        self.model.disconnect(link_id)
    }

    pub fn set_properties(
        &mut self,
        node_id: NodeId,
        partial: Map<String, Value>,
    ) -> Result<(), GraphError> {
        let node = self.model.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        check_typed_properties(&node.type_id, &node.properties, &partial)?;
        self.model.set_properties(node_id, partial)?;
        self.refresh_stale();
        Ok(())
    }

    pub fn set_property(&mut self, node_id: NodeId, name: &str, value: Value) -> Result<(), GraphError> {
        let mut partial = Map::new();
        partial.insert(name.to_string(), value);
        self.set_properties(node_id, partial)
    }

    /// Start over with an empty graph and a new identity
    pub fn clear(&mut self) {
        self.model.clear();
        self.stale.clear();
    }

    // ---- execution ----

    fn executor(&self) -> Result<Arc<dyn GraphExecutor>, ExecutionError> {
        self.executor
            .clone()
            .ok_or_else(|| ExecutionError::Executor(anyhow!("no executor attached")))
    }

    pub fn is_running(&self) -> bool {
        self.execution.is_running()
    }

    pub fn current_run(&self) -> Option<&RunId> {
        self.execution.current_run()
    }

    /// Submit the graph. Results arrive through the event bridge.
    pub async fn run(&mut self) -> Result<RunId, ExecutionError> {
        let executor = self.executor()?;
        let result = self.execution.run(executor.as_ref(), &mut self.model).await;

        match &result {
            Ok(run_id) => self.notify(NoticeLevel::Info, format!("Run {} started", run_id)),
            Err(ExecutionError::RunInFlight) => {}
            Err(ExecutionError::Rejected(issues)) => {
                for issue in issues.iter().filter(|i| i.node_id.is_none()) {
                    self.notify(NoticeLevel::Error, issue.message.clone());
                }
            }
            Err(e) => self.notify(NoticeLevel::Error, e.to_string()),
        }
        result
    }

    /// Stop listening to the current run. The executor may keep working.
    pub fn cancel(&mut self) -> Result<RunId, ExecutionError> {
        let run_id = self.execution.cancel()?;
        self.notify(
            NoticeLevel::Warning,
            format!("Stopped following run {}; the executor may still finish it", run_id),
        );
        Ok(run_id)
    }

    /// Ask the executor to check the graph without running it.
    ///
    /// Node-level issues are written to node states; issues about the graph
    /// as a whole are returned.
    pub async fn validate(&mut self) -> Result<Vec<ValidationIssue>, ExecutionError> {
        let executor = self.executor()?;
        let graph = self.model.serialize();
        let issues = executor
            .validate_graph(&graph)
            .await
            .map_err(ExecutionError::Executor)?;

        self.model.reset_execution_states();
        let unrouted = route_validation_errors(&mut self.model, &issues);
        info!("Validation found {} issue(s)", issues.len());
        Ok(unrouted)
    }

    /// Apply one inbound event and republish it to subscribers
    pub fn dispatch(&mut self, mut event: StatusEvent) -> Dispatch {
        match self.execution.accept(&mut event) {
            EventVerdict::Apply | EventVerdict::ApplyLate => {}
            EventVerdict::Drop(reason) => return Dispatch::Dropped(reason),
        }

        if let StatusEvent::NodeStatus(status) = &event {
            if !self.model.set_execution_state(status.node_id, status.to_state()) {
                debug!("Dropping status for node {}, no longer in the graph", status.node_id);
                return Dispatch::Dropped(DropReason::UnknownNode);
            }
        }

        self.bus.publish(&event);
        Dispatch::Applied
    }

    /// Dispatch every event queued on the bridge, returning how many were applied
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        for event in self.bridge.drain() {
            if self.dispatch(event) == Dispatch::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Dispatch events as they arrive until the current run completes.
    ///
    /// No timeout is applied: a run whose executor never reports completion
    /// keeps this waiting.
    pub async fn wait_for_completion(&mut self) -> Result<ExecutionCompleteEvent, ExecutionError> {
        let run_id = self
            .execution
            .current_run()
            .cloned()
            .ok_or(ExecutionError::NoRunInFlight)?;

        loop {
            let event = self.bridge.recv().await.ok_or(ExecutionError::BridgeClosed)?;
            let complete = match &event {
                StatusEvent::ExecutionComplete(complete)
                    if complete.run_id.as_ref().map_or(true, |id| *id == run_id) =>
                {
                    Some(complete.clone())
                }
                _ => None,
            };

            if self.dispatch(event) == Dispatch::Applied {
                if let Some(mut complete) = complete {
                    complete.run_id = Some(run_id);
                    return Ok(complete);
                }
            }
        }
    }

    // ---- persistence ----

    /// Scope of the loaded dataset, or the shared scope when none is loaded
    pub fn dataset_scope(&self) -> GraphScope {
        if self.schema.dataset_name.is_empty() {
            GraphScope::Shared
        } else {
            GraphScope::dataset(self.schema.dataset_name.clone())
        }
    }

    pub fn saved_graphs(&self, scope: &GraphScope) -> &[GraphSummary] {
        self.persistence.cached(scope)
    }

    pub async fn save(
        &mut self,
        scope: &GraphScope,
        name: &str,
        overwrite: bool,
    ) -> Result<SaveReceipt, PersistenceError> {
        let result = self
            .persistence
            .save(scope, name, &self.model, overwrite)
            .await;
        match &result {
            Ok(_) => self.notify(NoticeLevel::Info, format!("Saved '{}'", name)),
            Err(e) => self.notify(NoticeLevel::Error, format!("Save failed: {}", e)),
        }
        result
    }

    pub async fn list(&mut self, scope: &GraphScope) -> Result<Vec<GraphSummary>, PersistenceError> {
        let result = self.persistence.list(scope).await;
        if let Err(e) = &result {
            self.notify(NoticeLevel::Error, format!("Could not list saved graphs: {}", e));
        }
        result
    }

    /// Replace the graph with a saved one. On any failure the current graph
    /// is left exactly as it was.
    pub async fn load(&mut self, scope: &GraphScope, id: &str) -> Result<(), PersistenceError> {
        let result = match self.persistence.load(scope, id).await {
            Ok(loaded) => self
                .model
                .deserialize(&loaded.graph, &self.catalog)
                .map(|()| loaded.name)
                .map_err(PersistenceError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(name) => {
                if self.model.meta().name != name {
                    self.model.rename(name.clone());
                }
                let schema = std::mem::take(&mut self.schema);
                self.apply_schema(schema);
                self.notify(NoticeLevel::Info, format!("Loaded '{}'", name));
                Ok(())
            }
            Err(e) => {
                self.notify(NoticeLevel::Error, format!("Load failed: {}", e));
                Err(e)
            }
        }
    }

    pub async fn delete(&mut self, scope: &GraphScope, id: &str) -> Result<DeleteReceipt, PersistenceError> {
        let result = self.persistence.delete(scope, id).await;
        if let Err(e) = &result {
            self.notify(NoticeLevel::Error, format!("Delete failed: {}", e));
        }
        result
    }
}

/// Decode the merged property bag of a bundled node type through its typed
/// record. Types only the executor knows about are not checked.
fn check_typed_properties(
    type_id: &str,
    current: &Map<String, Value>,
    partial: &Map<String, Value>,
) -> Result<(), GraphError> {
    let mut merged = current.clone();
    merged.extend(partial.iter().map(|(k, v)| (k.clone(), v.clone())));
    match NodeKind::from_properties(type_id, &merged) {
        Ok(_) | Err(GraphError::UnknownNodeType(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
