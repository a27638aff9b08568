use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{sort_summaries, DeleteReceipt, GraphScope, GraphStore, GraphSummary, LoadedGraph, SaveReceipt, StoredGraph};
use crate::graph::SerializedGraph;

/// Process-lifetime store
#[derive(Debug, Default)]
pub struct MemoryStore {
    scopes: RwLock<HashMap<GraphScope, Vec<StoredGraph>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn save(
        &self,
        scope: &GraphScope,
        name: &str,
        graph: &SerializedGraph,
        overwrite: bool,
    ) -> Result<SaveReceipt> {
        if scope.is_read_only() {
            bail!("Scope '{}' is read-only", scope);
        }

        let mut scopes = self.scopes.write().await;
        let entries = scopes.entry(scope.clone()).or_default();

        if overwrite {
            if let Some(existing) = entries.iter_mut().find(|e| e.name == name) {
                existing.graph = graph.clone();
                existing.updated_at = Utc::now();
                return Ok(SaveReceipt { id: existing.id.clone(), saved: true });
            }
        }

        let entry = StoredGraph::new(name, graph);
        let id = entry.id.clone();
        entries.push(entry);
        Ok(SaveReceipt { id, saved: true })
    }

    async fn list(&self, scope: &GraphScope) -> Result<Vec<GraphSummary>> {
        let scopes = self.scopes.read().await;
        let mut summaries: Vec<GraphSummary> = scopes
            .get(scope)
            .map(|entries| entries.iter().map(StoredGraph::summary).collect())
            .unwrap_or_default();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn load(&self, scope: &GraphScope, id: &str) -> Result<Option<LoadedGraph>> {
        let scopes = self.scopes.read().await;
        Ok(scopes
            .get(scope)
            .and_then(|entries| entries.iter().find(|e| e.id == id))
            .map(StoredGraph::loaded))
    }

    async fn delete(&self, scope: &GraphScope, id: &str) -> Result<DeleteReceipt> {
        let mut scopes = self.scopes.write().await;
        let Some(entries) = scopes.get_mut(scope) else {
            return Ok(DeleteReceipt { deleted: false });
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(DeleteReceipt { deleted: entries.len() < before })
    }
}
