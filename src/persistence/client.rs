use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::{DeleteReceipt, GraphScope, GraphStore, GraphSummary, LoadedGraph, SaveReceipt, TemplateLibrary};
use crate::error::PersistenceError;
use crate::graph::GraphModel;

/// Save/list/load/delete over a [`GraphStore`], with templates served from
/// the bundled library and the last listing of each scope cached.
pub struct PersistenceClient {
    store: Arc<dyn GraphStore>,
    templates: TemplateLibrary,
    cache: HashMap<GraphScope, Vec<GraphSummary>>,
}

impl PersistenceClient {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            templates: TemplateLibrary::bundled(),
            cache: HashMap::new(),
        }
    }

    pub fn with_templates(mut self, templates: TemplateLibrary) -> Self {
        self.templates = templates;
        self
    }

    /// Last listing fetched for `scope`
    pub fn cached(&self, scope: &GraphScope) -> &[GraphSummary] {
        self.cache.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Snapshot `model` under `name`. The model itself is never modified.
    pub async fn save(
        &mut self,
        scope: &GraphScope,
        name: &str,
        model: &GraphModel,
        overwrite: bool,
    ) -> Result<SaveReceipt, PersistenceError> {
        if scope.is_read_only() {
            return Err(PersistenceError::ReadOnlyScope(scope.to_string()));
        }

        let mut snapshot = model.serialize();
        snapshot.extra.insert("name".to_string(), Value::String(name.to_string()));

        let receipt = self
            .store
            .save(scope, name, &snapshot, overwrite)
            .await
            .map_err(PersistenceError::Store)?;
        info!("Saved graph '{}' to {} as {}", name, scope, receipt.id);

        if let Err(e) = self.list(scope).await {
            warn!("Saved, but could not refresh the {} listing: {}", scope, e);
        }
        Ok(receipt)
    }

    pub async fn list(&mut self, scope: &GraphScope) -> Result<Vec<GraphSummary>, PersistenceError> {
        let summaries = if scope.is_read_only() {
            self.templates.list()
        } else {
            self.store.list(scope).await.map_err(PersistenceError::Store)?
        };
        self.cache.insert(scope.clone(), summaries.clone());
        Ok(summaries)
    }

    pub async fn load(&self, scope: &GraphScope, id: &str) -> Result<LoadedGraph, PersistenceError> {
        let loaded = if scope.is_read_only() {
            self.templates.load(id)?
        } else {
            self.store.load(scope, id).await.map_err(PersistenceError::Store)?
        };
        loaded.ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    /// Delete `id` from `scope`. Deleting an unknown id reports
    /// `deleted: false` and leaves the cached listing alone.
    pub async fn delete(&mut self, scope: &GraphScope, id: &str) -> Result<DeleteReceipt, PersistenceError> {
        if scope.is_read_only() {
            return Err(PersistenceError::ReadOnlyScope(scope.to_string()));
        }

        let receipt = self
            .store
            .delete(scope, id)
            .await
            .map_err(PersistenceError::Store)?;

        if receipt.deleted {
            if let Some(cached) = self.cache.get_mut(scope) {
                cached.retain(|s| s.id != id);
            }
            info!("Deleted graph {} from {}", id, scope);
        } else {
            info!("Graph {} not found in {}, nothing deleted", id, scope);
        }
        Ok(receipt)
    }
}
