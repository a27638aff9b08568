use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::warn;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{sort_summaries, DeleteReceipt, GraphScope, GraphStore, GraphSummary, LoadedGraph, SaveReceipt, StoredGraph};
use crate::graph::SerializedGraph;

/// Stores each snapshot as `<dir>/<scope>/<id>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    storage_dir: PathBuf,
}

impl FileStore {
    /// Creates the storage directory if it doesn't exist
    pub async fn new(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        fs::create_dir_all(&storage_dir)
            .await
            .context("Failed to create graph storage directory")?;
        Ok(Self { storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn scope_dir(&self, scope: &GraphScope) -> Result<PathBuf> {
        match scope {
            GraphScope::Dataset { dataset } => Ok(self.storage_dir.join("datasets").join(sanitize(dataset))),
            GraphScope::Shared => Ok(self.storage_dir.join("shared")),
            GraphScope::Template => bail!("Scope '{}' is read-only", scope),
        }
    }

    fn graph_path(&self, scope: &GraphScope, id: &str) -> Result<PathBuf> {
        Ok(self.scope_dir(scope)?.join(format!("{}.json", sanitize(id))))
    }

    async fn read_all(&self, scope: &GraphScope) -> Result<Vec<StoredGraph>> {
        let dir = self.scope_dir(scope)?;
        let mut stored = Vec::new();
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(stored);
        }

        let mut entries = fs::read_dir(&dir)
            .await
            .context(format!("Failed to list {:?}", dir))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match read_graph(&path).await {
                Ok(graph) => stored.push(graph),
                Err(e) => warn!("Skipping unreadable graph file {:?}: {:#}", path, e),
            }
        }
        Ok(stored)
    }

    async fn write_graph(&self, scope: &GraphScope, stored: &StoredGraph) -> Result<()> {
        let dir = self.scope_dir(scope)?;
        fs::create_dir_all(&dir)
            .await
            .context("Failed to create scope directory")?;

        let path = self.graph_path(scope, &stored.id)?;
        let json = serde_json::to_string_pretty(stored).context("Failed to serialize graph")?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json)
            .await
            .context(format!("Failed to write {:?}", temp_path))?;
        fs::rename(&temp_path, &path)
            .await
            .context(format!("Failed to move graph into place at {:?}", path))?;
        Ok(())
    }
}

async fn read_graph(path: &Path) -> Result<StoredGraph> {
    let json = fs::read_to_string(path)
        .await
        .context(format!("Failed to read {:?}", path))?;
    serde_json::from_str(&json).context("Failed to deserialize stored graph")
}

/// Keep file names to a safe alphabet
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[async_trait]
impl GraphStore for FileStore {
    async fn save(
        &self,
        scope: &GraphScope,
        name: &str,
        graph: &SerializedGraph,
        overwrite: bool,
    ) -> Result<SaveReceipt> {
        let existing = if overwrite {
            self.read_all(scope).await?.into_iter().find(|s| s.name == name)
        } else {
            None
        };

        let stored = match existing {
            Some(mut stored) => {
                stored.graph = graph.clone();
                stored.updated_at = Utc::now();
                stored
            }
            None => StoredGraph::new(name, graph),
        };

        self.write_graph(scope, &stored).await?;
        Ok(SaveReceipt { id: stored.id, saved: true })
    }

    async fn list(&self, scope: &GraphScope) -> Result<Vec<GraphSummary>> {
        let mut summaries: Vec<GraphSummary> =
            self.read_all(scope).await?.iter().map(StoredGraph::summary).collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn load(&self, scope: &GraphScope, id: &str) -> Result<Option<LoadedGraph>> {
        let path = self.graph_path(scope, id)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        Ok(Some(read_graph(&path).await?.loaded()))
    }

    async fn delete(&self, scope: &GraphScope, id: &str) -> Result<DeleteReceipt> {
        let path = self.graph_path(scope, id)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(DeleteReceipt { deleted: false });
        }
        fs::remove_file(&path)
            .await
            .context(format!("Failed to delete {:?}", path))?;
        Ok(DeleteReceipt { deleted: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn empty_graph() -> SerializedGraph {
        SerializedGraph::from_json(r#"{"nodes": [], "links": []}"#).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        let scope = GraphScope::dataset("quickstart");

        let receipt = store.save(&scope, "first", &empty_graph(), false).await.unwrap();
        assert!(receipt.saved);

        let loaded = store.load(&scope, &receipt.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "first");
        assert!(store.load(&GraphScope::Shared, &receipt.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dataset_names_are_sanitized() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        let scope = GraphScope::dataset("../escape");

        store.save(&scope, "g", &empty_graph(), false).await.unwrap();
        assert!(dir.path().join("datasets").join("___escape").exists());
    }

    #[tokio::test]
    async fn test_template_scope_is_refused() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        assert!(store.save(&GraphScope::Template, "g", &empty_graph(), false).await.is_err());
    }
}
