//! Named graph snapshots: per dataset, shared, or bundled templates.

pub mod client;
pub mod executor_store;
pub mod file;
pub mod memory;
pub mod templates;

pub use client::PersistenceClient;
pub use executor_store::ExecutorStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use templates::TemplateLibrary;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::SerializedGraph;

/// Where a snapshot lives
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphScope {
    /// Visible only while `dataset` is loaded
    Dataset { dataset: String },
    /// Visible for every dataset
    Shared,
    /// Bundled at build time, read-only
    Template,
}

impl GraphScope {
    pub fn dataset(name: impl Into<String>) -> Self {
        Self::Dataset { dataset: name.into() }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Template)
    }
}

impl fmt::Display for GraphScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset { dataset } => write!(f, "dataset:{}", dataset),
            Self::Shared => f.write_str("shared"),
            Self::Template => f.write_str("template"),
        }
    }
}

/// One row of a saved-graph listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub id: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
    pub node_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub id: String,
    pub saved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReceipt {
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedGraph {
    pub name: String,
    pub graph: SerializedGraph,
}

/// A snapshot as kept by the stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGraph {
    pub id: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
    pub graph: SerializedGraph,
}

impl StoredGraph {
    pub fn new(name: &str, graph: &SerializedGraph) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            updated_at: Utc::now(),
            graph: graph.clone(),
        }
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: self.updated_at,
            node_count: self.graph.nodes.len(),
        }
    }

    pub fn loaded(&self) -> LoadedGraph {
        LoadedGraph {
            name: self.name.clone(),
            graph: self.graph.clone(),
        }
    }
}

/// Most recently updated first, then by name
pub(crate) fn sort_summaries(summaries: &mut [GraphSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.name.cmp(&b.name)));
}

/// Read/write contract of a snapshot store. Stores only see writable scopes.
///
/// `save` under an existing name replaces that entry only when `overwrite`
/// is set; otherwise it creates a second, distinct entry.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn save(
        &self,
        scope: &GraphScope,
        name: &str,
        graph: &SerializedGraph,
        overwrite: bool,
    ) -> Result<SaveReceipt>;

    async fn list(&self, scope: &GraphScope) -> Result<Vec<GraphSummary>>;

    async fn load(&self, scope: &GraphScope, id: &str) -> Result<Option<LoadedGraph>>;

    async fn delete(&self, scope: &GraphScope, id: &str) -> Result<DeleteReceipt>;
}
