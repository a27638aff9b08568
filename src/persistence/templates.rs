use chrono::{DateTime, Utc};
use log::warn;

use super::{GraphSummary, LoadedGraph};
use crate::error::GraphError;
use crate::graph::SerializedGraph;

const BUNDLED: &[(&str, &str)] = &[
    (
        "filter-high-confidence",
        include_str!("../../templates/filter_high_confidence.json"),
    ),
    (
        "evaluate-detections",
        include_str!("../../templates/evaluate_detections.json"),
    ),
    (
        "find-duplicates",
        include_str!("../../templates/find_duplicates.json"),
    ),
];

/// Read-only graphs compiled into the crate
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: &'static [(&'static str, &'static str)],
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::bundled()
    }
}

impl TemplateLibrary {
    pub fn bundled() -> Self {
        Self { templates: BUNDLED }
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.templates.iter().map(|(id, _)| *id)
    }

    fn parse(id: &str, json: &str) -> Result<SerializedGraph, GraphError> {
        SerializedGraph::from_json(json).map_err(|e| {
            warn!("Bundled template '{}' does not parse: {}", id, e);
            e
        })
    }

    /// Summaries in bundle order. Templates that fail to parse are skipped.
    pub fn list(&self) -> Vec<GraphSummary> {
        self.templates
            .iter()
            .filter_map(|(id, json)| {
                let graph = Self::parse(id, json).ok()?;
                Some(GraphSummary {
                    id: id.to_string(),
                    name: template_name(id, &graph),
                    updated_at: graph
                        .extra
                        .get("updated_at")
                        .and_then(|v| serde_json::from_value::<DateTime<Utc>>(v.clone()).ok())
                        .unwrap_or_default(),
                    node_count: graph.nodes.len(),
                })
            })
            .collect()
    }

    pub fn load(&self, id: &str) -> Result<Option<LoadedGraph>, GraphError> {
        let Some((id, json)) = self.templates.iter().find(|(t, _)| *t == id) else {
            return Ok(None);
        };
        let graph = Self::parse(id, json)?;
        Ok(Some(LoadedGraph {
            name: template_name(id, &graph),
            graph,
        }))
    }
}

fn template_name(id: &str, graph: &SerializedGraph) -> String {
    graph
        .extra
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}
