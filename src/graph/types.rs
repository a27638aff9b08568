use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::catalog::PortSpec;

pub type NodeId = u64;
pub type LinkId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(240.0, 96.0)
    }
}

/// Per-node execution status as reported by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Pending,
    Running,
    Complete,
    Error,
    Skipped,
}

impl NodeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error | Self::Skipped)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

/// Transient execution state of a node. Never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionState {
    pub status: NodeStatus,
    /// Fraction in `0.0..=1.0`
    pub progress: Option<f64>,
    pub result: Option<Value>,
    pub error: Option<String>,
    /// Extra context, e.g. why a node was skipped
    pub message: Option<String>,
    pub duration_ms: Option<u64>,
}

impl ExecutionState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: NodeStatus::Error,
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// A node instance on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub type_id: String,
    /// Display label, resolved from the catalog
    pub title: String,
    pub color: String,
    pub position: Position,
    pub size: Size,
    pub properties: Map<String, Value>,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    pub flags: Map<String, Value>,
    pub mode: u8,
    /// Legal choices per dynamic parameter, rebuilt on every schema apply
    pub widget_choices: BTreeMap<String, Vec<String>>,
    pub execution_state: ExecutionState,
}

impl GraphNode {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn choices(&self, parameter: &str) -> Option<&[String]> {
        self.widget_choices.get(parameter).map(Vec::as_slice)
    }
}

/// Directed, type-checked connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphLink {
    pub id: LinkId,
    pub source_node_id: NodeId,
    pub source_port_index: usize,
    pub target_node_id: NodeId,
    pub target_port_index: usize,
    pub port_type: String,
}

impl GraphLink {
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.source_node_id == node_id || self.target_node_id == node_id
    }
}

/// Identity and descriptive metadata of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GraphMeta {
    pub fn fresh() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for GraphMeta {
    fn default() -> Self {
        Self::fresh()
    }
}
