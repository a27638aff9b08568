//! Status events pushed by the executor, the local bus that republishes them,
//! and the channel that carries them in from the host.

pub mod bridge;
pub mod bus;

pub use bridge::{EventBridge, EventSender};
pub use bus::{StatusBus, Subscription};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::execution::RunId;
use crate::graph::{ExecutionState, NodeId, NodeStatus};

/// Per-node progress report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatusEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    pub node_id: NodeId,
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl NodeStatusEvent {
    pub fn new(node_id: NodeId, status: NodeStatus) -> Self {
        Self {
            run_id: None,
            node_id,
            status,
            result: None,
            error: None,
            message: None,
            progress: None,
            duration_ms: None,
        }
    }

    pub fn for_run(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// The node state this event describes
    pub fn to_state(&self) -> ExecutionState {
        ExecutionState {
            status: self.status,
            progress: self.progress.map(|p| p.clamp(0.0, 1.0)),
            result: self.result.clone(),
            error: self.error.clone(),
            message: self.message.clone(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Final status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Error,
    ValidationError,
}

/// Terminal event of a run, exactly one per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionCompleteEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    pub status: RunStatus,
    #[serde(default)]
    pub total_nodes: usize,
    #[serde(default)]
    pub completed: usize,
    #[serde(default)]
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    NodeStatus(NodeStatusEvent),
    ExecutionComplete(ExecutionCompleteEvent),
}

impl StatusEvent {
    pub fn run_id(&self) -> Option<&RunId> {
        match self {
            Self::NodeStatus(e) => e.run_id.as_ref(),
            Self::ExecutionComplete(e) => e.run_id.as_ref(),
        }
    }

    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::NodeStatus(e) => Some(e.node_id),
            Self::ExecutionComplete(_) => None,
        }
    }

    /// Stamp an unstamped event with `run_id`
    pub fn attribute_to(&mut self, run_id: &RunId) {
        let slot = match self {
            Self::NodeStatus(e) => &mut e.run_id,
            Self::ExecutionComplete(e) => &mut e.run_id,
        };
        if slot.is_none() {
            *slot = Some(run_id.clone());
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<NodeStatusEvent> for StatusEvent {
    fn from(event: NodeStatusEvent) -> Self {
        Self::NodeStatus(event)
    }
}

impl From<ExecutionCompleteEvent> for StatusEvent {
    fn from(event: ExecutionCompleteEvent) -> Self {
        Self::ExecutionComplete(event)
    }
}
