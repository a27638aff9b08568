//! LiteGraph-compatible wire format.
//!
//! ```text
//! {
//!   last_node_id, last_link_id,
//!   nodes: [{ id, type, pos, size, flags, order, mode, properties,
//!             inputs: [{ name, type, link }], outputs: [{ name, type, links }] }],
//!   links: [[link_id, origin_id, origin_slot, target_id, target_slot, type]],
//!   groups: [], config: {}, extra: {}
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use super::types::{LinkId, NodeId};
use crate::error::GraphError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    #[serde(default)]
    pub last_node_id: NodeId,
    #[serde(default)]
    pub last_link_id: LinkId,
    #[serde(default)]
    pub nodes: Vec<SerializedNode>,
    #[serde(default)]
    pub links: Vec<SerializedLink>,
    #[serde(default)]
    pub groups: Vec<Value>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default)]
    pub pos: [f64; 2],
    #[serde(default = "default_size")]
    pub size: [f64; 2],
    #[serde(default)]
    pub flags: Map<String, Value>,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub mode: u8,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub inputs: Vec<SerializedInput>,
    #[serde(default)]
    pub outputs: Vec<SerializedOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedInput {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: String,
    #[serde(default)]
    pub link: Option<LinkId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedOutput {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: String,
    // LiteGraph writes `null` for outputs that were never connected
    #[serde(default, deserialize_with = "null_as_empty")]
    pub links: Vec<LinkId>,
}

/// `[link_id, origin_node_id, origin_slot, target_node_id, target_slot, port_type]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedLink(
    pub LinkId,
    pub NodeId,
    pub usize,
    pub NodeId,
    pub usize,
    pub String,
);

impl SerializedLink {
    pub fn id(&self) -> LinkId {
        self.0
    }

    pub fn origin(&self) -> (NodeId, usize) {
        (self.1, self.2)
    }

    pub fn target(&self) -> (NodeId, usize) {
        (self.3, self.4)
    }

    pub fn port_type(&self) -> &str {
        &self.5
    }
}

fn default_size() -> [f64; 2] {
    [240.0, 96.0]
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<LinkId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<LinkId>>::deserialize(deserializer)?.unwrap_or_default())
}

impl SerializedGraph {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::Parse(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, GraphError> {
        serde_json::from_value(value).map_err(|e| GraphError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string(self).map_err(|e| GraphError::Parse(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::Parse(e.to_string()))
    }

    pub fn node(&self, id: NodeId) -> Option<&SerializedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Validate the cross references between nodes and the links table.
    ///
    /// Every link named by a node slot must exist in `links` with matching
    /// endpoints, and every node named by a link must exist in `nodes`.
    pub fn check_integrity(&self) -> Result<(), GraphError> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id) {
                return Err(GraphError::DuplicateId { what: "node", id: node.id });
            }
        }

        let mut links: HashMap<LinkId, &SerializedLink> = HashMap::new();
        let mut occupied: HashMap<(NodeId, usize), LinkId> = HashMap::new();
        for link in &self.links {
            if links.insert(link.id(), link).is_some() {
                return Err(GraphError::DuplicateId { what: "link", id: link.id() });
            }
            for (end, node_id) in [("origin", link.1), ("target", link.3)] {
                if !node_ids.contains(&node_id) {
                    return Err(GraphError::DanglingLink {
                        link_id: link.id(),
                        message: format!("{} node {} does not exist", end, node_id),
                    });
                }
            }
            if let Some(existing) = occupied.insert(link.target(), link.id()) {
                return Err(GraphError::TargetPortOccupied {
                    target_node_id: link.3,
                    target_port: link.4,
                    existing_link: existing,
                });
            }
        }

        for node in &self.nodes {
            for (slot, input) in node.inputs.iter().enumerate() {
                let Some(link_id) = input.link else { continue };
                let link = links.get(&link_id).ok_or_else(|| GraphError::DanglingLink {
                    link_id,
                    message: format!("input {} of node {} names a missing link", slot, node.id),
                })?;
                if link.target() != (node.id, slot) {
                    return Err(GraphError::DanglingLink {
                        link_id,
                        message: format!(
                            "input {} of node {} but the link targets {:?}",
                            slot,
                            node.id,
                            link.target()
                        ),
                    });
                }
            }

            for (slot, output) in node.outputs.iter().enumerate() {
                for &link_id in &output.links {
                    let link = links.get(&link_id).ok_or_else(|| GraphError::DanglingLink {
                        link_id,
                        message: format!("output {} of node {} names a missing link", slot, node.id),
                    })?;
                    if link.origin() != (node.id, slot) {
                        return Err(GraphError::DanglingLink {
                            link_id,
                            message: format!(
                                "output {} of node {} but the link starts at {:?}",
                                slot,
                                node.id,
                                link.origin()
                            ),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
