use chrono::Utc;
use log::debug;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};

use super::serialization::{
    SerializedGraph, SerializedInput, SerializedLink, SerializedNode, SerializedOutput,
};
use super::types::{
    ExecutionState, GraphLink, GraphMeta, GraphNode, LinkId, NodeId, Position, Size,
};
use crate::catalog::{NodeCatalog, NodeTypeDefinition};
use crate::error::GraphError;

/// Keys of `extra` that carry [`GraphMeta`]
const META_KEYS: [&str; 5] = ["id", "name", "description", "created_at", "updated_at"];

/// Canonical in-memory graph.
///
/// Every mutation validates before it touches state, so a returned error
/// always means the model is unchanged.
#[derive(Debug, Clone)]
pub struct GraphModel {
    meta: GraphMeta,
    nodes: BTreeMap<NodeId, GraphNode>,
    links: BTreeMap<LinkId, GraphLink>,
    next_node_id: NodeId,
    next_link_id: LinkId,
    default_size: Size,
    groups: Vec<Value>,
    config: Map<String, Value>,
    extra: Map<String, Value>,
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModel {
    pub fn new() -> Self {
        Self {
            meta: GraphMeta::fresh(),
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            next_node_id: 1,
            next_link_id: 1,
            default_size: Size::default(),
            groups: Vec::new(),
            config: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn with_default_size(mut self, size: Size) -> Self {
        self.default_size = size;
        self
    }

    pub fn meta(&self) -> &GraphMeta {
        &self.meta
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.meta.name = name.into();
        self.touch();
    }

    pub fn describe(&mut self, description: impl Into<String>) {
        self.meta.description = description.into();
        self.touch();
    }

    fn touch(&mut self) {
        self.meta.updated_at = Utc::now();
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.nodes.values_mut()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link(&self, id: LinkId) -> Option<&GraphLink> {
        self.links.get(&id)
    }

    pub fn links(&self) -> impl Iterator<Item = &GraphLink> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node of `type_id` with deep-copied default properties.
    pub fn add_node(
        &mut self,
        catalog: &NodeCatalog,
        type_id: &str,
        position: Position,
    ) -> Result<&mut GraphNode, GraphError> {
        let definition = catalog.require(type_id)?;
        let id = self.next_node_id;
        self.next_node_id += 1;

        let node = GraphNode {
            id,
            type_id: definition.type_id.clone(),
            title: definition.label.clone(),
            color: definition.color.clone(),
            position,
            size: self.default_size,
            properties: definition.default_properties(),
            inputs: definition.input_ports.clone(),
            outputs: definition.output_ports.clone(),
            flags: Map::new(),
            mode: 0,
            widget_choices: BTreeMap::new(),
            execution_state: ExecutionState::idle(),
        };

        debug!("Added node {} ({})", id, type_id);
        self.touch();
        Ok(self.nodes.entry(id).or_insert(node))
    }

    /// Remove a node together with every link touching it.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<GraphNode, GraphError> {
        let node = self
            .nodes
            .remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        self.links.retain(|_, link| !link.touches(node_id));
        self.touch();
        Ok(node)
    }

    /// Connect an output port to an input port, replacing any link already
    /// feeding that input.
    pub fn connect(
        &mut self,
        source_node_id: NodeId,
        source_port: usize,
        target_node_id: NodeId,
        target_port: usize,
    ) -> Result<GraphLink, GraphError> {
        let port_type = self.check_connection(source_node_id, source_port, target_node_id, target_port)?;

        if let Some(existing) = self.link_into(target_node_id, target_port).map(|l| l.id) {
            debug!("Replacing link {} into node {} input {}", existing, target_node_id, target_port);
            self.links.remove(&existing);
        }

        Ok(self.insert_link(source_node_id, source_port, target_node_id, target_port, port_type))
    }

    /// Like [`connect`](Self::connect) but refuses to replace an existing link.
    pub fn try_connect(
        &mut self,
        source_node_id: NodeId,
        source_port: usize,
        target_node_id: NodeId,
        target_port: usize,
    ) -> Result<GraphLink, GraphError> {
        let port_type = self.check_connection(source_node_id, source_port, target_node_id, target_port)?;

        if let Some(existing) = self.link_into(target_node_id, target_port) {
            return Err(GraphError::TargetPortOccupied {
                target_node_id,
                target_port,
                existing_link: existing.id,
            });
        }

        Ok(self.insert_link(source_node_id, source_port, target_node_id, target_port, port_type))
    }

    fn check_connection(
        &self,
        source_node_id: NodeId,
        source_port: usize,
        target_node_id: NodeId,
        target_port: usize,
    ) -> Result<String, GraphError> {
        let source = self
            .nodes
            .get(&source_node_id)
            .ok_or(GraphError::NodeNotFound(source_node_id))?;
        let target = self
            .nodes
            .get(&target_node_id)
            .ok_or(GraphError::NodeNotFound(target_node_id))?;

        let output = source.outputs.get(source_port).ok_or(GraphError::PortNotFound {
            node_id: source_node_id,
            direction: "output",
            index: source_port,
        })?;
        let input = target.inputs.get(target_port).ok_or(GraphError::PortNotFound {
            node_id: target_node_id,
            direction: "input",
            index: target_port,
        })?;

        if output.port_type != input.port_type {
            return Err(GraphError::PortTypeMismatch {
                source_type: output.port_type.clone(),
                target_type: input.port_type.clone(),
            });
        }

        Ok(output.port_type.clone())
    }

    fn insert_link(
        &mut self,
        source_node_id: NodeId,
        source_port_index: usize,
        target_node_id: NodeId,
        target_port_index: usize,
        port_type: String,
    ) -> GraphLink {
        let link = GraphLink {
            id: self.next_link_id,
            source_node_id,
            source_port_index,
            target_node_id,
            target_port_index,
            port_type,
        };
        self.next_link_id += 1;
        self.links.insert(link.id, link.clone());
        self.touch();
        link
    }

    pub fn disconnect(&mut self, link_id: LinkId) -> Option<GraphLink> {
        let removed = self.links.remove(&link_id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Merge `partial` into the node's properties. No validation happens here.
    pub fn set_properties(
        &mut self,
        node_id: NodeId,
        partial: Map<String, Value>,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.properties.extend(partial);
        self.touch();
        Ok(())
    }

    pub fn set_property(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
        value: Value,
    ) -> Result<(), GraphError> {
        let mut partial = Map::new();
        partial.insert(name.into(), value);
        self.set_properties(node_id, partial)
    }

    pub fn move_node(&mut self, node_id: NodeId, position: Position) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.position = position;
        self.touch();
        Ok(())
    }

    /// The link feeding an input port, if any
    pub fn link_into(&self, node_id: NodeId, port: usize) -> Option<&GraphLink> {
        self.links
            .values()
            .find(|l| l.target_node_id == node_id && l.target_port_index == port)
    }

    pub fn links_into(&self, node_id: NodeId) -> Vec<&GraphLink> {
        self.links.values().filter(|l| l.target_node_id == node_id).collect()
    }

    pub fn links_from(&self, node_id: NodeId) -> Vec<&GraphLink> {
        self.links.values().filter(|l| l.source_node_id == node_id).collect()
    }

    /// Nodes feeding `node_id`, deduplicated and ordered by id
    pub fn parents(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.links_into(node_id).iter().map(|l| l.source_node_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Nodes fed by `node_id`, deduplicated and ordered by id
    pub fn children(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.links_from(node_id).iter().map(|l| l.target_node_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Topological order of node ids. Nodes on a cycle come last, by id.
    pub fn execution_order(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<NodeId, usize> = self.nodes.keys().map(|&id| (id, 0)).collect();
        for link in self.links.values() {
            if let Some(d) = in_degree.get_mut(&link.target_node_id) {
                *d += 1;
            }
        }

        let mut ready: VecDeque<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = ready.pop_front() {
            order.push(id);
            for link in self.links.values().filter(|l| l.source_node_id == id) {
                if let Some(d) = in_degree.get_mut(&link.target_node_id) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push_back(link.target_node_id);
                    }
                }
            }
        }

        if order.len() < self.nodes.len() {
            let placed: std::collections::HashSet<NodeId> = order.iter().copied().collect();
            order.extend(self.nodes.keys().copied().filter(|id| !placed.contains(id)));
        }
        order
    }

    pub fn set_execution_state(&mut self, node_id: NodeId, state: ExecutionState) -> bool {
        match self.nodes.get_mut(&node_id) {
            Some(node) => {
                node.execution_state = state;
                true
            }
            None => false,
        }
    }

    pub fn reset_execution_states(&mut self) {
        for node in self.nodes.values_mut() {
            node.execution_state = ExecutionState::idle();
        }
    }

    /// Reset to an empty graph with a new identity. Id counters keep
    /// counting so ids stay unique for the life of the process.
    pub fn clear(&mut self) {
        self.meta = GraphMeta::fresh();
        self.nodes.clear();
        self.links.clear();
        self.groups.clear();
        self.config.clear();
        self.extra.clear();
    }

    pub fn serialize(&self) -> SerializedGraph {
        let order: HashMap<NodeId, usize> = self
            .execution_order()
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();

        let nodes = self
            .nodes
            .values()
            .map(|node| SerializedNode {
                id: node.id,
                type_id: node.type_id.clone(),
                pos: [node.position.x, node.position.y],
                size: [node.size.width, node.size.height],
                flags: node.flags.clone(),
                order: order.get(&node.id).copied().unwrap_or_default(),
                mode: node.mode,
                properties: node.properties.clone(),
                inputs: node
                    .inputs
                    .iter()
                    .enumerate()
                    .map(|(slot, port)| SerializedInput {
                        name: port.name.clone(),
                        port_type: port.port_type.clone(),
                        link: self.link_into(node.id, slot).map(|l| l.id),
                    })
                    .collect(),
                outputs: node
                    .outputs
                    .iter()
                    .enumerate()
                    .map(|(slot, port)| SerializedOutput {
                        name: port.name.clone(),
                        port_type: port.port_type.clone(),
                        links: self
                            .links
                            .values()
                            .filter(|l| l.source_node_id == node.id && l.source_port_index == slot)
                            .map(|l| l.id)
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let links = self
            .links
            .values()
            .map(|l| {
                SerializedLink(
                    l.id,
                    l.source_node_id,
                    l.source_port_index,
                    l.target_node_id,
                    l.target_port_index,
                    l.port_type.clone(),
                )
            })
            .collect();

        let mut extra = self.extra.clone();
        if let Ok(Value::Object(meta)) = serde_json::to_value(&self.meta) {
            extra.extend(meta);
        }

        SerializedGraph {
            last_node_id: self.nodes.keys().next_back().copied().unwrap_or(0),
            last_link_id: self.links.keys().next_back().copied().unwrap_or(0),
            nodes,
            links,
            groups: self.groups.clone(),
            config: self.config.clone(),
            extra,
        }
    }

    /// Replace the whole model with `snapshot`.
    ///
    /// Type ids are re-resolved against `catalog`; labels, colors and ports
    /// come from the catalog, and missing properties take catalog defaults.
    /// Nothing changes unless the whole snapshot is accepted.
    pub fn deserialize(
        &mut self,
        snapshot: &SerializedGraph,
        catalog: &NodeCatalog,
    ) -> Result<(), GraphError> {
        snapshot.check_integrity()?;

        let mut nodes = BTreeMap::new();
        for saved in &snapshot.nodes {
            let definition = catalog.require(&saved.type_id)?;
            nodes.insert(saved.id, restore_node(saved, definition));
        }

        let mut links = BTreeMap::new();
        for saved in &snapshot.links {
            let link = restore_link(saved, &nodes)?;
            links.insert(link.id, link);
        }

        let meta = restore_meta(&snapshot.extra);
        let extra = snapshot
            .extra
            .iter()
            .filter(|(k, _)| !META_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let max_node = nodes.keys().next_back().copied().unwrap_or(0).max(snapshot.last_node_id);
        let max_link = links.keys().next_back().copied().unwrap_or(0).max(snapshot.last_link_id);
        let next_node = max_node
            .checked_add(1)
            .ok_or(GraphError::IdSpaceExhausted { what: "node" })?;
        let next_link = max_link
            .checked_add(1)
            .ok_or(GraphError::IdSpaceExhausted { what: "link" })?;

        self.meta = meta;
        self.nodes = nodes;
        self.links = links;
        self.groups = snapshot.groups.clone();
        self.config = snapshot.config.clone();
        self.extra = extra;
        self.next_node_id = self.next_node_id.max(next_node);
        self.next_link_id = self.next_link_id.max(next_link);
        Ok(())
    }

    /// Convenience wrapper: a fresh model built from `snapshot`
    pub fn from_serialized(snapshot: &SerializedGraph, catalog: &NodeCatalog) -> Result<Self, GraphError> {
        let mut model = Self::new();
        model.deserialize(snapshot, catalog)?;
        Ok(model)
    }
}

fn restore_node(saved: &SerializedNode, definition: &NodeTypeDefinition) -> GraphNode {
    let mut properties = definition.default_properties();
    properties.extend(saved.properties.clone());

    GraphNode {
        id: saved.id,
        type_id: definition.type_id.clone(),
        title: definition.label.clone(),
        color: definition.color.clone(),
        position: Position::new(saved.pos[0], saved.pos[1]),
        size: Size::new(saved.size[0], saved.size[1]),
        properties,
        inputs: definition.input_ports.clone(),
        outputs: definition.output_ports.clone(),
        flags: saved.flags.clone(),
        mode: saved.mode,
        widget_choices: BTreeMap::new(),
        execution_state: ExecutionState::idle(),
    }
}

fn restore_link(
    saved: &SerializedLink,
    nodes: &BTreeMap<NodeId, GraphNode>,
) -> Result<GraphLink, GraphError> {
    let (source_id, source_port) = saved.origin();
    let (target_id, target_port) = saved.target();

    let source = nodes.get(&source_id).ok_or(GraphError::NodeNotFound(source_id))?;
    let target = nodes.get(&target_id).ok_or(GraphError::NodeNotFound(target_id))?;

    let output = source.outputs.get(source_port).ok_or(GraphError::PortNotFound {
        node_id: source_id,
        direction: "output",
        index: source_port,
    })?;
    let input = target.inputs.get(target_port).ok_or(GraphError::PortNotFound {
        node_id: target_id,
        direction: "input",
        index: target_port,
    })?;

    if output.port_type != input.port_type {
        return Err(GraphError::PortTypeMismatch {
            source_type: output.port_type.clone(),
            target_type: input.port_type.clone(),
        });
    }

    Ok(GraphLink {
        id: saved.id(),
        source_node_id: source_id,
        source_port_index: source_port,
        target_node_id: target_id,
        target_port_index: target_port,
        port_type: output.port_type.clone(),
    })
}

fn restore_meta(extra: &Map<String, Value>) -> GraphMeta {
    let mut meta = GraphMeta::fresh();
    if let Some(id) = extra.get("id").and_then(Value::as_str) {
        meta.id = id.to_string();
    }
    if let Some(name) = extra.get("name").and_then(Value::as_str) {
        meta.name = name.to_string();
    }
    if let Some(description) = extra.get("description").and_then(Value::as_str) {
        meta.description = description.to_string();
    }
    if let Some(created) = extra.get("created_at").and_then(|v| serde_json::from_value(v.clone()).ok()) {
        meta.created_at = created;
    }
    if let Some(updated) = extra.get("updated_at").and_then(|v| serde_json::from_value(v.clone()).ok()) {
        meta.updated_at = updated;
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeParams;
    use crate::nodes::{CurrentDataset, Limit, SetAppView};
    use serde_json::json;

    fn source_and_limit(model: &mut GraphModel, catalog: &NodeCatalog) -> (NodeId, NodeId) {
        let src = model.add_node(catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
        let limit = model.add_node(catalog, Limit::TYPE_ID, Position::new(280.0, 0.0)).unwrap().id;
        (src, limit)
    }

    #[test]
    fn test_add_node_assigns_increasing_ids() {
        let catalog = NodeCatalog::bundled();
        let mut model = GraphModel::new();

        let ids: Vec<NodeId> = (0..5)
            .map(|_| model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_add_unknown_type_leaves_model_untouched() {
        let catalog = NodeCatalog::bundled();
        let mut model = GraphModel::new();

        let err = model.add_node(&catalog, "Nope", Position::default()).unwrap_err();
        assert_eq!(err, GraphError::UnknownNodeType("Nope".to_string()));
        assert!(model.is_empty());

        let next = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;
        assert_eq!(next, 1);
    }

    #[test]
    fn test_connect_into_terminal_node() {
        let catalog = NodeCatalog::bundled();
        let mut model = GraphModel::new();
        let (src, limit) = source_and_limit(&mut model, &catalog);
        let sink = model.add_node(&catalog, SetAppView::TYPE_ID, Position::default()).unwrap().id;

        model.connect(src, 0, limit, 0).unwrap();
        model.connect(limit, 0, sink, 0).unwrap();

        assert_eq!(model.parents(sink), vec![limit]);
        assert_eq!(model.children(src), vec![limit]);
        assert_eq!(model.execution_order(), vec![src, limit, sink]);
    }

    #[test]
    fn test_connect_to_missing_port() {
        let catalog = NodeCatalog::bundled();
        let mut model = GraphModel::new();
        let (src, limit) = source_and_limit(&mut model, &catalog);

        let err = model.connect(limit, 0, src, 0).unwrap_err();
        assert_eq!(
            err,
            GraphError::PortNotFound { node_id: src, direction: "input", index: 0 }
        );
        assert_eq!(model.link_count(), 0);
    }

    #[test]
    fn test_try_connect_refuses_occupied_port() {
        let catalog = NodeCatalog::bundled();
        let mut model = GraphModel::new();
        let (src, limit) = source_and_limit(&mut model, &catalog);
        let first = model.try_connect(src, 0, limit, 0).unwrap();

        let err = model.try_connect(src, 0, limit, 0).unwrap_err();
        assert_eq!(
            err,
            GraphError::TargetPortOccupied {
                target_node_id: limit,
                target_port: 0,
                existing_link: first.id,
            }
        );
    }

    #[test]
    fn test_meta_travels_in_extra() {
        let catalog = NodeCatalog::bundled();
        let mut model = GraphModel::new();
        model.rename("Duplicates");
        model.describe("find them");
        source_and_limit(&mut model, &catalog);

        let snapshot = model.serialize();
        assert_eq!(snapshot.extra["name"], json!("Duplicates"));
        assert_eq!(snapshot.extra["id"], json!(model.meta().id));

        let restored = GraphModel::from_serialized(&snapshot, &catalog).unwrap();
        assert_eq!(restored.meta(), model.meta());
    }

    #[test]
    fn test_clear_gives_new_identity() {
        let catalog = NodeCatalog::bundled();
        let mut model = GraphModel::new();
        source_and_limit(&mut model, &catalog);
        let old_id = model.meta().id.clone();

        model.clear();
        assert!(model.is_empty());
        assert_eq!(model.link_count(), 0);
        assert_ne!(model.meta().id, old_id);

        let next = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;
        assert_eq!(next, 3);
    }
}
