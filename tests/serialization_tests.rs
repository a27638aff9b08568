use serde_json::json;
use viewgraph::catalog::NodeParams;
use viewgraph::graph::{GraphModel, NodeStatus, Position, SerializedGraph};
use viewgraph::nodes::{CurrentDataset, Limit, NodeKind};
use viewgraph::persistence::TemplateLibrary;
use viewgraph::{GraphError, NodeCatalog};

#[test]
fn test_source_to_limit_serializes_one_link() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let src = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    let limit = model.add_node(&catalog, Limit::TYPE_ID, Position::new(280.0, 0.0)).unwrap().id;
    model.set_property(limit, "count", json!(50)).unwrap();
    model.connect(src, 0, limit, 0).unwrap();

    let value = serde_json::to_value(model.serialize()).unwrap();

    assert_eq!(value["links"], json!([[1, src, 0, limit, 0, "view"]]));
    let limit_node = value["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == json!(limit))
        .unwrap();
    assert_eq!(limit_node["properties"]["count"], json!(50));
    assert_eq!(limit_node["type"], json!("View Stages/Limit"));
    assert_eq!(limit_node["inputs"][0]["link"], json!(1));
    assert_eq!(value["last_node_id"], json!(2));
    assert_eq!(value["last_link_id"], json!(1));
}

#[test]
fn test_order_is_topological() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    // Added downstream-first so id order and topological order differ
    let limit = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;
    let src = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    model.connect(src, 0, limit, 0).unwrap();

    let graph = model.serialize();
    assert_eq!(graph.node(src).unwrap().order, 0);
    assert_eq!(graph.node(limit).unwrap().order, 1);
}

#[test]
fn test_round_trip_drops_run_state() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let src = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    let limit = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;
    model.connect(src, 0, limit, 0).unwrap();
    model.set_execution_state(
        limit,
        viewgraph::graph::ExecutionState::failed("boom"),
    );

    let json = model.serialize().to_json().unwrap();
    let restored = GraphModel::from_serialized(&SerializedGraph::from_json(&json).unwrap(), &catalog).unwrap();

    assert_eq!(restored.node_count(), 2);
    assert_eq!(restored.link_count(), 1);
    assert_eq!(restored.node(limit).unwrap().execution_state.status, NodeStatus::Idle);
    assert_eq!(restored.serialize().links, model.serialize().links);
}

#[test]
fn test_missing_properties_take_defaults_on_load() {
    let catalog = NodeCatalog::bundled();
    let graph = SerializedGraph::from_value(json!({
        "nodes": [{"id": 4, "type": "View Stages/Limit", "properties": {}}],
        "links": []
    }))
    .unwrap();

    let mut model = GraphModel::from_serialized(&graph, &catalog).unwrap();
    assert_eq!(model.node(4).unwrap().property("count"), Some(&json!(10)));

    let next = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;
    assert_eq!(next, 5);
}

#[test]
fn test_bundled_templates_load_into_bundled_catalog() {
    let catalog = NodeCatalog::bundled();
    let library = TemplateLibrary::bundled();

    let summaries = library.list();
    assert_eq!(summaries.len(), library.ids().count());

    for summary in summaries {
        let loaded = library.load(&summary.id).unwrap().unwrap();
        let model = GraphModel::from_serialized(&loaded.graph, &catalog).unwrap();
        assert_eq!(model.node_count(), summary.node_count);
        assert_eq!(model.meta().name, loaded.name);

        for node in model.nodes() {
            NodeKind::from_properties(&node.type_id, &node.properties).unwrap();
        }
    }
    assert!(library.load("no-such-template").unwrap().is_none());
}

#[test]
fn test_exhausted_id_space_rejects_snapshot() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let src = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    let before = model.serialize();

    let at_max_node = SerializedGraph::from_value(json!({
        "nodes": [{"id": u64::MAX, "type": "View Stages/Limit", "properties": {}}],
        "links": []
    }))
    .unwrap();
    let err = model.deserialize(&at_max_node, &catalog).unwrap_err();
    assert!(matches!(err, GraphError::IdSpaceExhausted { what: "node" }));

    let at_max_link = SerializedGraph::from_value(json!({
        "last_link_id": u64::MAX,
        "nodes": [],
        "links": []
    }))
    .unwrap();
    let err = model.deserialize(&at_max_link, &catalog).unwrap_err();
    assert!(matches!(err, GraphError::IdSpaceExhausted { what: "link" }));

    assert_eq!(model.node_count(), 1);
    assert!(model.contains_node(src));
    assert_eq!(model.serialize().nodes, before.nodes);
    let next = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;
    assert_eq!(next, src + 1);
}
