use serde_json::json;
use viewgraph::catalog::{NodeParams, PortSpec};
use viewgraph::graph::{GraphModel, NodeStatus, Position};
use viewgraph::nodes::{Count, CurrentDataset, Limit, MatchTags, SetAppView, SortBy};
use viewgraph::{GraphError, NodeCatalog};

#[test]
fn test_new_nodes_do_not_share_defaults() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let a = model.add_node(&catalog, MatchTags::TYPE_ID, Position::default()).unwrap().id;
    let b = model.add_node(&catalog, MatchTags::TYPE_ID, Position::default()).unwrap().id;

    model.set_property(a, "tags", json!(["validation"])).unwrap();

    assert_eq!(model.node(a).unwrap().property("tags"), Some(&json!(["validation"])));
    assert_eq!(model.node(b).unwrap().property("tags"), Some(&json!([])));
    assert_eq!(catalog.default_properties(MatchTags::TYPE_ID).unwrap()["tags"], json!([]));
}

#[test]
fn test_new_node_starts_idle_with_catalog_ports() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let node = model.add_node(&catalog, Limit::TYPE_ID, Position::new(10.0, 20.0)).unwrap();

    assert_eq!(node.execution_state.status, NodeStatus::Idle);
    assert_eq!(node.title, "Limit");
    assert_eq!(node.inputs.len(), 1);
    assert_eq!(node.outputs.len(), 1);
    assert_eq!(node.position, Position::new(10.0, 20.0));
}

#[test]
fn test_remove_node_drops_its_links() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let src = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    let sort = model.add_node(&catalog, SortBy::TYPE_ID, Position::default()).unwrap().id;
    let limit = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;
    let sink = model.add_node(&catalog, SetAppView::TYPE_ID, Position::default()).unwrap().id;
    model.connect(src, 0, sort, 0).unwrap();
    model.connect(sort, 0, limit, 0).unwrap();
    model.connect(limit, 0, sink, 0).unwrap();

    model.remove_node(sort).unwrap();

    assert_eq!(model.link_count(), 1);
    assert!(model.links().all(|l| !l.touches(sort)));
    for link in model.links() {
        assert!(model.contains_node(link.source_node_id));
        assert!(model.contains_node(link.target_node_id));
    }
    assert_eq!(model.remove_node(sort).unwrap_err(), GraphError::NodeNotFound(sort));
}

#[test]
fn test_connect_replaces_occupied_input() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let first = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    let second = model.add_node(&catalog, SortBy::TYPE_ID, Position::default()).unwrap().id;
    let limit = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;

    let old = model.connect(first, 0, limit, 0).unwrap();
    let new = model.connect(second, 0, limit, 0).unwrap();

    assert_eq!(model.link_count(), 1);
    assert!(model.link(old.id).is_none());
    assert_eq!(model.link_into(limit, 0).map(|l| l.id), Some(new.id));
    assert_eq!(model.parents(limit), vec![second]);
}

#[test]
fn test_one_output_feeds_many_inputs() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let src = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    let count = model.add_node(&catalog, Count::TYPE_ID, Position::default()).unwrap().id;
    let limit = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;

    model.connect(src, 0, count, 0).unwrap();
    model.connect(src, 0, limit, 0).unwrap();

    assert_eq!(model.children(src), vec![count, limit]);
    let snapshot = model.serialize();
    assert_eq!(snapshot.node(src).unwrap().outputs[0].links.len(), 2);
}

#[test]
fn test_port_type_mismatch_is_rejected() {
    let mut sink = SetAppView::definition();
    sink.input_ports = vec![PortSpec { name: "table".to_string(), port_type: "table".to_string() }];
    let catalog = NodeCatalog::from_definitions(vec![CurrentDataset::definition(), sink]);

    let mut model = GraphModel::new();
    let src = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    let dst = model.add_node(&catalog, SetAppView::TYPE_ID, Position::default()).unwrap().id;

    let err = model.connect(src, 0, dst, 0).unwrap_err();
    assert_eq!(
        err,
        GraphError::PortTypeMismatch {
            source_type: "view".to_string(),
            target_type: "table".to_string(),
        }
    );
    assert_eq!(model.link_count(), 0);
}

#[test]
fn test_set_properties_merges() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let tags = model.add_node(&catalog, MatchTags::TYPE_ID, Position::default()).unwrap().id;

    let mut partial = serde_json::Map::new();
    partial.insert("match_all".to_string(), json!(true));
    model.set_properties(tags, partial).unwrap();

    let node = model.node(tags).unwrap();
    assert_eq!(node.property("match_all"), Some(&json!(true)));
    assert_eq!(node.property("include"), Some(&json!(true)));
    assert_eq!(
        model.set_property(99, "x", json!(1)).unwrap_err(),
        GraphError::NodeNotFound(99)
    );
}

#[test]
fn test_disconnect_unknown_link_is_noop() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let src = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    let limit = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;
    let link = model.connect(src, 0, limit, 0).unwrap();

    assert!(model.disconnect(link.id + 10).is_none());
    assert_eq!(model.disconnect(link.id), Some(link));
    assert_eq!(model.link_count(), 0);
}

#[test]
fn test_round_trip_across_catalog_swap() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();
    let src = model.add_node(&catalog, CurrentDataset::TYPE_ID, Position::default()).unwrap().id;
    let limit = model.add_node(&catalog, Limit::TYPE_ID, Position::default()).unwrap().id;
    model.connect(src, 0, limit, 0).unwrap();
    model.set_property(limit, "count", json!(50)).unwrap();
    let snapshot = model.serialize();

    let mut relabeled = Limit::definition();
    relabeled.label = "First N".to_string();
    let swapped = NodeCatalog::from_definitions(vec![CurrentDataset::definition(), relabeled]);

    let restored = GraphModel::from_serialized(&snapshot, &swapped).unwrap();
    assert_eq!(restored.node(limit).unwrap().title, "First N");
    assert_eq!(restored.node(limit).unwrap().property("count"), Some(&json!(50)));
    assert_eq!(restored.link_count(), 1);

    let narrow = NodeCatalog::from_definitions(vec![Limit::definition()]);
    let mut target = restored.clone();
    let err = target.deserialize(&snapshot, &narrow).unwrap_err();
    assert_eq!(err, GraphError::UnknownNodeType(CurrentDataset::TYPE_ID.to_string()));
    assert_eq!(target.node_count(), 2);
    assert_eq!(target.node(limit).unwrap().title, "First N");
}

#[test]
fn test_new_node_properties_match_parameter_schema() {
    let catalog = NodeCatalog::bundled();
    let mut model = GraphModel::new();

    for definition in catalog.definitions() {
        let node = model.add_node(&catalog, &definition.type_id, Position::default()).unwrap();
        let property_keys: Vec<&String> = node.properties.keys().collect();
        let schema_keys: Vec<&String> = definition.parameter_schema.keys().collect();
        assert_eq!(property_keys, schema_keys, "{}", definition.type_id);
    }
}
