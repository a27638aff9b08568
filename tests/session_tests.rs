mod common;

use common::{bundled_config, quickstart_schema, session_with, ScriptedExecutor};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

use viewgraph::catalog::NodeParams;
use viewgraph::config::StorageConfig;
use viewgraph::execution::GraphExecutor;
use viewgraph::graph::Position;
use viewgraph::nodes::{CurrentDataset, FilterLabels, Limit, SortBy};
use viewgraph::persistence::GraphScope;
use viewgraph::session::NoticeLevel;
use viewgraph::{EditorSession, GraphError, NodeCatalog, PersistenceError};

#[tokio::test]
async fn test_new_session_fetches_schema() {
    let executor = ScriptedExecutor::with_schema(quickstart_schema());
    let session = EditorSession::new(bundled_config(), Some(executor as Arc<dyn GraphExecutor>))
        .await
        .unwrap();

    assert_eq!(session.schema().dataset_name, "quickstart");
    assert!(!session.hidden_types().contains(FilterLabels::TYPE_ID));
    assert_eq!(session.dataset_scope(), GraphScope::dataset("quickstart"));
    assert!(session.notices().is_empty());
}

#[tokio::test]
async fn test_missing_schema_degrades_to_placeholders() {
    let executor = ScriptedExecutor::new();
    let mut session = EditorSession::new(bundled_config(), Some(executor as Arc<dyn GraphExecutor>))
        .await
        .unwrap();

    assert!(session.hidden_types().contains(FilterLabels::TYPE_ID));
    assert_eq!(session.dataset_scope(), GraphScope::Shared);
    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(session.notices().is_empty());

    let filter = session.add_node(FilterLabels::TYPE_ID, Position::default()).unwrap();
    assert_eq!(
        session.model().node(filter).unwrap().choices("field"),
        Some(&["(no label fields)".to_string()][..])
    );
}

#[tokio::test]
async fn test_file_storage_from_config() {
    let dir = tempdir().unwrap();
    let mut config = bundled_config();
    config.storage = StorageConfig::File { dir: dir.path().join("graphs") };

    let mut session = EditorSession::new(config, None).await.unwrap();
    session.add_node(CurrentDataset::TYPE_ID, Position::default()).unwrap();
    session.save(&GraphScope::Shared, "on disk", false).await.unwrap();

    assert!(dir.path().join("graphs").join("shared").exists());
}

#[tokio::test]
async fn test_schema_change_refreshes_choices_and_flags_stale() {
    let mut session = session_with(ScriptedExecutor::new());
    session.apply_schema(quickstart_schema());
    let filter = session.add_node(FilterLabels::TYPE_ID, Position::default()).unwrap();
    session.set_property(filter, "field", json!("predictions")).unwrap();
    assert!(session.stale_selections().is_empty());

    let mut renamed = quickstart_schema();
    renamed.label_fields = vec!["ground_truth".to_string(), "model_v2".to_string()];
    session.apply_schema(renamed);

    let node = session.model().node(filter).unwrap();
    assert_eq!(
        node.choices("field"),
        Some(&["ground_truth".to_string(), "model_v2".to_string()][..])
    );
    assert_eq!(node.property("field"), Some(&json!("predictions")));
    assert_eq!(session.stale_selections().len(), 1);
}

#[tokio::test]
async fn test_stale_flagging_can_be_disabled() {
    let mut config = bundled_config();
    config.flag_stale_selections = false;
    let mut session = EditorSession::with_parts(
        config,
        NodeCatalog::bundled(),
        Arc::new(viewgraph::persistence::MemoryStore::new()),
        None,
    );
    session.apply_schema(quickstart_schema());
    let filter = session.add_node(FilterLabels::TYPE_ID, Position::default()).unwrap();
    session.set_property(filter, "field", json!("nope")).unwrap();

    assert!(session.stale_selections().is_empty());
}

#[tokio::test]
async fn test_node_defaults_resolve_dynamic_choices() {
    let mut session = session_with(ScriptedExecutor::new());
    session.apply_schema(quickstart_schema());

    let sort = session.node_defaults(SortBy::TYPE_ID).unwrap();
    assert_eq!(
        sort.parameter_schema["field"].enumeration_values,
        quickstart_schema().fields
    );
    assert!(matches!(
        session.node_defaults("Nope/Missing"),
        Err(GraphError::UnknownNodeType(_))
    ));
}

#[tokio::test]
async fn test_append_node_spaces_nodes() {
    let mut session = session_with(ScriptedExecutor::new());
    let first = session.add_node(CurrentDataset::TYPE_ID, Position::new(40.0, 80.0)).unwrap();
    let second = session.append_node(Limit::TYPE_ID).unwrap();

    let spacing = session.config().node_spacing;
    assert_eq!(session.model().node(first).unwrap().position, Position::new(40.0, 80.0));
    assert_eq!(
        session.model().node(second).unwrap().position,
        Position::new(40.0 + spacing, 80.0)
    );
}

#[tokio::test]
async fn test_mistyped_property_edit_is_rejected() {
    let mut session = session_with(ScriptedExecutor::new());
    let limit = session.add_node(Limit::TYPE_ID, Position::default()).unwrap();
    session.set_property(limit, "count", json!(25)).unwrap();

    let err = session.set_property(limit, "count", json!("many")).unwrap_err();
    assert!(matches!(err, GraphError::InvalidProperties { .. }));
    assert_eq!(
        session.model().node(limit).unwrap().property("count"),
        Some(&json!(25))
    );
    assert!(matches!(
        session.set_property(99, "count", json!(1)),
        Err(GraphError::NodeNotFound(99))
    ));
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let mut session = session_with(ScriptedExecutor::new());
    let src = session.add_node(CurrentDataset::TYPE_ID, Position::default()).unwrap();
    let limit = session.append_node(Limit::TYPE_ID).unwrap();
    session.connect(src, 0, limit, 0).unwrap();
    session.set_property(limit, "count", json!(50)).unwrap();

    let scope = GraphScope::dataset("quickstart");
    let receipt = session.save(&scope, "Top fifty", false).await.unwrap();
    assert_eq!(session.saved_graphs(&scope).len(), 1);

    session.clear();
    assert_eq!(session.model().node_count(), 0);

    session.load(&scope, &receipt.id).await.unwrap();
    assert_eq!(session.model().node_count(), 2);
    assert_eq!(session.model().link_count(), 1);
    assert_eq!(session.model().meta().name, "Top fifty");
    assert_eq!(
        session.model().node(limit).unwrap().property("count"),
        Some(&json!(50))
    );
}

#[tokio::test]
async fn test_failed_load_leaves_graph_alone() {
    let mut session = session_with(ScriptedExecutor::new());
    session.add_node(CurrentDataset::TYPE_ID, Position::default()).unwrap();
    let before = session.model().serialize();

    let err = session.load(&GraphScope::Shared, "missing").await.unwrap_err();
    assert!(matches!(err, PersistenceError::NotFound(_)));
    assert_eq!(session.model().serialize(), before);
    assert!(session
        .notices()
        .iter()
        .any(|n| n.level == NoticeLevel::Error));
}

#[tokio::test]
async fn test_load_template() {
    let mut session = session_with(ScriptedExecutor::new());
    let templates = session.list(&GraphScope::Template).await.unwrap();

    session.load(&GraphScope::Template, &templates[0].id).await.unwrap();
    assert_eq!(session.model().node_count(), templates[0].node_count);
    assert_eq!(session.model().meta().name, templates[0].name);
}

#[tokio::test]
async fn test_replace_catalog_keeps_graph_when_type_missing() {
    let mut session = session_with(ScriptedExecutor::new());
    session.add_node(CurrentDataset::TYPE_ID, Position::default()).unwrap();
    session.append_node(Limit::TYPE_ID).unwrap();

    let narrow = NodeCatalog::from_definitions(vec![Limit::definition()]);
    assert!(session.replace_catalog(narrow).is_err());
    assert!(session.catalog().contains(CurrentDataset::TYPE_ID));
    assert_eq!(session.model().node_count(), 2);

    let mut relabeled = Limit::definition();
    relabeled.label = "First N".to_string();
    let wider = NodeCatalog::from_definitions(vec![CurrentDataset::definition(), relabeled]);
    session.replace_catalog(wider).unwrap();
    assert_eq!(session.catalog().len(), 2);
    assert!(session.model().nodes().any(|n| n.title == "First N"));
}
