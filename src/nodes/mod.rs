//! Typed property records for the bundled node set.
//!
//! Each record derives `NodeType`, which produces its catalog definition.
//! `NodeKind` turns an untyped property bag back into the matching record.

pub mod aggregations;
pub mod brain;
pub mod evaluation;
pub mod model;
pub mod output;
pub mod source;
pub mod view_stages;

pub use aggregations::{Bounds, Count, CountValues, Distinct};
pub use brain::{
    ComputeEmbeddings, ComputeMistakenness, ComputeSimilarity, ComputeUniqueness,
    ComputeVisualization, FindNearDuplicates, ManageBrainRun,
};
pub use evaluation::{
    EvaluateClassifications, EvaluateDetections, EvaluateRegressions, EvaluateSegmentations,
    ManageEvaluation, ToEvaluationPatches,
};
pub use model::ApplyZooModel;
pub use output::{SaveView, SetAppView, TagSamples};
pub use source::{CurrentDataset, LoadSavedView};
pub use view_stages::{
    Exists, FilterLabels, Limit, Match, MatchTags, SelectFields, SortBy, Take, ToPatches,
};

use serde_json::{Map, Value};

use crate::catalog::{NodeParams, NodeTypeDefinition};
use crate::error::GraphError;

macro_rules! node_kinds {
    ($($variant:ident),* $(,)?) => {
        /// A node's properties decoded into its typed record
        #[derive(Debug, Clone, PartialEq)]
        pub enum NodeKind {
            $($variant($variant),)*
        }

        impl NodeKind {
            /// Decode `properties` for the node type `type_id`.
            ///
            /// Missing keys take the record's defaults.
            pub fn from_properties(type_id: &str, properties: &Map<String, Value>) -> Result<Self, GraphError> {
                $(
                    if type_id == <$variant as NodeParams>::TYPE_ID {
                        return serde_json::from_value::<$variant>(Value::Object(properties.clone()))
                            .map(NodeKind::$variant)
                            .map_err(|e| GraphError::InvalidProperties {
                                type_id: type_id.to_string(),
                                message: e.to_string(),
                            });
                    }
                )*
                Err(GraphError::UnknownNodeType(type_id.to_string()))
            }

            pub fn type_id(&self) -> &'static str {
                match self {
                    $(NodeKind::$variant(_) => <$variant as NodeParams>::TYPE_ID,)*
                }
            }

            /// Re-encode the record as a property bag
            pub fn to_properties(&self) -> Map<String, Value> {
                let value = match self {
                    $(NodeKind::$variant(params) => serde_json::to_value(params),)*
                };
                match value {
                    Ok(Value::Object(map)) => map,
                    _ => Map::new(),
                }
            }
        }

        /// Definitions for every bundled node type
        pub fn bundled_definitions() -> Vec<NodeTypeDefinition> {
            vec![$(<$variant as NodeParams>::definition(),)*]
        }
    };
}

node_kinds!(
    CurrentDataset,
    LoadSavedView,
    Match,
    MatchTags,
    FilterLabels,
    SortBy,
    Limit,
    Exists,
    Take,
    SelectFields,
    ToPatches,
    Count,
    CountValues,
    Distinct,
    Bounds,
    ComputeEmbeddings,
    ComputeVisualization,
    ComputeSimilarity,
    ComputeUniqueness,
    ComputeMistakenness,
    FindNearDuplicates,
    ManageBrainRun,
    ApplyZooModel,
    EvaluateDetections,
    EvaluateClassifications,
    EvaluateSegmentations,
    EvaluateRegressions,
    ToEvaluationPatches,
    ManageEvaluation,
    SetAppView,
    SaveView,
    TagSamples,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limit_definition() {
        let def = Limit::definition();
        assert_eq!(def.type_id, "View Stages/Limit");
        assert_eq!(def.input_ports.len(), 1);
        assert_eq!(def.output_ports.len(), 1);
        assert_eq!(def.input_ports[0].port_type, "view");

        let count = &def.parameter_schema["count"];
        assert_eq!(count.default_value, json!(10));
        assert!(count.numeric_bounds.is_some());
    }

    #[test]
    fn test_port_fields_are_not_properties() {
        let props = Limit::definition().default_properties();
        assert!(!props.contains_key("_input"));
        assert!(!props.contains_key("_output"));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_from_properties_fills_defaults() {
        let mut props = Map::new();
        props.insert("expression".to_string(), json!("F('confidence') > 0.9"));

        let kind = NodeKind::from_properties(FilterLabels::TYPE_ID, &props).unwrap();
        match &kind {
            NodeKind::FilterLabels(params) => {
                assert_eq!(params.expression, "F('confidence') > 0.9");
                assert!(params.only_matches);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(kind.type_id(), FilterLabels::TYPE_ID);
        assert_eq!(kind.to_properties()["only_matches"], json!(true));
    }

    #[test]
    fn test_from_properties_rejects_bad_types() {
        let mut props = Map::new();
        props.insert("count".to_string(), json!("ten"));

        let err = NodeKind::from_properties(Limit::TYPE_ID, &props).unwrap_err();
        assert!(matches!(err, GraphError::InvalidProperties { .. }));
    }

    #[test]
    fn test_unknown_type() {
        let err = NodeKind::from_properties("Nope", &Map::new()).unwrap_err();
        assert_eq!(err, GraphError::UnknownNodeType("Nope".to_string()));
    }

    #[test]
    fn test_bundled_type_ids_are_unique() {
        let defs = bundled_definitions();
        let mut ids: Vec<&str> = defs.iter().map(|d| d.type_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), defs.len());
    }
}
