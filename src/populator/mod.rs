//! Keeps dynamic dropdowns and the node palette in sync with the dataset schema.

pub mod rules;

pub use rules::{DynamicRule, VisibilityRule, DYNAMIC_RULES, VISIBILITY_RULES};

use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::catalog::{NodeCatalog, NodeTypeDefinition};
use crate::graph::{GraphModel, GraphNode, NodeId};
use crate::schema::{DatasetSchemaSnapshot, SchemaCollection};

/// A stored value that is not among the node's refreshed choices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaleSelection {
    pub node_id: NodeId,
    pub parameter: String,
    pub value: Value,
}

/// Rule-table driven populator.
#[derive(Debug, Clone, Copy)]
pub struct WidgetPopulator {
    dynamic_rules: &'static [DynamicRule],
    visibility_rules: &'static [VisibilityRule],
}

impl Default for WidgetPopulator {
    fn default() -> Self {
        Self::new(DYNAMIC_RULES, VISIBILITY_RULES)
    }
}

impl WidgetPopulator {
    pub fn new(
        dynamic_rules: &'static [DynamicRule],
        visibility_rules: &'static [VisibilityRule],
    ) -> Self {
        Self { dynamic_rules, visibility_rules }
    }

    /// Collection feeding `parameter` on `type_id`. Rules naming the type
    /// win over rules keyed on the parameter name alone.
    pub fn collection_for(&self, type_id: &str, parameter: &str) -> Option<SchemaCollection> {
        let specific = self
            .dynamic_rules
            .iter()
            .find(|r| r.type_id == Some(type_id) && r.parameter == parameter);
        let generic = || {
            self.dynamic_rules
                .iter()
                .find(|r| r.type_id.is_none() && r.parameter == parameter)
        };
        specific.or_else(generic).map(|r| r.collection)
    }

    /// Legal values for a dynamic parameter, or a single placeholder when the
    /// schema has none.
    pub fn choices_for(
        &self,
        type_id: &str,
        parameter: &str,
        schema: &DatasetSchemaSnapshot,
    ) -> Option<Vec<String>> {
        let collection = self.collection_for(type_id, parameter)?;
        let values = schema.collection(collection);
        if values.is_empty() {
            debug!(
                "No {:?} in schema for {}.{}, using placeholder",
                collection, type_id, parameter
            );
            Some(vec![collection.placeholder().to_string()])
        } else {
            Some(values.to_vec())
        }
    }

    /// Rebuild the choices of every dynamic parameter on `node`.
    ///
    /// Stored property values are left as they are, even when they fall
    /// outside the new choices.
    pub fn apply_schema(
        &self,
        node: &mut GraphNode,
        definition: &NodeTypeDefinition,
        schema: &DatasetSchemaSnapshot,
    ) {
        node.widget_choices.clear();
        for (name, spec) in definition.dynamic_parameters() {
            match self.choices_for(&definition.type_id, name, schema) {
                Some(choices) => {
                    node.widget_choices.insert(name.clone(), choices);
                }
                None if !spec.enumeration_values.is_empty() => {
                    node.widget_choices.insert(name.clone(), spec.enumeration_values.clone());
                }
                None => debug!("No rule for dynamic parameter {}.{}", definition.type_id, name),
            }
        }
    }

    /// Apply `schema` to every node in `model`
    pub fn apply_schema_all(
        &self,
        model: &mut GraphModel,
        catalog: &NodeCatalog,
        schema: &DatasetSchemaSnapshot,
    ) {
        let mut applied = 0;
        for node in model.nodes_mut() {
            if let Some(definition) = catalog.lookup(&node.type_id) {
                self.apply_schema(node, definition, schema);
                applied += 1;
            }
        }
        info!(
            "Applied schema of '{}' to {} node(s)",
            schema.dataset_name, applied
        );
    }

    /// Type ids hidden under `schema`.
    ///
    /// Pure and recomputed from scratch: a type is hidden exactly when one of
    /// its prerequisite collections is empty.
    pub fn recompute_visibility(
        &self,
        catalog: &NodeCatalog,
        schema: &DatasetSchemaSnapshot,
    ) -> BTreeSet<String> {
        self.visibility_rules
            .iter()
            .filter(|rule| catalog.contains(rule.type_id))
            .filter(|rule| rule.requires.iter().any(|&c| schema.collection(c).is_empty()))
            .map(|rule| rule.type_id.to_string())
            .collect()
    }

    /// Catalog entries offered in the palette under `schema`
    pub fn palette<'a>(
        &self,
        catalog: &'a NodeCatalog,
        schema: &DatasetSchemaSnapshot,
    ) -> Vec<&'a NodeTypeDefinition> {
        let hidden = self.recompute_visibility(catalog, schema);
        catalog
            .definitions()
            .iter()
            .filter(|d| !hidden.contains(&d.type_id))
            .collect()
    }

    /// Copy of `definition` with dynamic enumerations resolved against `schema`
    pub fn resolve_definition(
        &self,
        definition: &NodeTypeDefinition,
        schema: &DatasetSchemaSnapshot,
    ) -> NodeTypeDefinition {
        let mut resolved = definition.clone();
        for (name, spec) in resolved.parameter_schema.iter_mut() {
            if !spec.is_dynamic {
                continue;
            }
            if let Some(choices) = self.choices_for(&definition.type_id, name, schema) {
                spec.enumeration_values = choices;
            }
        }
        resolved
    }

    /// Stored values that are not among the current choices. Reports only;
    /// nothing is cleared.
    pub fn stale_selections(&self, model: &GraphModel) -> Vec<StaleSelection> {
        let mut stale = Vec::new();
        for node in model.nodes() {
            for (parameter, choices) in &node.widget_choices {
                let Some(value) = node.properties.get(parameter) else {
                    continue;
                };
                let offending: Vec<&Value> = match value {
                    Value::Null => Vec::new(),
                    Value::String(s) if s.is_empty() => Vec::new(),
                    Value::Array(items) => items.iter().filter(|v| !is_choice(v, choices)).collect(),
                    other => {
                        if is_choice(other, choices) {
                            Vec::new()
                        } else {
                            vec![other]
                        }
                    }
                };
                stale.extend(offending.into_iter().map(|v| StaleSelection {
                    node_id: node.id,
                    parameter: parameter.clone(),
                    value: v.clone(),
                }));
            }
        }
        stale
    }
}

fn is_choice(value: &Value, choices: &[String]) -> bool {
    value.as_str().is_some_and(|s| choices.iter().any(|c| c == s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeParams;
    use crate::nodes::{FilterLabels, SortBy, ToEvaluationPatches};

    #[test]
    fn test_specific_rule_beats_generic() {
        let populator = WidgetPopulator::default();
        assert_eq!(
            populator.collection_for(FilterLabels::TYPE_ID, "field"),
            Some(SchemaCollection::LabelFields)
        );
        assert_eq!(
            populator.collection_for(SortBy::TYPE_ID, "field"),
            Some(SchemaCollection::Fields)
        );
        assert_eq!(
            populator.collection_for(ToEvaluationPatches::TYPE_ID, "eval_key"),
            Some(SchemaCollection::EvaluationKeys)
        );
        assert_eq!(populator.collection_for(SortBy::TYPE_ID, "reverse"), None);
    }

    #[test]
    fn test_empty_collection_yields_placeholder() {
        let populator = WidgetPopulator::default();
        let schema = DatasetSchemaSnapshot::unavailable();

        let choices = populator
            .choices_for(FilterLabels::TYPE_ID, "field", &schema)
            .unwrap();
        assert_eq!(choices, vec!["(no label fields)".to_string()]);
    }

    #[test]
    fn test_resolve_definition_leaves_static_params() {
        let populator = WidgetPopulator::default();
        let schema = DatasetSchemaSnapshot {
            fields: vec!["filepath".to_string(), "uniqueness".to_string()],
            ..Default::default()
        };

        let resolved = populator.resolve_definition(&SortBy::definition(), &schema);
        assert_eq!(
            resolved.parameter_schema["field"].enumeration_values,
            vec!["filepath".to_string(), "uniqueness".to_string()]
        );
        assert!(resolved.parameter_schema["reverse"].enumeration_values.is_empty());
    }
}
