use std::collections::HashMap;

use log::{info, warn};
use serde_json::{Map, Value};

use super::{NodeTypeDefinition, NodeTypeRegistration};
use crate::error::GraphError;
use crate::execution::GraphExecutor;

/// Registry of every node type known to the session.
///
/// The catalog is immutable once built; a refresh replaces it wholesale.
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    definitions: Vec<NodeTypeDefinition>,
    index: HashMap<String, usize>,
}

impl NodeCatalog {
    pub fn from_definitions(mut definitions: Vec<NodeTypeDefinition>) -> Self {
        definitions.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.type_id.cmp(&b.type_id))
        });
        definitions.dedup_by(|a, b| a.type_id == b.type_id);

        let index = definitions
            .iter()
            .enumerate()
            .map(|(i, def)| (def.type_id.clone(), i))
            .collect();

        Self { definitions, index }
    }

    /// The node types compiled into this crate
    pub fn bundled() -> Self {
        Self::from_definitions(crate::nodes::bundled_definitions())
    }

    /// Bundled types plus anything else submitted through `inventory`
    pub fn from_inventory() -> Self {
        let mut definitions = crate::nodes::bundled_definitions();
        for registration in inventory::iter::<NodeTypeRegistration> {
            let def = (registration.0)();
            if !definitions.iter().any(|d| d.type_id == def.type_id) {
                definitions.push(def);
            }
        }
        Self::from_definitions(definitions)
    }

    /// Load the catalog from the executor's introspection endpoint, falling
    /// back to the bundled list when the request fails or returns nothing.
    pub async fn load(executor: Option<&dyn GraphExecutor>) -> Self {
        let Some(executor) = executor else {
            return Self::bundled();
        };

        match executor.get_node_catalog().await {
            Ok(definitions) if !definitions.is_empty() => {
                info!("Loaded {} node types from executor", definitions.len());
                Self::from_definitions(definitions)
            }
            Ok(_) => {
                warn!("Executor returned an empty node catalog, using bundled catalog");
                Self::bundled()
            }
            Err(e) => {
                warn!("Failed to fetch node catalog ({:#}), using bundled catalog", e);
                Self::bundled()
            }
        }
    }

    pub fn lookup(&self, type_id: &str) -> Option<&NodeTypeDefinition> {
        self.index.get(type_id).map(|&i| &self.definitions[i])
    }

    pub fn require(&self, type_id: &str) -> Result<&NodeTypeDefinition, GraphError> {
        self.lookup(type_id)
            .ok_or_else(|| GraphError::UnknownNodeType(type_id.to_string()))
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.index.contains_key(type_id)
    }

    /// Deep-copied default properties for a new node of `type_id`
    pub fn default_properties(&self, type_id: &str) -> Result<Map<String, Value>, GraphError> {
        Ok(self.require(type_id)?.default_properties())
    }

    pub fn definitions(&self) -> &[NodeTypeDefinition] {
        &self.definitions
    }

    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.type_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, NodeParams};
    use crate::nodes::{CurrentDataset, Limit};

    #[test]
    fn test_bundled_catalog_is_ordered_by_category() {
        let catalog = NodeCatalog::bundled();
        assert!(!catalog.is_empty());

        let categories: Vec<Category> = catalog.definitions().iter().map(|d| d.category).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
        assert_eq!(catalog.definitions()[0].category, Category::Source);
    }

    #[test]
    fn test_lookup_and_require() {
        let catalog = NodeCatalog::bundled();

        let limit = catalog.lookup(Limit::TYPE_ID).expect("Limit not found");
        assert_eq!(limit.label, "Limit");
        assert!(catalog.contains(CurrentDataset::TYPE_ID));

        assert!(catalog.lookup("Nope/Missing").is_none());
        assert_eq!(
            catalog.require("Nope/Missing").unwrap_err(),
            GraphError::UnknownNodeType("Nope/Missing".to_string())
        );
    }

    #[test]
    fn test_duplicate_definitions_collapse() {
        let def = Limit::definition();
        let catalog = NodeCatalog::from_definitions(vec![def.clone(), def]);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_load_without_executor_uses_bundled() {
        let catalog = tokio_test::block_on(NodeCatalog::load(None));
        assert_eq!(catalog.type_ids().collect::<Vec<_>>(), NodeCatalog::bundled().type_ids().collect::<Vec<_>>());
    }

    #[test]
    fn test_inventory_matches_bundled() {
        let bundled = NodeCatalog::bundled();
        let collected = NodeCatalog::from_inventory();
        assert_eq!(bundled.len(), collected.len());
    }
}
