use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Broad grouping shown in the node palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Source,
    Transform,
    Analysis,
    Model,
    Evaluation,
    Output,
}

/// Value kind of a configurable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    Float,
    Boolean,
    Enumeration,
    #[serde(rename = "list")]
    ListOfString,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericBounds {
    pub min: f64,
    pub max: f64,
}

impl NumericBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Schema for a configurable parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "default", default)]
    pub default_value: Value,
    #[serde(default)]
    pub required: bool,
    /// Static choices; dynamic parameters are filled per node by the populator
    #[serde(rename = "values", default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration_values: Vec<String>,
    #[serde(rename = "bounds", default, skip_serializing_if = "Option::is_none")]
    pub numeric_bounds: Option<NumericBounds>,
    #[serde(rename = "dynamic", default)]
    pub is_dynamic: bool,
}

/// Metadata describing a port (input or output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: String,
}

pub type ParameterSchema = BTreeMap<String, ParameterSpec>;

/// Complete metadata for a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeDefinition {
    #[serde(rename = "type")]
    pub type_id: String,
    pub label: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(rename = "inputs", default)]
    pub input_ports: Vec<PortSpec>,
    #[serde(rename = "outputs", default)]
    pub output_ports: Vec<PortSpec>,
    #[serde(rename = "params_schema", default)]
    pub parameter_schema: ParameterSchema,
}

fn default_color() -> String {
    "#6B7280".to_string()
}

impl NodeTypeDefinition {
    /// Fresh property bag for a new node.
    ///
    /// Every value is cloned out of the schema so nodes never share defaults.
    pub fn default_properties(&self) -> Map<String, Value> {
        self.parameter_schema
            .iter()
            .map(|(name, spec)| (name.clone(), spec.default_value.clone()))
            .collect()
    }

    pub fn dynamic_parameters(&self) -> impl Iterator<Item = (&String, &ParameterSpec)> {
        self.parameter_schema.iter().filter(|(_, spec)| spec.is_dynamic)
    }

    pub fn input_port(&self, index: usize) -> Option<&PortSpec> {
        self.input_ports.get(index)
    }

    pub fn output_port(&self, index: usize) -> Option<&PortSpec> {
        self.output_ports.get(index)
    }
}

/// A typed property record for one node type.
///
/// Implemented by `#[derive(NodeType)]`; the derived `definition()` reads
/// parameter defaults from the record's `Default` impl.
pub trait NodeParams: Default + Serialize + DeserializeOwned {
    const TYPE_ID: &'static str;

    fn definition() -> NodeTypeDefinition;
}

// Factory type for creating definitions at runtime
pub type DefinitionFactory = fn() -> NodeTypeDefinition;

// Wrapper for inventory collection
pub struct NodeTypeRegistration(pub DefinitionFactory);

inventory::collect!(NodeTypeRegistration);
