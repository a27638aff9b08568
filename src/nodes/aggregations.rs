//! Aggregations are terminal: they report a result payload and pass no view on.

use serde::{Deserialize, Serialize};
use viewgraph_macros::NodeType;

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Aggregations/Count",
    label = "Count",
    category = "analysis",
    color = "#F59E0B",
    description = "Count samples, or the values of a field"
)]
pub struct Count {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[param(kind = "enumeration", dynamic)]
    pub field: Option<String>,
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Aggregations/Count Values",
    label = "Count Values",
    category = "analysis",
    color = "#F59E0B",
    description = "Histogram of the distinct values of a field"
)]
pub struct CountValues {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[param(kind = "enumeration", required, dynamic)]
    pub field: Option<String>,
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Aggregations/Distinct",
    label = "Distinct",
    category = "analysis",
    color = "#F59E0B",
    description = "Distinct values of a field"
)]
pub struct Distinct {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[param(kind = "enumeration", required, dynamic)]
    pub field: Option<String>,
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Aggregations/Bounds",
    label = "Bounds",
    category = "analysis",
    color = "#F59E0B",
    description = "Minimum and maximum of a numeric field"
)]
pub struct Bounds {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[param(kind = "enumeration", required, dynamic)]
    pub field: Option<String>,
}
