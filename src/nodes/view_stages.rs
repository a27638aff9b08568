//! View stages receive a view and hand a transformed view downstream.

use serde::{Deserialize, Serialize};
use viewgraph_macros::NodeType;

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "View Stages/Match",
    label = "Match",
    category = "transform",
    color = "#10B981",
    description = "Filter samples by a view expression"
)]
pub struct Match {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(required)]
    pub expression: String,
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "View Stages/Match Tags",
    label = "Match Tags",
    category = "transform",
    color = "#10B981",
    description = "Filter samples that have specific tags"
)]
pub struct MatchTags {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(required, dynamic)]
    pub tags: Vec<String>,

    #[param(label = "Require All Tags")]
    pub match_all: bool,

    #[param(label = "Include Matching")]
    pub include: bool,
}

impl Default for MatchTags {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            tags: Vec::new(),
            match_all: false,
            include: true,
        }
    }
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "View Stages/Filter Labels",
    label = "Filter Labels",
    category = "transform",
    color = "#10B981",
    description = "Filter the labels inside a label field"
)]
pub struct FilterLabels {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Label Field", kind = "enumeration", required, dynamic)]
    pub field: Option<String>,

    #[param(required)]
    pub expression: String,

    #[param]
    pub only_matches: bool,
}

impl Default for FilterLabels {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            field: None,
            expression: String::new(),
            only_matches: true,
        }
    }
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "View Stages/Sort By",
    label = "Sort By",
    category = "transform",
    color = "#10B981",
    description = "Sort samples by a field"
)]
pub struct SortBy {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(kind = "enumeration", required, dynamic)]
    pub field: Option<String>,

    #[param(label = "Descending")]
    pub reverse: bool,
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "View Stages/Limit",
    label = "Limit",
    category = "transform",
    color = "#10B981",
    description = "Keep the first N samples"
)]
pub struct Limit {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(required, min = 1.0, max = 1000000.0)]
    pub count: u64,
}

impl Default for Limit {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            count: 10,
        }
    }
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "View Stages/Exists",
    label = "Exists",
    category = "transform",
    color = "#10B981",
    description = "Keep samples where a field is (or is not) populated"
)]
pub struct Exists {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(kind = "enumeration", required, dynamic)]
    pub field: Option<String>,

    #[param(label = "Has Value")]
    pub include: bool,
}

impl Default for Exists {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            field: None,
            include: true,
        }
    }
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "View Stages/Take",
    label = "Take",
    category = "transform",
    color = "#10B981",
    description = "Randomly sample N samples"
)]
pub struct Take {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(required, min = 1.0, max = 1000000.0)]
    pub count: u64,

    #[param]
    pub seed: Option<i64>,
}

impl Default for Take {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            count: 10,
            seed: None,
        }
    }
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "View Stages/Select Fields",
    label = "Select Fields",
    category = "transform",
    color = "#10B981",
    description = "Keep only the listed fields on each sample"
)]
pub struct SelectFields {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(required, dynamic)]
    pub fields: Vec<String>,
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "View Stages/To Patches",
    label = "To Patches",
    category = "transform",
    color = "#10B981",
    description = "Turn every object in a label field into its own sample"
)]
pub struct ToPatches {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Patches Field", kind = "enumeration", required, dynamic)]
    pub field: Option<String>,
}
