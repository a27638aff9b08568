use serde::{Deserialize, Serialize};
use viewgraph_macros::NodeType;

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Output/Set App View",
    label = "Set App View",
    category = "output",
    color = "#64748B",
    description = "Show the incoming view in the app grid"
)]
pub struct SetAppView {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Output/Save View",
    label = "Save View",
    category = "output",
    color = "#64748B",
    description = "Save the incoming view under a name"
)]
pub struct SaveView {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[param(label = "View Name", required)]
    pub name: String,

    #[param]
    pub description: String,

    #[param]
    pub overwrite: bool,
}

impl Default for SaveView {
    fn default() -> Self {
        Self {
            _input: (),
            name: "my_view".to_string(),
            description: String::new(),
            overwrite: false,
        }
    }
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Output/Tag Samples",
    label = "Tag Samples",
    category = "output",
    color = "#64748B",
    description = "Add tags to every sample in the incoming view"
)]
pub struct TagSamples {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[param(required, dynamic)]
    pub tags: Vec<String>,
}
