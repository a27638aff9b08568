use serde::{Deserialize, Serialize};
use viewgraph_macros::NodeType;

/// The dataset currently loaded in the host application
#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Source/Current Dataset",
    label = "Current Dataset",
    category = "source",
    color = "#2563EB",
    description = "Use the dataset currently loaded in the app"
)]
pub struct CurrentDataset {
    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Source/Load Saved View",
    label = "Load Saved View",
    category = "source",
    color = "#2563EB",
    description = "Load a named saved view of the current dataset"
)]
pub struct LoadSavedView {
    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Saved View", kind = "enumeration", required, dynamic)]
    pub view_name: Option<String>,
}
