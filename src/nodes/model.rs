use serde::{Deserialize, Serialize};
use viewgraph_macros::NodeType;

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Model/Apply Zoo Model",
    label = "Apply Zoo Model",
    category = "model",
    color = "#EF4444",
    description = "Run a zoo model and store its predictions in a label field"
)]
pub struct ApplyZooModel {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(kind = "enumeration", required, dynamic)]
    pub model: Option<String>,

    #[param]
    pub label_field: String,

    #[param(label = "Confidence Threshold", min = 0.0, max = 1.0)]
    pub confidence_thresh: Option<f64>,

    #[param]
    pub store_logits: bool,
}

impl Default for ApplyZooModel {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            model: None,
            label_field: "predictions".to_string(),
            confidence_thresh: None,
            store_logits: false,
        }
    }
}
