use serde::{Deserialize, Serialize};
use viewgraph_macros::NodeType;

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Evaluation/Evaluate Detections",
    label = "Evaluate Detections",
    category = "evaluation",
    color = "#3B82F6",
    description = "Evaluate object detections against ground truth"
)]
pub struct EvaluateDetections {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Predictions Field", kind = "enumeration", required, dynamic)]
    pub pred_field: Option<String>,

    #[param(label = "Ground Truth Field", kind = "enumeration", required, dynamic)]
    pub gt_field: Option<String>,

    #[param(label = "Evaluation Key")]
    pub eval_key: String,

    #[param(kind = "enumeration", values = "coco, open-images, activitynet")]
    pub method: String,
}

impl Default for EvaluateDetections {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            pred_field: None,
            gt_field: None,
            eval_key: "eval".to_string(),
            method: "coco".to_string(),
        }
    }
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Evaluation/Evaluate Classifications",
    label = "Evaluate Classifications",
    category = "evaluation",
    color = "#3B82F6",
    description = "Evaluate classifications against ground truth"
)]
pub struct EvaluateClassifications {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Predictions Field", kind = "enumeration", required, dynamic)]
    pub pred_field: Option<String>,

    #[param(label = "Ground Truth Field", kind = "enumeration", required, dynamic)]
    pub gt_field: Option<String>,

    #[param(label = "Evaluation Key")]
    pub eval_key: String,

    #[param(kind = "enumeration", values = "simple, top-k, binary")]
    pub method: String,
}

impl Default for EvaluateClassifications {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            pred_field: None,
            gt_field: None,
            eval_key: "eval".to_string(),
            method: "simple".to_string(),
        }
    }
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Evaluation/Evaluate Segmentations",
    label = "Evaluate Segmentations",
    category = "evaluation",
    color = "#3B82F6",
    description = "Evaluate semantic segmentations against ground truth"
)]
pub struct EvaluateSegmentations {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Predictions Field", kind = "enumeration", required, dynamic)]
    pub pred_field: Option<String>,

    #[param(label = "Ground Truth Field", kind = "enumeration", required, dynamic)]
    pub gt_field: Option<String>,

    #[param(label = "Evaluation Key")]
    pub eval_key: String,
}

impl Default for EvaluateSegmentations {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            pred_field: None,
            gt_field: None,
            eval_key: "eval".to_string(),
        }
    }
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Evaluation/Evaluate Regressions",
    label = "Evaluate Regressions",
    category = "evaluation",
    color = "#3B82F6",
    description = "Evaluate regression predictions against ground truth"
)]
pub struct EvaluateRegressions {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Predictions Field", kind = "enumeration", required, dynamic)]
    pub pred_field: Option<String>,

    #[param(label = "Ground Truth Field", kind = "enumeration", required, dynamic)]
    pub gt_field: Option<String>,

    #[param(label = "Evaluation Key")]
    pub eval_key: String,
}

impl Default for EvaluateRegressions {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            pred_field: None,
            gt_field: None,
            eval_key: "eval".to_string(),
        }
    }
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Evaluation/To Evaluation Patches",
    label = "To Evaluation Patches",
    category = "evaluation",
    color = "#3B82F6",
    description = "One sample per true positive, false positive and false negative"
)]
pub struct ToEvaluationPatches {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Evaluation", kind = "enumeration", required, dynamic)]
    pub eval_key: Option<String>,
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Evaluation/Manage Evaluation",
    label = "Manage Evaluation",
    category = "evaluation",
    color = "#3B82F6",
    description = "Rename or delete an evaluation run"
)]
pub struct ManageEvaluation {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Evaluation", kind = "enumeration", required, dynamic)]
    pub eval_key: Option<String>,

    #[param(kind = "enumeration", values = "delete, rename")]
    pub action: String,

    #[param]
    pub new_name: String,
}

impl Default for ManageEvaluation {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            eval_key: None,
            action: "delete".to_string(),
            new_name: String::new(),
        }
    }
}
