//! Brain analyses annotate the incoming view and pass it through.

use serde::{Deserialize, Serialize};
use viewgraph_macros::NodeType;

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Brain/Compute Embeddings",
    label = "Compute Embeddings",
    category = "analysis",
    color = "#8B5CF6",
    description = "Compute embeddings with a zoo model"
)]
pub struct ComputeEmbeddings {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(kind = "enumeration", required, dynamic)]
    pub model: String,

    #[param]
    pub embeddings_field: String,
}

impl Default for ComputeEmbeddings {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            model: "clip-vit-base32-torch".to_string(),
            embeddings_field: "embeddings".to_string(),
        }
    }
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Brain/Compute Visualization",
    label = "Compute Visualization",
    category = "analysis",
    color = "#8B5CF6",
    description = "Project embeddings to 2D or 3D for the embeddings panel"
)]
pub struct ComputeVisualization {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param]
    pub brain_key: String,

    #[param(kind = "enumeration", values = "umap, tsne, pca")]
    pub method: String,

    #[param(label = "Dimensions", min = 2.0, max = 3.0)]
    pub num_dims: u32,

    #[param]
    pub embeddings: String,
}

impl Default for ComputeVisualization {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            brain_key: "visualization".to_string(),
            method: "umap".to_string(),
            num_dims: 2,
            embeddings: String::new(),
        }
    }
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Brain/Compute Similarity",
    label = "Compute Similarity",
    category = "analysis",
    color = "#8B5CF6",
    description = "Build a similarity index for nearest-neighbor queries"
)]
pub struct ComputeSimilarity {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param]
    pub brain_key: String,

    #[param]
    pub embeddings: String,

    #[param(kind = "enumeration", values = "sklearn, qdrant, lancedb")]
    pub backend: String,
}

impl Default for ComputeSimilarity {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            brain_key: "similarity".to_string(),
            embeddings: String::new(),
            backend: "sklearn".to_string(),
        }
    }
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Brain/Compute Uniqueness",
    label = "Compute Uniqueness",
    category = "analysis",
    color = "#8B5CF6",
    description = "Score how unique each sample is"
)]
pub struct ComputeUniqueness {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param]
    pub uniqueness_field: String,

    #[param]
    pub embeddings: String,
}

impl Default for ComputeUniqueness {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            uniqueness_field: "uniqueness".to_string(),
            embeddings: String::new(),
        }
    }
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Brain/Compute Mistakenness",
    label = "Compute Mistakenness",
    category = "analysis",
    color = "#8B5CF6",
    description = "Estimate the likelihood of annotation mistakes"
)]
pub struct ComputeMistakenness {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Predictions Field", kind = "enumeration", required, dynamic)]
    pub pred_field: Option<String>,

    #[param(label = "Ground Truth Field", kind = "enumeration", required, dynamic)]
    pub label_field: Option<String>,
}

#[derive(NodeType, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Brain/Find Near Duplicates",
    label = "Find Near Duplicates",
    category = "analysis",
    color = "#8B5CF6",
    description = "Find near-duplicate samples using embeddings"
)]
pub struct FindNearDuplicates {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(min = 0.0, max = 1.0)]
    pub threshold: Option<f64>,

    #[param]
    pub embeddings: String,
}

#[derive(NodeType, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[node_type(
    id = "Brain/Manage Brain Run",
    label = "Manage Brain Run",
    category = "analysis",
    color = "#8B5CF6",
    description = "Rename or delete a brain run on the dataset"
)]
pub struct ManageBrainRun {
    #[input(name = "view", port_type = "view")]
    #[serde(skip)]
    _input: (),

    #[output(name = "view", port_type = "view")]
    #[serde(skip)]
    _output: (),

    #[param(label = "Brain Run", kind = "enumeration", required, dynamic)]
    pub brain_key: Option<String>,

    #[param(kind = "enumeration", values = "delete, rename")]
    pub action: String,

    #[param]
    pub new_name: String,
}

impl Default for ManageBrainRun {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            brain_key: None,
            action: "delete".to_string(),
            new_name: String::new(),
        }
    }
}
