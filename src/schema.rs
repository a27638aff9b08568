use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only description of the dataset currently loaded in the host.
///
/// Replaced wholesale whenever the active dataset changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSchemaSnapshot {
    pub dataset_name: String,
    pub fields: Vec<String>,
    pub label_fields: Vec<String>,
    pub detection_fields: Vec<String>,
    pub classification_fields: Vec<String>,
    pub segmentation_fields: Vec<String>,
    pub regression_fields: Vec<String>,
    pub patches_fields: Vec<String>,
    pub saved_view_names: Vec<String>,
    pub tag_values: Vec<String>,
    /// Distinct classes per label field, passed through for host consumers
    pub label_classes: BTreeMap<String, Vec<String>>,
    pub prior_analysis_run_keys: Vec<String>,
    pub prior_evaluation_keys: Vec<String>,
    pub available_model_identifiers: Vec<String>,
}

/// Named collection inside a [`DatasetSchemaSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaCollection {
    Fields,
    LabelFields,
    DetectionFields,
    ClassificationFields,
    SegmentationFields,
    RegressionFields,
    PatchesFields,
    SavedViews,
    Tags,
    AnalysisRuns,
    EvaluationKeys,
    Models,
}

impl SchemaCollection {
    /// Placeholder shown when the collection is empty
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Fields => "(no fields)",
            Self::LabelFields => "(no label fields)",
            Self::DetectionFields => "(no detection fields)",
            Self::ClassificationFields => "(no classification fields)",
            Self::SegmentationFields => "(no segmentation fields)",
            Self::RegressionFields => "(no regression fields)",
            Self::PatchesFields => "(no patches fields)",
            Self::SavedViews => "(no saved views)",
            Self::Tags => "(no tags)",
            Self::AnalysisRuns => "(no brain runs)",
            Self::EvaluationKeys => "(no evaluations)",
            Self::Models => "(no models)",
        }
    }
}

impl DatasetSchemaSnapshot {
    /// Schema used when the host could not provide one
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn collection(&self, collection: SchemaCollection) -> &[String] {
        match collection {
            SchemaCollection::Fields => &self.fields,
            SchemaCollection::LabelFields => &self.label_fields,
            SchemaCollection::DetectionFields => &self.detection_fields,
            SchemaCollection::ClassificationFields => &self.classification_fields,
            SchemaCollection::SegmentationFields => &self.segmentation_fields,
            SchemaCollection::RegressionFields => &self.regression_fields,
            SchemaCollection::PatchesFields => &self.patches_fields,
            SchemaCollection::SavedViews => &self.saved_view_names,
            SchemaCollection::Tags => &self.tag_values,
            SchemaCollection::AnalysisRuns => &self.prior_analysis_run_keys,
            SchemaCollection::EvaluationKeys => &self.prior_evaluation_keys,
            SchemaCollection::Models => &self.available_model_identifiers,
        }
    }
}
