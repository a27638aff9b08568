//! Declarative tables driving the widget populator.
//!
//! Adding a node type means adding rows here, never touching control flow.

use crate::catalog::NodeParams;
use crate::nodes::{
    ApplyZooModel, ComputeMistakenness, EvaluateClassifications, EvaluateDetections,
    EvaluateRegressions, EvaluateSegmentations, FilterLabels, LoadSavedView, ManageBrainRun,
    ManageEvaluation, MatchTags, ToEvaluationPatches, ToPatches,
};
use crate::schema::SchemaCollection;

/// Where a dynamic parameter draws its choices from.
///
/// `type_id: None` matches the parameter name on any node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicRule {
    pub type_id: Option<&'static str>,
    pub parameter: &'static str,
    pub collection: SchemaCollection,
}

/// Collections that must be non-empty for a node type to be offered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityRule {
    pub type_id: &'static str,
    pub requires: &'static [SchemaCollection],
}

const fn specific(type_id: &'static str, parameter: &'static str, collection: SchemaCollection) -> DynamicRule {
    DynamicRule { type_id: Some(type_id), parameter, collection }
}

const fn generic(parameter: &'static str, collection: SchemaCollection) -> DynamicRule {
    DynamicRule { type_id: None, parameter, collection }
}

use SchemaCollection::*;

pub static DYNAMIC_RULES: &[DynamicRule] = &[
    specific(<FilterLabels as NodeParams>::TYPE_ID, "field", LabelFields),
    specific(<ToPatches as NodeParams>::TYPE_ID, "field", PatchesFields),
    specific(<ComputeMistakenness as NodeParams>::TYPE_ID, "pred_field", LabelFields),
    specific(<ComputeMistakenness as NodeParams>::TYPE_ID, "label_field", LabelFields),
    specific(<ManageBrainRun as NodeParams>::TYPE_ID, "brain_key", AnalysisRuns),
    specific(<EvaluateDetections as NodeParams>::TYPE_ID, "pred_field", DetectionFields),
    specific(<EvaluateDetections as NodeParams>::TYPE_ID, "gt_field", DetectionFields),
    specific(<EvaluateClassifications as NodeParams>::TYPE_ID, "pred_field", ClassificationFields),
    specific(<EvaluateClassifications as NodeParams>::TYPE_ID, "gt_field", ClassificationFields),
    specific(<EvaluateSegmentations as NodeParams>::TYPE_ID, "pred_field", SegmentationFields),
    specific(<EvaluateSegmentations as NodeParams>::TYPE_ID, "gt_field", SegmentationFields),
    specific(<EvaluateRegressions as NodeParams>::TYPE_ID, "pred_field", RegressionFields),
    specific(<EvaluateRegressions as NodeParams>::TYPE_ID, "gt_field", RegressionFields),
    specific(<ToEvaluationPatches as NodeParams>::TYPE_ID, "eval_key", EvaluationKeys),
    specific(<ManageEvaluation as NodeParams>::TYPE_ID, "eval_key", EvaluationKeys),
    generic("field", Fields),
    generic("fields", Fields),
    generic("view_name", SavedViews),
    generic("tags", Tags),
    generic("model", Models),
];

pub static VISIBILITY_RULES: &[VisibilityRule] = &[
    VisibilityRule { type_id: <LoadSavedView as NodeParams>::TYPE_ID, requires: &[SavedViews] },
    VisibilityRule { type_id: <MatchTags as NodeParams>::TYPE_ID, requires: &[Tags] },
    VisibilityRule { type_id: <FilterLabels as NodeParams>::TYPE_ID, requires: &[LabelFields] },
    VisibilityRule { type_id: <ToPatches as NodeParams>::TYPE_ID, requires: &[PatchesFields] },
    VisibilityRule { type_id: <ComputeMistakenness as NodeParams>::TYPE_ID, requires: &[LabelFields] },
    VisibilityRule { type_id: <ManageBrainRun as NodeParams>::TYPE_ID, requires: &[AnalysisRuns] },
    VisibilityRule { type_id: <ApplyZooModel as NodeParams>::TYPE_ID, requires: &[Models] },
    VisibilityRule { type_id: <EvaluateDetections as NodeParams>::TYPE_ID, requires: &[DetectionFields] },
    VisibilityRule { type_id: <EvaluateClassifications as NodeParams>::TYPE_ID, requires: &[ClassificationFields] },
    VisibilityRule { type_id: <EvaluateSegmentations as NodeParams>::TYPE_ID, requires: &[SegmentationFields] },
    VisibilityRule { type_id: <EvaluateRegressions as NodeParams>::TYPE_ID, requires: &[RegressionFields] },
    VisibilityRule { type_id: <ToEvaluationPatches as NodeParams>::TYPE_ID, requires: &[EvaluationKeys] },
    VisibilityRule { type_id: <ManageEvaluation as NodeParams>::TYPE_ID, requires: &[EvaluationKeys] },
];
