//! Progress notification port
//!
//! Defines the interface for reporting progress during a council run.

use council_domain::{
    LabelMap, Model, RankedModel, RankingVerdict, Stage, StageOneResponse, SynthesisResult,
};

/// Callback for progress updates during council execution
///
/// Implementations live in the presentation layer (console reporters) or
/// wrap an event channel for streaming callers. The pipeline invokes each
/// callback from the task driving the run, never concurrently.
pub trait CouncilProgress: Send + Sync {
    /// Called when a stage starts, with the models it will query
    fn on_stage_start(&self, stage: Stage, models: &[Model]);

    /// Called when one model's call resolves within a stage
    fn on_model_complete(&self, stage: Stage, model: &Model, success: bool);

    /// Called when a stage completes
    fn on_stage_complete(&self, stage: Stage);

    // ==================== Stage Result Callbacks ====================

    /// Called with the full result set once collection resolves.
    fn on_stage1_complete(&self, _results: &[StageOneResponse]) {}

    /// Called once ranking resolves; this is the only place the label
    /// mapping leaves the pipeline.
    fn on_stage2_complete(
        &self,
        _verdicts: &[RankingVerdict],
        _labels: &LabelMap,
        _aggregate: &[RankedModel],
    ) {
    }

    /// Called when the chairman's synthesis is ready.
    fn on_stage3_complete(&self, _result: &SynthesisResult) {}

    /// Called when the concurrent title task finishes.
    fn on_title_complete(&self, _title: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl CouncilProgress for NoProgress {
    fn on_stage_start(&self, _stage: Stage, _models: &[Model]) {}
    fn on_model_complete(&self, _stage: Stage, _model: &Model, _success: bool) {}
    fn on_stage_complete(&self, _stage: Stage) {}
}
