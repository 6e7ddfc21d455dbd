//! Streaming progress events emitted during a council run.

use super::labels::LabelMap;
use super::ranking::RankedModel;
use super::value_objects::{RankingVerdict, StageOneResponse, SynthesisResult};
use crate::core::model::Model;
use serde::Serialize;
use std::collections::BTreeMap;

/// One event on the streaming progress channel.
///
/// Events are serialized with a `type` tag so consumers can dispatch without
/// knowing the full schema. Ordering is guaranteed: every `*_start` precedes
/// its `*_complete`, stage boundaries never interleave, and a terminal
/// `complete` or `error` closes the stream. `heartbeat` may appear anywhere
/// between the first and last event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouncilEvent {
    /// Collection began for the listed panel
    Stage1Start { models: Vec<Model> },
    /// One panel model's answer call resolved
    Stage1ModelComplete { model: Model },
    /// All collection calls resolved; carries every per-model result
    Stage1Complete { results: Vec<StageOneResponse> },
    /// Ranking began for the listed judges
    Stage2Start { models: Vec<Model> },
    /// One judge's ranking call resolved
    Stage2ModelComplete { model: Model },
    /// Ranking finished; the label mapping is revealed here and only here
    Stage2Complete {
        verdicts: Vec<RankingVerdict>,
        label_to_model: BTreeMap<String, Model>,
        aggregate_ranking: Vec<RankedModel>,
    },
    /// Synthesis began
    Stage3Start,
    /// The chairman's answer is ready
    Stage3Complete { result: SynthesisResult },
    /// A concurrent title generation finished
    TitleComplete { title: String },
    /// The run finished and its results were persisted
    Complete,
    /// The run aborted; no further events follow
    Error { message: String },
    /// Keepalive emitted during quiet periods
    Heartbeat,
}

impl CouncilEvent {
    /// Build the stage-2 completion event from the aggregation inputs.
    pub fn stage2_complete(
        verdicts: Vec<RankingVerdict>,
        labels: &LabelMap,
        aggregate_ranking: Vec<RankedModel>,
    ) -> Self {
        Self::Stage2Complete {
            verdicts,
            label_to_model: labels.to_map(),
            aggregate_ranking,
        }
    }

    /// True for the events that close the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error { .. })
    }
}
