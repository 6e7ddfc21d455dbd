//! Council value objects - immutable result types for each stage.
//!
//! These types represent the outputs of a council run:
//! - [`StageOneResponse`] - one panel model's answer from the collection stage
//! - [`RankingVerdict`] - one judge's ordering of the anonymized answers
//! - [`SynthesisResult`] - the chairman's final combined answer
//! - [`CouncilTurn`] - the aggregate handed to persistence

use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Response from a single panel model in the collection stage.
///
/// Exactly one is created per requested model, whether the underlying call
/// succeeded or not, and it is never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOneResponse {
    /// The model that produced this response
    pub model: Model,
    /// The answer content (empty on failure)
    pub content: String,
    /// Provider-reported reasoning trace, when available
    #[serde(default)]
    pub reasoning: String,
    /// Whether the underlying call succeeded
    pub succeeded: bool,
    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl StageOneResponse {
    pub fn success(model: Model, content: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            model,
            content: content.into(),
            reasoning: reasoning.into(),
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(model: Model, error: impl Into<String>) -> Self {
        Self {
            model,
            content: String::new(),
            reasoning: String::new(),
            succeeded: false,
            error: Some(error.into()),
        }
    }

    /// True when this answer can be fed into ranking and synthesis
    pub fn is_usable(&self) -> bool {
        self.succeeded && !self.content.trim().is_empty()
    }
}

/// One judge's submitted ordering of labels plus rationale.
///
/// One is created per panel member invited to judge; a judge whose ranking
/// call failed gets `succeeded: false` and an empty ordering, and is
/// silently excluded from aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingVerdict {
    /// The model that acted as judge
    pub judge: Model,
    /// Labels ordered best to worst
    pub ranking: Vec<String>,
    /// The judge's free-form critique
    pub critique: String,
    /// Whether the ranking call succeeded
    pub succeeded: bool,
}

impl RankingVerdict {
    pub fn success(judge: Model, ranking: Vec<String>, critique: impl Into<String>) -> Self {
        Self {
            judge,
            ranking,
            critique: critique.into(),
            succeeded: true,
        }
    }

    pub fn failure(judge: Model) -> Self {
        Self {
            judge,
            ranking: Vec::new(),
            critique: String::new(),
            succeeded: false,
        }
    }
}

/// Final synthesis from the chairman model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// The chairman model
    pub model: Model,
    /// The synthesized answer
    pub content: String,
    /// Whether the chairman call succeeded
    pub succeeded: bool,
}

impl SynthesisResult {
    /// Sentinel content persisted when a run is cancelled before synthesis.
    pub const INTERRUPTED: &'static str = "Processing was interrupted.";

    pub fn new(model: Model, content: impl Into<String>) -> Self {
        Self {
            model,
            content: content.into(),
            succeeded: true,
        }
    }

    pub fn failure(model: Model, reason: impl Into<String>) -> Self {
        Self {
            model,
            content: reason.into(),
            succeeded: false,
        }
    }

    /// Sentinel result substituted when synthesis never completed.
    pub fn interrupted(model: Model) -> Self {
        Self::failure(model, Self::INTERRUPTED)
    }

    pub fn is_interrupted(&self) -> bool {
        !self.succeeded && self.content == Self::INTERRUPTED
    }
}

/// The aggregate of one user message plus the three stage results.
///
/// Created fresh per user message and handed to persistence exactly once;
/// a cancelled streaming run persists a partial turn with an
/// [`interrupted`](SynthesisResult::interrupted) synthesis and no verdicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilTurn {
    /// The user's (unenriched) question
    pub question: String,
    /// Stage 1: one entry per requested panel model
    pub stage1: Vec<StageOneResponse>,
    /// Stage 2: one entry per judge whose call resolved
    pub verdicts: Vec<RankingVerdict>,
    /// Stage 3: the chairman's synthesis
    pub synthesis: SynthesisResult,
}

impl CouncilTurn {
    pub fn new(
        question: impl Into<String>,
        stage1: Vec<StageOneResponse>,
        verdicts: Vec<RankingVerdict>,
        synthesis: SynthesisResult,
    ) -> Self {
        Self {
            question: question.into(),
            stage1,
            verdicts,
            synthesis,
        }
    }

    /// A partial turn for a run cancelled after collection: stage-2
    /// partials are intermediate and never persisted on their own.
    pub fn interrupted(
        question: impl Into<String>,
        stage1: Vec<StageOneResponse>,
        chairman: Model,
    ) -> Self {
        Self::new(
            question,
            stage1,
            Vec::new(),
            SynthesisResult::interrupted(chairman),
        )
    }

    /// Returns an iterator over only the usable stage-1 answers.
    pub fn usable_responses(&self) -> impl Iterator<Item = &StageOneResponse> {
        self.stage1.iter().filter(|r| r.is_usable())
    }
}
