//! Council stage identifiers

use serde::{Deserialize, Serialize};

/// Stage of a council run
///
/// Stages are strictly ordered: ranking never begins until collection has
/// fully resolved (including failures), and synthesis runs last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Stage 1 - every panel model answers the question
    Collect,
    /// Stage 2 - panel models rank the anonymized answers
    Rank,
    /// Stage 3 - the chairman synthesizes the final answer
    Synthesize,
}

impl Stage {
    /// Short wire name used as the event prefix ("stage1", "stage2", "stage3")
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Collect => "stage1",
            Stage::Rank => "stage2",
            Stage::Synthesize => "stage3",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Collect => "Stage 1: Collect Responses",
            Stage::Rank => "Stage 2: Rank Answers",
            Stage::Synthesize => "Stage 3: Synthesize",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
