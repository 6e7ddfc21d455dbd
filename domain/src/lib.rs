//! Domain layer for llm-council
//!
//! This crate contains the core council logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council request runs in three ordered stages:
//!
//! - **Collect**: every panel model answers the question independently
//! - **Rank**: each panel model ranks the anonymized answers of the others
//! - **Synthesize**: a designated chairman model produces the final answer
//!
//! Anonymization (the label/model mapping) and Borda-count aggregation are
//! pure functions living entirely in this crate.

pub mod core;
pub mod council;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use core::{model::Model, question::Question};
pub use council::{
    event::CouncilEvent,
    labels::LabelMap,
    ranking::{RankedModel, aggregate_rankings, parse_ranked_labels},
    stage::Stage,
    value_objects::{CouncilTurn, RankingVerdict, StageOneResponse, SynthesisResult},
};
pub use prompt::PromptTemplate;
pub use session::message::{Message, Role};
