//! Council orchestration domain: stages, result types, anonymization,
//! and ranking aggregation.

pub mod event;
pub mod labels;
pub mod ranking;
pub mod stage;
pub mod value_objects;
