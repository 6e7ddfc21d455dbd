//! Port definitions (interfaces to the outside world)
//!
//! Adapters implementing these ports live in the infrastructure and
//! presentation layers.

pub mod enricher;
pub mod llm_gateway;
pub mod progress;
pub mod settings;
pub mod store;
