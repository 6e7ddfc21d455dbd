//! Infrastructure layer for llm-council
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: provider HTTP clients, the model router,
//! configuration file loading, JSON conversation storage, and link
//! enrichment.

pub mod config;
pub mod enrich;
pub mod providers;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use enrich::LinkPreviewEnricher;
pub use providers::{
    GigaChatAdapter, OpenRouterAdapter, ProviderAdapter, ProviderKind, RoutingGateway,
    YandexAdapter,
};
pub use store::JsonConversationStore;
