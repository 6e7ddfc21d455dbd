//! Question enrichment.

pub mod link_preview;

pub use link_preview::LinkPreviewEnricher;
