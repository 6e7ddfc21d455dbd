//! Text enrichment port
//!
//! Expands URLs in a question with fetched page content before the panel
//! sees it.

use async_trait::async_trait;
use serde::Serialize;

/// Outcome of one link fetch attempted during enrichment
#[derive(Debug, Clone, Serialize)]
pub struct LinkMeta {
    pub url: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Best-effort question enrichment.
///
/// On total failure the raw text comes back unchanged with an empty link
/// list; enrichment never fails a run.
#[async_trait]
pub trait TextEnricher: Send + Sync {
    async fn enrich(&self, text: &str) -> (String, Vec<LinkMeta>);
}

/// Enricher that passes text through untouched
pub struct NoEnrichment;

#[async_trait]
impl TextEnricher for NoEnrichment {
    async fn enrich(&self, text: &str) -> (String, Vec<LinkMeta>) {
        (text.to_string(), Vec::new())
    }
}
