//! LLM Gateway port
//!
//! Defines the interface for communicating with LLM providers.

use async_trait::async_trait;
use council_domain::{Message, Model};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
///
/// Every variant is recoverable at the fanout level: a failed call degrades
/// one panel seat, it never aborts the batch.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Missing credentials for {0}")]
    MissingCredentials(String),

    #[error("{provider} returned HTTP {status}")]
    HttpStatus { provider: String, status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("No provider configured for model {0}")]
    NoProvider(String),
}

/// A completed chat response from a provider
#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// The answer text
    pub content: String,
    /// Provider-reported reasoning trace, empty when not exposed
    pub reasoning: String,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reasoning: String::new(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer talks to LLM providers.
/// Implementations (adapters) live in the infrastructure layer. Calls carry
/// no deadline of their own; the fanout that dispatches them enforces the
/// per-call timeout externally.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send one chat request and wait for the full response.
    ///
    /// `messages` must be non-empty; by convention the first entry is the
    /// system message.
    async fn complete(
        &self,
        model: &Model,
        messages: &[Message],
    ) -> Result<Completion, GatewayError>;
}
