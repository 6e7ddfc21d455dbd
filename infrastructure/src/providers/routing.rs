//! Prefix-based routing gateway.
//!
//! Implements the application's [`LlmGateway`] port over a set of provider
//! adapters, picking the adapter from the model identifier's prefix.

use super::{ProviderAdapter, ProviderKind};
use async_trait::async_trait;
use council_application::{Completion, GatewayError, LlmGateway};
use council_domain::{Message, Model};
use std::sync::Arc;

pub struct RoutingGateway {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    default_kind: ProviderKind,
}

impl RoutingGateway {
    pub fn new(providers: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self {
            providers,
            default_kind: ProviderKind::default(),
        }
    }

    pub fn with_default(mut self, default_kind: ProviderKind) -> Self {
        self.default_kind = default_kind;
        self
    }

    /// Routing priority:
    ///  1. provider matching the model id prefix before the first `/`
    ///  2. provider matching the configured default kind
    ///  3. first registered provider
    ///  4. no providers at all is a hard error
    fn resolve_provider(&self, model: &Model) -> Result<&dyn ProviderAdapter, GatewayError> {
        let prefixed_kind = model.provider().and_then(ProviderKind::from_prefix);
        if let Some(kind) = prefixed_kind
            && let Some(provider) = self.providers.iter().find(|p| p.kind() == kind)
        {
            return Ok(provider.as_ref());
        }

        if let Some(provider) = self.providers.iter().find(|p| p.kind() == self.default_kind) {
            return Ok(provider.as_ref());
        }

        self.providers
            .first()
            .map(|p| p.as_ref())
            .ok_or_else(|| GatewayError::NoProvider(model.to_string()))
    }
}

#[async_trait]
impl LlmGateway for RoutingGateway {
    async fn complete(
        &self,
        model: &Model,
        messages: &[Message],
    ) -> Result<Completion, GatewayError> {
        if messages.is_empty() {
            return Err(GatewayError::RequestFailed(
                "empty message list".to_string(),
            ));
        }
        self.resolve_provider(model)?.complete(model, messages).await
    }
}
