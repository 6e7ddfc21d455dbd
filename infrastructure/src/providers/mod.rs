//! Provider adapters and routing.
//!
//! Each adapter speaks one provider's HTTP dialect and maps it onto the
//! uniform [`Completion`]/[`GatewayError`] surface; [`RoutingGateway`]
//! picks the adapter from the model identifier's prefix.

pub mod gigachat;
pub mod openrouter;
pub mod routing;
pub mod yandex;

pub use gigachat::GigaChatAdapter;
pub use openrouter::OpenRouterAdapter;
pub use routing::RoutingGateway;
pub use yandex::YandexAdapter;

use async_trait::async_trait;
use council_application::{Completion, GatewayError};
use council_domain::{Message, Model};

/// Known provider families, keyed by model id prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// Default provider; also serves models with unknown or no prefix
    #[default]
    OpenRouter,
    GigaChat,
    Yandex,
}

impl ProviderKind {
    /// Resolve a model id prefix (the part before the first `/`)
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "openrouter" => Some(ProviderKind::OpenRouter),
            "gigachat" => Some(ProviderKind::GigaChat),
            "yandex" => Some(ProviderKind::Yandex),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::GigaChat => "gigachat",
            ProviderKind::Yandex => "yandex",
        }
    }
}

/// One provider's chat-completion client
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Issue one chat request. Failures are returned, never panicked; a
    /// failed call degrades one panel seat only.
    async fn complete(
        &self,
        model: &Model,
        messages: &[Message],
    ) -> Result<Completion, GatewayError>;
}
