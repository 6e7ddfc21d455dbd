//! OpenRouter chat-completion adapter.
//!
//! OpenRouter fronts most of the panel; requests ask for high reasoning
//! effort and the response parser tolerates the several field names the
//! service uses to return reasoning traces.

use super::{ProviderAdapter, ProviderKind};
use async_trait::async_trait;
use council_application::{Completion, GatewayError};
use council_domain::{Message, Model};
use serde_json::{Value, json};
use tracing::debug;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_TEMPERATURE: f64 = 0.8;

pub struct OpenRouterAdapter {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    temperature: f64,
}

impl OpenRouterAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_url: OPENROUTER_API_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Override the endpoint, for tests and self-hosted gateways
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    async fn complete(
        &self,
        model: &Model,
        messages: &[Message],
    ) -> Result<Completion, GatewayError> {
        if self.api_key.is_empty() {
            return Err(GatewayError::MissingCredentials("openrouter".to_string()));
        }

        let payload = json!({
            "model": model.as_str(),
            "temperature": self.temperature,
            "messages": messages,
            "reasoning": { "effort": "high" },
            "include_reasoning": true,
        });

        debug!(model = %model, "Sending OpenRouter request");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::HttpStatus {
                provider: "openrouter".to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        parse_completion(&body)
    }
}

/// Extract content and reasoning from an OpenRouter response body.
///
/// Reasoning arrives under `reasoning`, `reasoning_content`, or
/// `reasoning_details` depending on the upstream model.
fn parse_completion(body: &Value) -> Result<Completion, GatewayError> {
    let message = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| GatewayError::MalformedResponse("no choices in response".to_string()))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let reasoning = ["reasoning", "reasoning_content", "reasoning_details"]
        .iter()
        .find_map(|key| message.get(key).and_then(Value::as_str))
        .unwrap_or("")
        .to_string();

    Ok(Completion { content, reasoning })
}
