//! GigaChat chat-completion adapter.
//!
//! Speaks the GigaChat REST dialect with a pre-issued access token. Some
//! GigaChat plans reject concurrent requests, so the adapter can serialize
//! its calls behind a lock.

use super::{ProviderAdapter, ProviderKind};
use async_trait::async_trait;
use council_application::{Completion, GatewayError};
use council_domain::{Message, Model};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::debug;

const GIGACHAT_API_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
const DEFAULT_TEMPERATURE: f64 = 0.8;
const MAX_TOKENS: u32 = 4096;

pub struct GigaChatAdapter {
    client: reqwest::Client,
    access_token: String,
    api_url: String,
    /// Present when requests must be issued one at a time
    serialize_lock: Option<Mutex<()>>,
}

impl GigaChatAdapter {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.into(),
            api_url: GIGACHAT_API_URL.to_string(),
            serialize_lock: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Serialize requests instead of letting them race
    pub fn with_serialized_requests(mut self, serialize: bool) -> Self {
        self.serialize_lock = serialize.then(|| Mutex::new(()));
        self
    }

    async fn execute(
        &self,
        model: &Model,
        messages: &[Message],
    ) -> Result<Completion, GatewayError> {
        let payload = json!({
            "model": model.short_name(),
            "messages": messages,
            "temperature": DEFAULT_TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        debug!(model = %model, "Sending GigaChat request");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::HttpStatus {
                provider: "gigachat".to_string(),
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

#[async_trait]
impl ProviderAdapter for GigaChatAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GigaChat
    }

    async fn complete(
        &self,
        model: &Model,
        messages: &[Message],
    ) -> Result<Completion, GatewayError> {
        if self.access_token.is_empty() {
            return Err(GatewayError::MissingCredentials("gigachat".to_string()));
        }

        match &self.serialize_lock {
            Some(lock) => {
                let _guard = lock.lock().await;
                self.execute(model, messages).await
            }
            None => self.execute(model, messages).await,
        }
    }
}

fn parse_completion(body: &Value) -> Result<Completion, GatewayError> {
    let content = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::MalformedResponse("no choices in response".to_string()))?;

    // GigaChat does not expose reasoning traces
    Ok(Completion::new(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "ответ" } }]
        });
        assert_eq!(parse_completion(&body).unwrap().content, "ответ");
    }

    #[test]
    fn test_parse_missing_choices() {
        let body = json!({ "status": 429 });
        assert!(matches!(
            parse_completion(&body),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_token_is_missing_credentials() {
        let adapter = GigaChatAdapter::new("");
        let result = adapter
            .complete(&Model::new("gigachat/GigaChat-2-Max"), &[Message::user("hi")])
            .await;
        assert!(matches!(result, Err(GatewayError::MissingCredentials(_))));
    }
}
