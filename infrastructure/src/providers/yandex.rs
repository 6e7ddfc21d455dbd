//! YandexGPT foundation-models adapter.
//!
//! Yandex addresses models through a `modelUri` built from the cloud folder
//! id, and its message objects carry `text` instead of `content`.

use super::{ProviderAdapter, ProviderKind};
use async_trait::async_trait;
use council_application::{Completion, GatewayError};
use council_domain::{Message, Model};
use serde_json::{Value, json};
use tracing::debug;

const YANDEX_API_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";
const DEFAULT_TEMPERATURE: f64 = 0.8;
const MAX_TOKENS: u32 = 4096;

pub struct YandexAdapter {
    client: reqwest::Client,
    api_key: String,
    folder_id: String,
    api_url: String,
}

impl YandexAdapter {
    pub fn new(api_key: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            folder_id: folder_id.into(),
            api_url: YANDEX_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn model_uri(&self, model: &Model) -> String {
        // The provider prefix is routing metadata, not part of the name
        format!("gpt://{}/{}/latest", self.folder_id, model.short_name())
    }
}

#[async_trait]
impl ProviderAdapter for YandexAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Yandex
    }

    async fn complete(
        &self,
        model: &Model,
        messages: &[Message],
    ) -> Result<Completion, GatewayError> {
        if self.api_key.is_empty() || self.folder_id.is_empty() {
            return Err(GatewayError::MissingCredentials("yandex".to_string()));
        }

        let yandex_messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "text": m.content }))
            .collect();

        let payload = json!({
            "modelUri": self.model_uri(model),
            "completionOptions": {
                "stream": false,
                "temperature": DEFAULT_TEMPERATURE,
                "maxTokens": MAX_TOKENS,
            },
            "messages": yandex_messages,
        });

        debug!(model = %model, "Sending Yandex request");
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::HttpStatus {
                provider: "yandex".to_string(),
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

/// Response structure: `result.alternatives[0].message.text`
fn parse_completion(body: &Value) -> Result<Completion, GatewayError> {
    let content = body
        .get("result")
        .and_then(|result| result.get("alternatives"))
        .and_then(|alternatives| alternatives.get(0))
        .and_then(|alternative| alternative.get("message"))
        .and_then(|message| message.get("text"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            GatewayError::MalformedResponse("no alternatives in response".to_string())
        })?;

    Ok(Completion::new(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_uri_strips_prefix() {
        let adapter = YandexAdapter::new("key", "folder-1");
        assert_eq!(
            adapter.model_uri(&Model::new("yandex/aliceai-llm")),
            "gpt://folder-1/aliceai-llm/latest"
        );
    }

    #[test]
    fn test_parse_completion() {
        let body = json!({
            "result": {
                "alternatives": [
                    { "message": { "role": "assistant", "text": "Привет" } }
                ]
            }
        });
        assert_eq!(parse_completion(&body).unwrap().content, "Привет");
    }

    #[test]
    fn test_parse_empty_alternatives() {
        let body = json!({ "result": { "alternatives": [] } });
        assert!(matches!(
            parse_completion(&body),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_folder_id_is_missing_credentials() {
        let adapter = YandexAdapter::new("key", "");
        let result = adapter
            .complete(&Model::new("yandex/aliceai-llm"), &[Message::user("hi")])
            .await;
        assert!(matches!(result, Err(GatewayError::MissingCredentials(_))));
    }
}
