use crate::domain::ports::{ChatModel, ChatRequest};
use crate::domain::settings::LlmSettings;
use crate::utils::error::{QuoteError, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// OpenAI-compatible chat completions client.
pub struct OpenAiChatModel {
    client: Client,
    api_base: String,
    model: String,
    api_key: Option<SecretString>,
}

impl OpenAiChatModel {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete_json(&self, request: ChatRequest) -> Result<String> {
        let start = Instant::now();

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": request.temperature,
            "response_format": { "type": "json_object" },
        });

        tracing::debug!("Chat completion request: model={} endpoint={}", self.model, self.endpoint());

        let mut http_request = self.client.post(self.endpoint()).json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key.expose_secret());
        }

        let response = http_request.send().await?;
        tracing::debug!("Chat completion response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(QuoteError::ProviderError { status, body });
        }

        let raw_response = response.json::<Value>().await?;
        let content = raw_response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| QuoteError::ResponseParseError {
                message: "no message content in chat completion response".to_string(),
            })?
            .to_string();

        tracing::debug!(
            "Chat completion finished in {}ms (finish_reason={})",
            start.elapsed().as_millis(),
            raw_response["choices"][0]["finish_reason"]
                .as_str()
                .unwrap_or("unknown")
        );

        Ok(content)
    }
}
