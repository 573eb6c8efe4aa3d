use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::ApiKey;
use crate::engine::CompletionEngine;
use crate::error::ClassifyError;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse};

/// Client for an OpenAI-compatible chat completion endpoint.
pub struct OpenAiEngine {
    http: Client,
    endpoint: String,
    api_key: ApiKey,
}

impl OpenAiEngine {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: ApiKey,
        timeout: Duration,
    ) -> Result<Self, ClassifyError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionEngine for OpenAiEngine {
    #[tracing::instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete(&self, request: ChatCompletionRequest) -> Result<String, ClassifyError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ClassifyError::MalformedResponse("no message content in first choice".to_string())
            })
    }
}
