/// Perplexity-compatible chat completions provider
///
/// POSTs to {base_url}/chat/completions with a bearer credential and reads the
/// generated message plus the optional top-level `citations` array.
/// The base_url is configurable so tests and compatible gateways can be used.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{AiError, AiProvider, ChatMessage, Completion, CompletionRequest};
use crate::config::AiConfig;

// --- HTTP request/response structs ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "is_false")]
    return_citations: bool,
    #[serde(skip_serializing_if = "is_empty_slice")]
    search_domain_filter: &'a [String],
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_empty_slice(value: &&[String]) -> bool {
    value.is_empty()
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

// --- Provider ---

/// Chat completions client with a hard per-call timeout.
pub struct PerplexityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl PerplexityProvider {
    /// Create a new PerplexityProvider.
    ///
    /// # Errors
    /// Returns `AiError::NotConfigured` if api_key is empty.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        if api_key.trim().is_empty() {
            return Err(AiError::NotConfigured(
                "AI API key is required. Set BIOSEEKER_AI__API_KEY or PERPLEXITY_API_KEY"
                    .to_string(),
            ));
        }

        Ok(PerplexityProvider {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            timeout,
        })
    }

    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = config.api_key.clone().unwrap_or_default();
        Self::new(config.base_url.clone(), api_key, config.model.clone(), config.timeout())
    }

    async fn send(&self, request: &CompletionRequest) -> Result<Completion, AiError> {
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            return_citations: request.return_citations,
            search_domain_filter: &request.domain_filter,
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Request(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AiError::Api { status, message: body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::Malformed(format!("Failed to parse chat response: {}", e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::Malformed("empty choices list".to_string()))?;

        Ok(Completion {
            content,
            citations: chat_response.citations,
        })
    }
}

#[async_trait]
impl AiProvider for PerplexityProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, AiError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(AiError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, self.send(&request)) => {
                outcome.map_err(|_| AiError::Timeout(self.timeout))?
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
