//! AnthropicProvider -- concrete [`LlmProvider`] implementation for Anthropic Claude.
//!
//! Sends requests to the Anthropic Messages API (`/v1/messages`) with the
//! `x-api-key` and `anthropic-version` headers. A reasoning budget maps to
//! extended thinking (`thinking.budget_tokens`).
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use skillforge_core::llm::provider::LlmProvider;
use skillforge_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderKind, StopReason, Usage,
};

use super::types::{
    AnthropicContentBlock, AnthropicErrorBody, AnthropicMessage, AnthropicRequest,
    AnthropicResponse, ThinkingConfig,
};
use crate::llm::{http_client, rate_limited, retry_after_header};

/// Anthropic Claude LLM provider.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing HTTP request headers.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    pub fn new(api_key: SecretString) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(Duration::from_secs(300))?,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into an [`AnthropicRequest`].
    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| AnthropicMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        let thinking = request.reasoning_budget.map(ThinkingConfig::enabled);
        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            messages,
            temperature: if thinking.is_some() {
                None
            } else {
                request.temperature
            },
            thinking,
        }
    }
}

/// Map a non-success HTTP status and body onto an [`LlmError`].
fn map_error_status(status: u16, retry_after: Option<Duration>, body: String) -> LlmError {
    let detail = serde_json::from_str::<AnthropicErrorBody>(&body).ok();
    let message = detail
        .as_ref()
        .map(|d| d.error.message.clone())
        .unwrap_or_else(|| body.clone());

    match status {
        401 => LlmError::AuthenticationFailed,
        429 => rate_limited(body, retry_after),
        400 if is_output_budget_too_small(&message) => LlmError::BudgetRejected(message),
        400 => LlmError::InvalidRequest(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// The rejection raised when `max_tokens` does not exceed the thinking budget.
///
/// Other `budget_tokens` complaints (such as the 1024 minimum) are not
/// fixed by a larger `max_tokens`.
fn is_output_budget_too_small(message: &str) -> bool {
    message.contains("max_tokens")
        && message.contains("budget_tokens")
        && message.contains("greater than")
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_anthropic_request(request);
        let url = self.url("/v1/messages");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_header(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status.as_u16(), retry_after, error_body));
        }

        let anthropic_resp: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        Ok(into_completion(anthropic_resp))
    }
}

fn into_completion(resp: AnthropicResponse) -> CompletionResponse {
    // Thinking blocks are internal deliberation; only text reaches the caller.
    let content = resp
        .content
        .iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");

    let stop_reason = match resp.stop_reason.as_deref() {
        Some("end_turn") | None => StopReason::EndTurn,
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        Some(_) => StopReason::Other,
    };

    CompletionResponse {
        id: resp.id,
        content,
        model: resp.model,
        stop_reason,
        usage: Usage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
        },
    }
}
