//! LLM provider implementations.
//!
//! Contains one concrete implementation of the [`LlmProvider`] trait
//! (defined in `skillforge-core`) per [`ProviderKind`], plus the provider
//! factory ([`create_provider`]) and a connection test
//! ([`test_provider_connection`]).
//!
//! [`LlmProvider`]: skillforge_core::llm::provider::LlmProvider

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use secrecy::ExposeSecret;

use skillforge_core::llm::box_provider::BoxLlmProvider;
use skillforge_core::rate_limit::parse_rate_limit;
use skillforge_types::llm::{
    CompletionRequest, LlmError, Message, ProviderConfig, ProviderKind, RateLimitInfo,
};

use self::anthropic::AnthropicProvider;
use self::gemini::GeminiProvider;
use self::openai::OpenAiProvider;

/// Create a [`BoxLlmProvider`] from a resolved [`ProviderConfig`].
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] for a blank API key and
/// [`LlmError::Provider`] if the HTTP client cannot be built.
pub fn create_provider(config: &ProviderConfig) -> Result<BoxLlmProvider, LlmError> {
    if config.api_key.expose_secret().trim().is_empty() {
        return Err(LlmError::AuthenticationFailed);
    }

    let key = config.api_key.clone();
    let base_url = config.base_url.clone();
    match config.kind {
        ProviderKind::Anthropic => {
            let mut provider = AnthropicProvider::new(key)?;
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderKind::OpenAi => Ok(BoxLlmProvider::new(OpenAiProvider::new(
            key,
            base_url.as_deref(),
        ))),
        ProviderKind::Gemini => {
            let mut provider = GeminiProvider::new(key)?;
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

/// Test provider connectivity by sending a minimal completion request.
///
/// Used after switching providers to verify the API key and model.
pub async fn test_provider_connection(
    provider: &BoxLlmProvider,
    model: &str,
) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![Message::user("Hello")],
        max_tokens: 16,
        temperature: Some(0.0),
        reasoning_budget: None,
    };
    provider.complete(&request).await?;
    Ok(())
}

/// Shared reqwest client constructor for the hand-written providers.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Provider {
            message: format!("failed to build HTTP client: {e}"),
        })
}

/// Integer-seconds `Retry-After` header, if present.
pub(crate) fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Build [`LlmError::RateLimited`] from a 429 error text.
///
/// Fields parsed from the text win; `retry_after` fills in a missing delay.
pub(crate) fn rate_limited(raw: String, retry_after: Option<Duration>) -> LlmError {
    let mut info = parse_rate_limit(&raw).unwrap_or_else(|| RateLimitInfo {
        code: Some(429),
        raw,
        ..Default::default()
    });
    if info.retry_after.is_none() {
        info.retry_after = retry_after;
    }
    LlmError::RateLimited(info)
}
