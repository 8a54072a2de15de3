//! GeminiProvider -- [`LlmProvider`] for the Gemini `generateContent` endpoint.
//!
//! Errors are rendered as `"{code} {status}. {message}"` so the quota
//! signature (`429 RESOURCE_EXHAUSTED`) and the quota details embedded in
//! the message survive into [`RateLimitInfo`](skillforge_types::llm::RateLimitInfo).

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use skillforge_core::llm::provider::LlmProvider;
use skillforge_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, ProviderKind, StopReason, Usage,
};

use super::types::{
    GeminiContent, GeminiErrorBody, GeminiPart, GeminiRequest, GeminiResponse, GenerationConfig,
    ThinkingConfig,
};
use crate::llm::{http_client, rate_limited, retry_after_header};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

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

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    fn to_gemini_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        MessageRole::User => "user",
                        MessageRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                    thought: false,
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                thinking_config: request
                    .reasoning_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
        }
    }
}

/// Map a non-success HTTP status and body onto an [`LlmError`].
fn map_error_status(status: u16, retry_after: Option<Duration>, body: String) -> LlmError {
    let Ok(GeminiErrorBody { error }) = serde_json::from_str::<GeminiErrorBody>(&body) else {
        return match status {
            401 | 403 => LlmError::AuthenticationFailed,
            _ => LlmError::Provider {
                message: format!("HTTP {status}: {body}"),
            },
        };
    };

    let code = if error.code == 0 { status } else { error.code };
    let text = format!("{code} {}. {}", error.status, error.message);

    match code {
        429 => {
            let retry_after =
                retry_after.or_else(|| error.retry_delay_secs().map(Duration::from_secs));
            let mut err = rate_limited(text, retry_after);
            if let LlmError::RateLimited(info) = &mut err {
                info.message.get_or_insert(error.message);
            }
            err
        }
        401 | 403 => LlmError::AuthenticationFailed,
        400 if error.message.contains("API key not valid") => LlmError::AuthenticationFailed,
        400 if error.message.to_lowercase().contains("thinking budget") => {
            LlmError::BudgetRejected(text)
        }
        400 => LlmError::InvalidRequest(text),
        _ => LlmError::Provider { message: text },
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_gemini_request(request);

        let response = self
            .client
            .post(self.url(&request.model))
            .header("x-goog-api-key", self.api_key.expose_secret())
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

        let gemini_resp: GeminiResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        into_completion(gemini_resp, &request.model)
    }
}

fn into_completion(
    resp: GeminiResponse,
    requested_model: &str,
) -> Result<CompletionResponse, LlmError> {
    let candidate = resp.candidates.first();

    let content = candidate
        .and_then(|c| c.content.as_ref())
        .map(|c| {
            c.parts
                .iter()
                .filter(|p| !p.thought)
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let stop_reason = match candidate.and_then(|c| c.finish_reason.as_deref()) {
        Some("STOP") | None => StopReason::EndTurn,
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        Some(_) => StopReason::Other,
    };

    // Thought parts can use up the whole output allowance.
    if content.trim().is_empty() && stop_reason == StopReason::MaxTokens {
        return Err(LlmError::BudgetRejected(
            "thinking consumed the entire output token allowance".to_string(),
        ));
    }

    Ok(CompletionResponse {
        id: resp.response_id.unwrap_or_default(),
        content,
        model: resp
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        stop_reason,
        usage: Usage {
            input_tokens: resp.usage_metadata.prompt_token_count,
            output_tokens: resp.usage_metadata.candidates_token_count,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillforge_types::llm::Message;

    fn make_provider() -> GeminiProvider {
        GeminiProvider::new(SecretString::from("gemini-key")).unwrap()
    }

    #[test]
    fn test_provider_identity_and_url() {
        let provider = make_provider();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.kind(), ProviderKind::Gemini);
        assert_eq!(
            provider.url("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest {
            model: "gemini-2.5-flash".to_string(),
            messages: vec![
                Message::user("Hello"),
                Message {
                    role: MessageRole::Assistant,
                    content: "Hi".to_string(),
                },
            ],
            max_tokens: 8192,
            temperature: Some(0.7),
            reasoning_budget: Some(2048),
        };
        let json = serde_json::to_value(make_provider().to_gemini_request(&request)).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
        assert!(json["contents"][0]["parts"][0].get("thought").is_none());
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(json["generationConfig"]["temperature"], 0.7);
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            2048
        );
    }

    #[test]
    fn test_quota_error_is_parsed() {
        let body = r#"{"error": {"code": 429, "message": "You exceeded your current quota.\n* Quota exceeded for metric: generativelanguage.googleapis.com/generate_content_free_tier_requests, limit: 20, model: gemini-3-flash\nPlease retry in 23.9s.", "status": "RESOURCE_EXHAUSTED", "details": [{"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "23s"}]}}"#;
        match map_error_status(429, None, body.to_string()) {
            LlmError::RateLimited(info) => {
                assert_eq!(info.retry_after, Some(Duration::from_secs(24)));
                assert_eq!(info.limit, Some(20));
                assert_eq!(info.model.as_deref(), Some("gemini-3-flash"));
                assert!(info.raw.starts_with("429 RESOURCE_EXHAUSTED. "));
                assert!(info.message.unwrap().starts_with("You exceeded"));
            }
            other => panic!("expected rate limit, got {other}"),
        }
    }

    #[test]
    fn test_retry_info_used_when_message_has_no_delay() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED", "details": [{"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "41s"}]}}"#;
        match map_error_status(429, None, body.to_string()) {
            LlmError::RateLimited(info) => {
                assert_eq!(info.retry_after, Some(Duration::from_secs(41)));
            }
            other => panic!("expected rate limit, got {other}"),
        }
    }

    #[test]
    fn test_other_errors() {
        let bad_key = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            map_error_status(400, None, bad_key.to_string()),
            LlmError::AuthenticationFailed
        ));

        let budget = r#"{"error": {"code": 400, "message": "The thinking budget is invalid for this model.", "status": "INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            map_error_status(400, None, budget.to_string()),
            LlmError::BudgetRejected(_)
        ));

        let server = r#"{"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}}"#;
        assert!(matches!(
            map_error_status(503, None, server.to_string()),
            LlmError::Provider { ref message } if message == "503 UNAVAILABLE. The model is overloaded."
        ));

        assert!(matches!(
            map_error_status(502, None, "<html>".to_string()),
            LlmError::Provider { .. }
        ));
    }

    #[test]
    fn test_into_completion_drops_thought_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "planning...", "thought": true},
                    {"text": "READY_TO_GENERATE"}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 3},
            "modelVersion": "gemini-2.5-flash",
            "responseId": "abc"
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let completion = into_completion(resp, "gemini-2.5-flash").unwrap();
        assert_eq!(completion.content, "READY_TO_GENERATE");
        assert_eq!(completion.id, "abc");
        assert_eq!(completion.usage.input_tokens, 40);
    }

    #[test]
    fn test_into_completion_without_candidates_is_empty() {
        let resp: GeminiResponse = serde_json::from_str("{}").unwrap();
        let completion = into_completion(resp, "gemini-2.5-flash").unwrap();
        assert!(completion.content.is_empty());
        assert_eq!(completion.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_into_completion_thoughts_only_at_max_tokens_is_budget_rejection() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "still thinking...", "thought": true}
                ]},
                "finishReason": "MAX_TOKENS"
            }],
            "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 0}
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = into_completion(resp, "gemini-2.5-flash").unwrap_err();
        assert!(matches!(err, LlmError::BudgetRejected(_)));
    }
}
