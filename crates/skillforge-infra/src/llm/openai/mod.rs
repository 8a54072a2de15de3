//! OpenAI LLM provider implementation.
//!
//! Uses [`async_openai`] for type-safe request/response handling against the
//! Chat Completions API. A reasoning budget is expressed as a
//! `reasoning_effort` level since the API has no token-exact knob.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, FinishReason,
    ReasoningEffort,
};
use secrecy::{ExposeSecret, SecretString};

use skillforge_core::llm::provider::LlmProvider;
use skillforge_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, ProviderKind, StopReason, Usage,
};

use crate::llm::rate_limited;

/// Budgets below this map to `low` effort.
const MEDIUM_EFFORT_FROM: u32 = 4_096;
/// Budgets at or above this map to `high` effort.
const HIGH_EFFORT_FROM: u32 = 16_384;

/// OpenAI Chat Completions provider.
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    base_url: String,
}

impl OpenAiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(api_key: SecretString, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .unwrap_or(Self::DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(&base_url);

        Self {
            client: Client::with_config(openai_config),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a [`CreateChatCompletionRequest`] from a generic [`CompletionRequest`].
    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        )),
                        refusal: None,
                        name: None,
                        audio: None,
                        tool_calls: None,
                        function_call: None,
                    })
                }
            })
            .collect();

        let reasoning_effort = request.reasoning_budget.map(effort_for_budget);

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            max_completion_tokens: Some(request.max_tokens),
            // Reasoning models only accept the default temperature.
            temperature: if reasoning_effort.is_some() {
                None
            } else {
                request.temperature.map(|t| t as f32)
            },
            reasoning_effort,
            ..Default::default()
        }
    }
}

/// Map a reasoning token budget onto the nearest effort level.
fn effort_for_budget(budget: u32) -> ReasoningEffort {
    if budget < MEDIUM_EFFORT_FROM {
        ReasoningEffort::Low
    } else if budget < HIGH_EFFORT_FROM {
        ReasoningEffort::Medium
    } else {
        ReasoningEffort::High
    }
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let oai_request = self.build_request(request);

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        let choice = response.choices.first();
        let content = choice
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        let stop_reason = choice
            .and_then(|c| c.finish_reason.as_ref())
            .map(|fr| match fr {
                FinishReason::Stop => StopReason::EndTurn,
                FinishReason::Length => StopReason::MaxTokens,
                FinishReason::ContentFilter => StopReason::Other,
                FinishReason::ToolCalls | FinishReason::FunctionCall => StopReason::Other,
            })
            .unwrap_or(StopReason::EndTurn);

        // Hidden reasoning can use up the whole completion allowance.
        if content.trim().is_empty() && stop_reason == StopReason::MaxTokens {
            return Err(LlmError::BudgetRejected(
                "reasoning consumed the entire completion token allowance".to_string(),
            ));
        }

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            id: response.id,
            content,
            model: response.model,
            stop_reason,
            usage,
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded"
                || error_type == "rate_limit_exceeded"
                || error_type == "insufficient_quota"
            {
                rate_limited(
                    format!("rate_limit_exceeded: {}", api_err.message),
                    None,
                )
            } else if api_err.message.contains("max_completion_tokens")
                || api_err.message.contains("max_tokens")
            {
                LlmError::BudgetRejected(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) => LlmError::AuthenticationFailed,
            Some(429) => rate_limited(format!("rate_limit_exceeded: {err}"), None),
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}
