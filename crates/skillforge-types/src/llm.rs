//! LLM request/response types for Skillforge.
//!
//! These types model the data shapes shared by every provider backend:
//! completion requests and responses, usage tracking, provider selection,
//! and the error taxonomy (including rate-limit classification).

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Role of a message in an LLM request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in an LLM request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request to an LLM provider for a single completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Tokens reserved for internal deliberation, separate from `max_tokens`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_budget: Option<u32>,
}

/// Response from an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// Reason why the LLM stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    Other,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::StopSequence => write!(f, "stop_sequence"),
            StopReason::Other => write!(f, "other"),
        }
    }
}

/// Token usage for a completion request/response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

// ---------------------------------------------------------------------------
// Provider selection
// ---------------------------------------------------------------------------

/// The closed set of supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
    ];

    /// Identifier used in config sections and `SKILLFORGE_PROVIDER`.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Prefix for the provider's environment variables (`<PREFIX>_API_KEY`).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI",
            ProviderKind::Anthropic => "ANTHROPIC",
            ProviderKind::Gemini => "GEMINI",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Google Gemini",
        }
    }

    /// Literal marker that identifies a quota-exhaustion failure in this
    /// provider's error messages.
    pub fn quota_signature(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "rate_limit_exceeded",
            ProviderKind::Anthropic => "rate_limit_error",
            ProviderKind::Gemini => "429 RESOURCE_EXHAUSTED",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(format!("invalid provider: '{other}'")),
        }
    }
}

/// Fully resolved configuration for the active provider.
///
/// Built once at startup from environment variables and the config file;
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub reasoning_budget: Option<u32>,
    pub api_key: SecretString,
    pub base_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Details extracted from a provider's quota-exhaustion message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitInfo {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub retry_after: Option<Duration>,
    pub quota_metric: Option<String>,
    pub limit: Option<u64>,
    pub model: Option<String>,
    /// Raw provider message the fields were parsed from.
    pub raw: String,
}

impl fmt::Display for RateLimitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, self.retry_after) {
            (Some(msg), Some(after)) => write!(f, "{msg} (retry after {}s)", after.as_secs()),
            (Some(msg), None) => f.write_str(msg),
            (None, Some(after)) => write!(f, "retry after {}s", after.as_secs()),
            (None, None) => f.write_str(&self.raw),
        }
    }
}

/// Errors from LLM provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("rate limited: {0}")]
    RateLimited(RateLimitInfo),

    /// The provider refused the output/reasoning token budget combination.
    #[error("token budget rejected: {0}")]
    BudgetRejected(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("provider returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited(_))
    }

    /// Short machine-readable classification, used in run logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Provider { .. } => "provider",
            LlmError::RateLimited(_) => "rate_limited",
            LlmError::BudgetRejected(_) => "budget_rejected",
            LlmError::AuthenticationFailed => "authentication_failed",
            LlmError::Deserialization(_) => "deserialization",
            LlmError::InvalidRequest(_) => "invalid_request",
            LlmError::EmptyResponse => "empty_response",
        }
    }
}
