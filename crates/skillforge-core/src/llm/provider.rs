//! LlmProvider trait definition.
//!
//! This is the core abstraction that every LLM backend implements. Uses
//! RPITIT for `complete`; type erasure for runtime selection lives in
//! [`super::box_provider`].

use skillforge_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderKind};

/// Trait for LLM provider backends (OpenAI, Anthropic, Gemini).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition) -- no
/// `async_trait` macro. Each implementation owns its authentication and
/// maps the shared request/response shapes onto its own wire format.
///
/// Implementations live in skillforge-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Send a completion request and receive the full response.
    ///
    /// Exactly one network round trip per call.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
