//! TextGenerator -- the prompt-in, text-out adapter over any provider.
//!
//! Owns the generation settings for a run and enforces the relationship
//! between the output budget and the optional reasoning budget: the output
//! budget must always be strictly larger, and a provider-side rejection of
//! the combination is corrected and retried exactly once.

use tracing::{Instrument, info_span, warn};

use skillforge_types::llm::{CompletionRequest, LlmError, Message, ProviderConfig};

use super::box_provider::BoxLlmProvider;

/// Headroom added above the reasoning budget when the output budget is too small.
pub const REASONING_HEADROOM: u32 = 512;

/// Sampling and budget settings for every request in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub reasoning_budget: Option<u32>,
}

impl GenerationSettings {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            reasoning_budget: config.reasoning_budget,
        }
    }

    /// Raise `max_output_tokens` above the reasoning budget if needed.
    ///
    /// Returns `true` when the settings were changed.
    fn enforce_reasoning_headroom(&mut self) -> bool {
        match self.reasoning_budget {
            Some(budget) if self.max_output_tokens <= budget => {
                self.max_output_tokens = budget.saturating_add(REASONING_HEADROOM);
                true
            }
            _ => false,
        }
    }
}

/// Uniform `generate_text` over a type-erased provider.
pub struct TextGenerator {
    provider: BoxLlmProvider,
    settings: GenerationSettings,
}

impl TextGenerator {
    /// Build a generator, correcting a misconfigured output budget up front.
    pub fn new(provider: BoxLlmProvider, mut settings: GenerationSettings) -> Self {
        let configured = settings.max_output_tokens;
        if settings.enforce_reasoning_headroom() {
            warn!(
                provider = provider.name(),
                configured_max_output_tokens = configured,
                reasoning_budget = ?settings.reasoning_budget,
                adjusted_max_output_tokens = settings.max_output_tokens,
                "max_output_tokens must exceed the reasoning budget; raised it"
            );
        }
        Self { provider, settings }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send one prompt and return the completion text, trimmed.
    ///
    /// On [`LlmError::BudgetRejected`] the output budget is grown by the
    /// reasoning budget and the request is sent once more; the corrected
    /// value is kept for later calls. Without a reasoning budget there is
    /// nothing to grow by, so the rejection is returned as-is.
    pub async fn generate_text(&mut self, prompt: &str) -> Result<String, LlmError> {
        match self.send(prompt).await {
            Err(LlmError::BudgetRejected(reason)) => {
                let Some(corrected) = self.corrected_output_budget() else {
                    return Err(LlmError::BudgetRejected(reason));
                };
                warn!(
                    provider = self.provider.name(),
                    %reason,
                    previous_max_output_tokens = self.settings.max_output_tokens,
                    corrected_max_output_tokens = corrected,
                    "provider rejected token budget; retrying once"
                );
                self.settings.max_output_tokens = corrected;
                self.send(prompt).await
            }
            other => other,
        }
    }

    fn corrected_output_budget(&self) -> Option<u32> {
        let reasoning = self.settings.reasoning_budget.filter(|b| *b > 0)?;
        let corrected = self.settings.max_output_tokens.saturating_add(reasoning);
        (corrected > self.settings.max_output_tokens).then_some(corrected)
    }

    fn build_request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: self.settings.max_output_tokens,
            temperature: Some(self.settings.temperature),
            reasoning_budget: self.settings.reasoning_budget,
        }
    }

    async fn send(&self, prompt: &str) -> Result<String, LlmError> {
        let request = self.build_request(prompt);

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        );

        let response = self
            .provider
            .complete(&request)
            .instrument(span.clone())
            .await?;

        span.record("gen_ai.usage.input_tokens", response.usage.input_tokens);
        span.record("gen_ai.usage.output_tokens", response.usage.output_tokens);

        let text = response.content.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}
