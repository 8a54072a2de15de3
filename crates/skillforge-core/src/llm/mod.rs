//! LLM provider abstractions for Skillforge.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `TextGenerator`: prompt-in, text-out adapter with reasoning budget handling

pub mod box_provider;
pub mod generator;
pub mod provider;
