//! Google Gemini provider (native `generateContent` REST API).

pub mod client;
pub mod types;

pub use client::GeminiProvider;
