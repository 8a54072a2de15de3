//! Infrastructure layer for Skillforge.
//!
//! Contains the concrete LLM providers behind the `LlmProvider` port from
//! `skillforge-core`, configuration loading, and the filesystem adapters:
//! skill publishing and import, preferences, and per-run event logs.

pub mod config;
pub mod llm;
pub mod prefs;
pub mod publish;
pub mod run_log;
pub mod skill_store;
