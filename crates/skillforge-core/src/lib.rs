//! Conversation orchestration and validation for Skillforge.
//!
//! This crate defines the provider port (`LlmProvider`) that the
//! infrastructure layer implements, plus everything that runs on top of it:
//! the conversation session, the dialogue controller and the SKILL.md
//! validator. It depends only on `skillforge-types` -- never on
//! `skillforge-infra` or any network/filesystem crate.

pub mod dialogue;
pub mod events;
pub mod llm;
pub mod prompt;
pub mod rate_limit;
pub mod session;
pub mod validator;
