//! Shared domain types for Skillforge.
//!
//! This crate contains the domain types used across the Skillforge workspace:
//! conversation turns, LLM request/response shapes, provider configuration,
//! validation results, and the application config file model.
//!
//! No infrastructure dependencies -- only serde, thiserror, secrecy.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod skill;
pub mod validation;
