//! Validation result and rule set for generated skill files.

use serde::{Deserialize, Serialize};

/// Outcome of validating one skill file.
///
/// Errors are plain human-readable messages in the order they were found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Declarative limits applied by the validator.
///
/// Deserialized from the `[validation]` config section. Every field has a
/// default so a partial section is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub max_name_length: usize,
    pub name_pattern: String,
    pub min_description_length: usize,
    pub max_description_length: usize,
    pub min_body_length: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_name_length: 64,
            name_pattern: r"^[a-z0-9-]+$".to_string(),
            min_description_length: 20,
            max_description_length: 1024,
            min_body_length: 50,
        }
    }
}
