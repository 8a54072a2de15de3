use thiserror::Error;

/// Errors raised while resolving configuration.
///
/// These are detected eagerly, before any provider or validator is built,
/// so nothing downstream ever sees a half-initialized component.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {variable} for provider '{provider}' (set the environment variable or add it to the config file)")]
    MissingVariable { variable: String, provider: String },

    #[error("no model configured for provider '{provider}' (set {variable} or add `model` to the config file)")]
    MissingModel { provider: String, variable: String },

    #[error("no LLM provider selected (set SKILLFORGE_PROVIDER or add an [llm] section to the config file)")]
    NoProvider,

    #[error("unknown provider '{0}' (expected one of: openai, anthropic, gemini)")]
    UnknownProvider(String),

    #[error("invalid name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_names_the_variable() {
        let err = ConfigError::MissingVariable {
            variable: "GEMINI_API_KEY".to_string(),
            provider: "gemini".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GEMINI_API_KEY"));
        assert!(msg.contains("gemini"));
    }

    #[test]
    fn test_unknown_provider_display() {
        let err = ConfigError::UnknownProvider("mistral".to_string());
        assert!(err.to_string().starts_with("unknown provider 'mistral'"));
    }
}
