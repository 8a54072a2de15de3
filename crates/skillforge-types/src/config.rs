//! Configuration file model for Skillforge.
//!
//! `AppConfig` mirrors `skillforge.toml`. Every section has defaults so an
//! empty or missing file yields a usable configuration; only the provider
//! credentials have to come from somewhere (environment or file).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::llm::ProviderKind;
use crate::validation::ValidationRules;

/// Top-level configuration, loaded from `skillforge.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    /// Per-provider settings keyed by provider id (`[providers.gemini]`).
    pub providers: BTreeMap<String, ProviderSection>,
    /// Legacy top-level provider sections (`[gemini]` etc.).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<ProviderSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<ProviderSection>,
    pub questions: QuestionsConfig,
    pub validation: ValidationRules,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub projects: ProjectsConfig,
    pub skill_targets: SkillTargetsConfig,
}

impl AppConfig {
    /// The `[providers.<id>]` section for a provider, if present.
    pub fn provider_section(&self, kind: ProviderKind) -> Option<&ProviderSection> {
        self.providers.get(kind.id())
    }

    /// The legacy top-level section for a provider, if present.
    pub fn legacy_section(&self, kind: ProviderKind) -> Option<&ProviderSection> {
        match kind {
            ProviderKind::OpenAi => self.openai.as_ref(),
            ProviderKind::Anthropic => self.anthropic.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
        }
    }

    /// Providers that have any config section, in declaration order of
    /// [`ProviderKind::ALL`].
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|k| self.provider_section(*k).is_some() || self.legacy_section(*k).is_some())
            .collect()
    }
}

/// `[llm]` section: which provider is active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Settings for one provider. All fields optional; environment variables
/// take precedence over anything set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_budget: Option<u32>,
}

/// `[questions]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionsConfig {
    pub max_questions: u32,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self { max_questions: 5 }
    }
}

/// `[output]` section: where generated skills are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub personal_path: String,
    pub project_path: String,
    pub default_location: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            personal_path: "~/.claude/skills".to_string(),
            project_path: ".claude/skills".to_string(),
            default_location: "personal".to_string(),
        }
    }
}

/// `[logging]` section: where per-run event logs go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
        }
    }
}

/// `[projects]` section: roots scanned for importable projects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectsConfig {
    pub roots: Vec<String>,
}

impl ProjectsConfig {
    /// Non-empty, trimmed roots with duplicates removed (first wins).
    pub fn normalized_roots(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for root in &self.roots {
            let root = root.trim();
            if !root.is_empty() && !out.iter().any(|r| r == root) {
                out.push(root.to_string());
            }
        }
        out
    }
}

pub const DEFAULT_SKILL_TARGET: &str = ".claude/skills";

/// `[skill_targets]` section: folders inside a project that receive imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillTargetsConfig {
    pub default: String,
    pub options: Vec<String>,
    pub selected: Vec<String>,
}

impl Default for SkillTargetsConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_SKILL_TARGET.to_string(),
            options: vec![
                ".claude/skills".to_string(),
                ".codex/skills".to_string(),
                ".agent/skills".to_string(),
                ".agents/skills".to_string(),
            ],
            selected: vec![DEFAULT_SKILL_TARGET.to_string()],
        }
    }
}

impl SkillTargetsConfig {
    /// Returns a copy where `default` and every selected target are listed in
    /// `options`, and `selected` is never empty.
    pub fn normalized(&self) -> Self {
        let clean = |items: &[String]| -> Vec<String> {
            let mut out: Vec<String> = Vec::new();
            for item in items {
                let item = item.trim();
                if !item.is_empty() && !out.iter().any(|o| o == item) {
                    out.push(item.to_string());
                }
            }
            out
        };

        let default = match self.default.trim() {
            "" => DEFAULT_SKILL_TARGET.to_string(),
            d => d.to_string(),
        };
        let mut options = clean(&self.options);
        if !options.contains(&default) {
            options.insert(0, default.clone());
        }
        let mut selected = clean(&self.selected);
        if selected.is_empty() {
            selected.push(default.clone());
        }
        for s in &selected {
            if !options.contains(s) {
                options.push(s.clone());
            }
        }
        Self {
            default,
            options,
            selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.questions.max_questions, 5);
        assert_eq!(config.validation.max_name_length, 64);
        assert_eq!(config.output.personal_path, "~/.claude/skills");
        assert_eq!(config.logging.dir, "logs");
        assert!(config.llm.provider.is_none());
        assert!(config.configured_providers().is_empty());
    }

    #[test]
    fn test_provider_sections_and_legacy() {
        let toml_str = r#"
[llm]
provider = "anthropic"

[providers.anthropic]
model = "claude-sonnet-4-5"
reasoning_budget = 4096

[gemini]
model = "gemini-2.5-flash"
temperature = 0.4
max_output_tokens = 4096
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.provider.as_deref(), Some("anthropic"));
        let anthropic = config.provider_section(ProviderKind::Anthropic).unwrap();
        assert_eq!(anthropic.reasoning_budget, Some(4096));
        let gemini = config.legacy_section(ProviderKind::Gemini).unwrap();
        assert_eq!(gemini.max_output_tokens, Some(4096));
        assert_eq!(
            config.configured_providers(),
            vec![ProviderKind::Anthropic, ProviderKind::Gemini]
        );
    }

    #[test]
    fn test_normalized_roots_dedups() {
        let projects = ProjectsConfig {
            roots: vec![" ~/src ".into(), "".into(), "~/src".into(), "~/work".into()],
        };
        assert_eq!(projects.normalized_roots(), vec!["~/src", "~/work"]);
    }

    #[test]
    fn test_skill_targets_normalized() {
        let targets = SkillTargetsConfig {
            default: String::new(),
            options: vec![".codex/skills".into()],
            selected: vec![".custom/skills".into()],
        };
        let n = targets.normalized();
        assert_eq!(n.default, ".claude/skills");
        assert_eq!(n.options, vec![".claude/skills", ".codex/skills", ".custom/skills"]);
        assert_eq!(n.selected, vec![".custom/skills"]);
    }

    #[test]
    fn test_skill_targets_empty_selection_falls_back_to_default() {
        let targets = SkillTargetsConfig {
            selected: vec![],
            ..Default::default()
        };
        assert_eq!(targets.normalized().selected, vec![".claude/skills"]);
    }
}
