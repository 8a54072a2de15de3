//! Configuration loader for Skillforge.
//!
//! Reads `skillforge.toml` into [`AppConfig`] and resolves the active
//! provider into a [`ProviderConfig`]. Environment variables win over the
//! config file; `[providers.<id>]` wins over the legacy top-level `[<id>]`
//! section. Resolution takes an injectable variable lookup so tests never
//! touch the process environment.

use std::path::Path;

use anyhow::Context;
use secrecy::SecretString;

use skillforge_types::config::{AppConfig, ProviderSection, SkillTargetsConfig};
use skillforge_types::error::ConfigError;
use skillforge_types::llm::{ProviderConfig, ProviderKind};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "skillforge.toml";

/// Environment variable selecting the provider.
pub const PROVIDER_ENV: &str = "SKILLFORGE_PROVIDER";

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Legacy sections are consulted in this order when nothing else selects a provider.
const LEGACY_ORDER: [ProviderKind; 3] =
    [ProviderKind::Gemini, ProviderKind::OpenAi, ProviderKind::Anthropic];

/// Load `.env` from the working directory, if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!("Failed to load .env: {err}"),
    }
}

/// Process environment lookup; blank values count as unset.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file cannot be read or parsed, returns a [`ConfigError`].
pub async fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                reason: err.to_string(),
            });
        }
    };

    toml::from_str::<AppConfig>(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Pick the active provider.
///
/// Priority:
/// 1. `SKILLFORGE_PROVIDER`
/// 2. `[llm] provider`
/// 3. The first legacy section present (`[gemini]`, `[openai]`, `[anthropic]`)
pub fn resolve_provider_kind(
    config: &AppConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ProviderKind, ConfigError> {
    let parse = |id: &str| {
        id.parse::<ProviderKind>()
            .map_err(|_| ConfigError::UnknownProvider(id.trim().to_string()))
    };
    if let Some(id) = env(PROVIDER_ENV) {
        return parse(&id);
    }
    if let Some(id) = config.llm.provider.as_deref().filter(|s| !s.trim().is_empty()) {
        return parse(id);
    }
    LEGACY_ORDER
        .into_iter()
        .find(|kind| config.legacy_section(*kind).is_some())
        .ok_or(ConfigError::NoProvider)
}

/// Build the fully resolved [`ProviderConfig`] for `kind`.
///
/// Each field is taken from `<ID>_<FIELD>` in the environment, then
/// `[providers.<id>]`, then the legacy `[<id>]` section.
pub fn resolve_provider_config(
    config: &AppConfig,
    kind: ProviderKind,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ProviderConfig, ConfigError> {
    let sections: Vec<&ProviderSection> = [config.provider_section(kind), config.legacy_section(kind)]
        .into_iter()
        .flatten()
        .collect();
    let from_file = |field: fn(&ProviderSection) -> Option<String>| {
        sections
            .iter()
            .find_map(|s| field(s).filter(|v| !v.trim().is_empty()))
    };

    let prefix = kind.env_prefix();
    let key_var = format!("{prefix}_API_KEY");
    let model_var = format!("{prefix}_MODEL");

    let api_key = env(&key_var)
        .or_else(|| from_file(|s| s.api_key.clone()))
        .ok_or_else(|| ConfigError::MissingVariable {
            variable: key_var.clone(),
            provider: kind.id().to_string(),
        })?;
    let model = env(&model_var)
        .or_else(|| from_file(|s| s.model.clone()))
        .ok_or_else(|| ConfigError::MissingModel {
            provider: kind.id().to_string(),
            variable: model_var.clone(),
        })?;
    let base_url = env(&format!("{prefix}_BASE_URL")).or_else(|| from_file(|s| s.base_url.clone()));

    Ok(ProviderConfig {
        kind,
        model: model.trim().to_string(),
        temperature: sections
            .iter()
            .find_map(|s| s.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE),
        max_output_tokens: sections
            .iter()
            .find_map(|s| s.max_output_tokens)
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        reasoning_budget: sections.iter().find_map(|s| s.reasoning_budget),
        api_key: SecretString::from(api_key.trim().to_string()),
        base_url,
    })
}

// ---------------------------------------------------------------------------
// Config edits
// ---------------------------------------------------------------------------

/// Load the config file as a raw table, apply `edit`, and write it back.
///
/// Editing the raw table keeps keys this program does not model.
pub async fn update_config_file(
    path: &Path,
    edit: impl FnOnce(&mut toml::Table),
) -> anyhow::Result<()> {
    let mut table = match tokio::fs::read_to_string(path).await {
        Ok(content) => content
            .parse::<toml::Table>()
            .with_context(|| format!("failed to parse {}", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    edit(&mut table);

    let rendered = toml::to_string_pretty(&table).context("failed to serialize config")?;
    tokio::fs::write(path, rendered)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!("Updated config file {}", path.display());
    Ok(())
}

fn section<'a>(table: &'a mut toml::Table, name: &str) -> &'a mut toml::Table {
    let entry = table
        .entry(name.to_string())
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    if !entry.is_table() {
        *entry = toml::Value::Table(toml::Table::new());
    }
    match entry {
        toml::Value::Table(t) => t,
        _ => unreachable!("entry was just replaced with a table"),
    }
}

fn string_array(items: &[String]) -> toml::Value {
    toml::Value::Array(items.iter().cloned().map(toml::Value::String).collect())
}

/// Persist `[llm] provider`.
pub async fn save_active_provider(path: &Path, kind: ProviderKind) -> anyhow::Result<()> {
    update_config_file(path, |table| {
        section(table, "llm").insert("provider".into(), toml::Value::String(kind.id().into()));
    })
    .await
}

/// Persist `[projects] roots`.
pub async fn save_project_roots(path: &Path, roots: &[String]) -> anyhow::Result<()> {
    update_config_file(path, |table| {
        section(table, "projects").insert("roots".into(), string_array(roots));
    })
    .await
}

/// Persist `[skill_targets]`.
pub async fn save_skill_targets(path: &Path, targets: &SkillTargetsConfig) -> anyhow::Result<()> {
    let targets = targets.normalized();
    update_config_file(path, |table| {
        let section = section(table, "skill_targets");
        section.insert("default".into(), toml::Value::String(targets.default.clone()));
        section.insert("options".into(), string_array(&targets.options));
        section.insert("selected".into(), string_array(&targets.selected));
    })
    .await
}
