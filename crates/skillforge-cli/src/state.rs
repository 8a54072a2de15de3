//! Application state shared by every command.
//!
//! AppState holds the loaded config file and the saved preferences. Provider
//! settings and the validator are resolved on demand so a config edit made
//! from the menu takes effect on the next run.

use std::path::PathBuf;

use anyhow::Context;

use skillforge_core::validator::SkillValidator;
use skillforge_infra::config::{
    DEFAULT_CONFIG_FILE, load_config, process_env, resolve_provider_config, resolve_provider_kind,
};
use skillforge_infra::prefs::{PREFS_FILE, Preferences};
use skillforge_infra::publish::expand_home;
use skillforge_types::config::AppConfig;
use skillforge_types::error::ConfigError;
use skillforge_types::llm::ProviderConfig;
use skillforge_types::skill::OutputLocation;

pub struct AppState {
    pub config_path: PathBuf,
    pub config: AppConfig,
    pub prefs: Preferences,
}

impl AppState {
    /// Load the config file (defaults when missing) and the preferences file.
    pub async fn init(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let config = load_config(&config_path).await?;
        let prefs = Preferences::load(PREFS_FILE);

        tracing::debug!(
            config = %config_path.display(),
            prefs = %prefs.path().display(),
            "State initialized"
        );

        Ok(Self {
            config_path,
            config,
            prefs,
        })
    }

    /// Re-read the config file after an edit.
    pub async fn reload_config(&mut self) -> anyhow::Result<()> {
        self.config = load_config(&self.config_path)
            .await
            .with_context(|| format!("Failed to reload {}", self.config_path.display()))?;
        Ok(())
    }

    /// The active provider's fully resolved settings.
    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        let kind = resolve_provider_kind(&self.config, process_env)?;
        resolve_provider_config(&self.config, kind, process_env)
    }

    pub fn validator(&self) -> Result<SkillValidator, ConfigError> {
        SkillValidator::new(self.config.validation.clone())
    }

    pub fn log_dir(&self) -> PathBuf {
        expand_home(&self.config.logging.dir)
    }

    /// Saved preference first, then `[output] default_location`.
    pub fn default_location(&self) -> OutputLocation {
        self.prefs
            .output_location()
            .or_else(|| self.config.output.default_location.parse().ok())
            .unwrap_or(OutputLocation::Personal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_in(dir: &std::path::Path, config: AppConfig) -> AppState {
        AppState {
            config_path: dir.join(DEFAULT_CONFIG_FILE),
            config,
            prefs: Preferences::load(dir.join(PREFS_FILE)),
        }
    }

    #[tokio::test]
    async fn init_with_missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::init(Some(tmp.path().join("absent.toml")))
            .await
            .unwrap();
        assert_eq!(state.config.questions.max_questions, 5);
        assert!(state.validator().is_ok());
    }

    #[test]
    fn default_location_prefers_saved_choice() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.output.default_location = "project".to_string();

        let mut state = state_in(tmp.path(), config);
        assert_eq!(state.default_location(), OutputLocation::Project);

        state
            .prefs
            .set_output_location(&OutputLocation::Custom(PathBuf::from("/srv/skills")));
        assert_eq!(
            state.default_location(),
            OutputLocation::Custom(PathBuf::from("/srv/skills"))
        );
    }

    #[tokio::test]
    async fn reload_picks_up_edits() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = state_in(tmp.path(), AppConfig::default());
        tokio::fs::write(&state.config_path, "[questions]\nmax_questions = 2\n")
            .await
            .unwrap();
        state.reload_config().await.unwrap();
        assert_eq!(state.config.questions.max_questions, 2);
    }
}
