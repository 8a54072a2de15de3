//! `skillforge validate`: check an existing SKILL.md.

use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;

use crate::state::AppState;
use crate::ui;

pub async fn run(state: &AppState, file: &Path) -> Result<()> {
    let validator = state.validator()?;
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let result = validator.validate(&content);
    tracing::debug!(file = %file.display(), valid = result.is_valid, errors = result.errors.len(), "Validated");

    if !result.is_valid {
        ui::print_validation_errors(&result.errors);
        bail!("{} is not a valid skill", file.display());
    }

    println!();
    match validator.skill_name(&content) {
        Some(name) => ui::success(&format!(
            "{} is valid ({})",
            file.display(),
            style(name).cyan()
        )),
        None => ui::success(&format!("{} is valid", file.display())),
    }
    println!();
    Ok(())
}
