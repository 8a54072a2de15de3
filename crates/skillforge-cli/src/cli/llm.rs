//! `skillforge llm`: choose the active provider among the configured ones.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Select};

use skillforge_infra::config::{
    PROVIDER_ENV, process_env, resolve_provider_config, resolve_provider_kind,
    save_active_provider,
};
use skillforge_infra::llm::{create_provider, test_provider_connection};
use skillforge_types::config::AppConfig;
use skillforge_types::llm::ProviderKind;

use crate::state::AppState;
use crate::ui;

pub async fn run(state: &mut AppState) -> Result<()> {
    let configured = state.config.configured_providers();
    if configured.is_empty() {
        println!();
        ui::warn(&format!(
            "No providers configured in {}.",
            state.config_path.display()
        ));
        ui::info("Add a [providers.<id>] section (openai, anthropic or gemini) with at least a model.");
        println!();
        return Ok(());
    }

    let active = resolve_provider_kind(&state.config, process_env).ok();

    ui::heading("LLM Providers");
    println!("{}", providers_table(&state.config, &configured, active));
    println!();

    let items: Vec<String> = configured
        .iter()
        .map(|k| k.display_name().to_string())
        .collect();
    let default = active
        .and_then(|a| configured.iter().position(|k| *k == a))
        .unwrap_or(0);
    let selection = Select::new()
        .with_prompt("Active provider")
        .items(&items)
        .default(default)
        .interact()?;
    let kind = configured[selection];

    save_active_provider(&state.config_path, kind).await?;
    state.reload_config().await?;
    ui::success(&format!("Active provider set to {}", style(kind.display_name()).cyan()));

    if process_env(PROVIDER_ENV).is_some() {
        ui::warn("SKILLFORGE_PROVIDER is set and still overrides this choice.");
    }

    let test = Confirm::new()
        .with_prompt("Test the connection now?")
        .default(true)
        .interact()?;
    if test {
        check_connection(&state.config, kind).await?;
    }
    println!();
    Ok(())
}

fn providers_table(
    config: &AppConfig,
    configured: &[ProviderKind],
    active: Option<ProviderKind>,
) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Provider").fg(Color::White),
        Cell::new("Model").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for kind in configured {
        let model = config
            .provider_section(*kind)
            .or_else(|| config.legacy_section(*kind))
            .and_then(|s| s.model.clone())
            .unwrap_or_else(|| format!("${}_MODEL", kind.env_prefix()));
        let status = if Some(*kind) == active {
            Cell::new("● active").fg(Color::Green)
        } else {
            Cell::new("○").fg(Color::DarkGrey)
        };
        table.add_row(vec![Cell::new(kind.display_name()), Cell::new(model), status]);
    }
    table
}

async fn check_connection(config: &AppConfig, kind: ProviderKind) -> Result<()> {
    let provider_config = resolve_provider_config(config, kind, process_env)?;
    let provider = create_provider(&provider_config)?;

    let spinner = ui::spinner(&format!("Testing {}...", kind.display_name()));
    let result = test_provider_connection(&provider, &provider_config.model).await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => ui::success(&format!(
            "Connected to {} ({})",
            kind.display_name(),
            provider_config.model
        )),
        Err(e) => {
            tracing::warn!(provider = %kind, error = %e, "Connection test failed");
            eprintln!("  {} Connection test failed: {}", style("!").red().bold(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_marks_active_provider() {
        let config: AppConfig = toml::from_str(
            "[providers.anthropic]\nmodel = \"claude-sonnet-4-5\"\n\n[gemini]\nmodel = \"gemini-2.5-flash\"\n",
        )
        .unwrap();
        let configured = config.configured_providers();
        let rendered = providers_table(&config, &configured, Some(ProviderKind::Gemini)).to_string();
        assert!(rendered.contains("claude-sonnet-4-5"));
        assert!(rendered.contains("gemini-2.5-flash"));
        assert!(rendered.contains("● active"));
    }
}
