//! Interactive main menu, shown when no subcommand is given.
//!
//! Each action runs to completion or failure and the menu comes back;
//! errors are reported, never fatal. Ctrl-C on the menu itself quits.

use anyhow::Result;
use console::style;
use dialoguer::Select;

use crate::cli::generate::GenerateArgs;
use crate::cli::{browse, generate, llm, projects};
use crate::state::AppState;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Generate,
    Browse,
    Projects,
    Provider,
    Help,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 6] = [
        MenuAction::Generate,
        MenuAction::Browse,
        MenuAction::Projects,
        MenuAction::Provider,
        MenuAction::Help,
        MenuAction::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuAction::Generate => "Generate a new skill",
            MenuAction::Browse => "Browse personal skills",
            MenuAction::Projects => "Import skills into projects",
            MenuAction::Provider => "Change LLM provider",
            MenuAction::Help => "Help",
            MenuAction::Quit => "Quit",
        }
    }
}

pub async fn run(state: &mut AppState) -> Result<()> {
    print_banner(state);

    let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();
    loop {
        let selection = match Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()
        {
            Ok(selection) => selection,
            Err(e) => {
                let e = anyhow::Error::from(e);
                if ui::is_interrupted(&e) {
                    return Ok(());
                }
                return Err(e);
            }
        };

        let action = MenuAction::ALL[selection];
        let result = match action {
            MenuAction::Generate => generate::run(state, GenerateArgs::default()).await,
            MenuAction::Browse => browse::run(state, None).await,
            MenuAction::Projects => projects::run(state).await,
            MenuAction::Provider => llm::run(state).await,
            MenuAction::Help => {
                ui::print_help();
                Ok(())
            }
            MenuAction::Quit => return Ok(()),
        };

        match result {
            Ok(()) => {}
            Err(e) if ui::is_interrupted(&e) => {
                println!();
                ui::info("Cancelled.");
            }
            Err(e) => {
                tracing::debug!(action = action.label(), error = ?e, "Menu action failed");
                ui::print_error(&e);
            }
        }
        println!();
    }
}

fn print_banner(state: &AppState) {
    println!();
    println!("  {}", style("Skillforge").cyan().bold());
    println!("  {}", style("Build agent skills through a short conversation").dim());
    match state.provider_config() {
        Ok(provider) => println!(
            "  {} {} ({})",
            style("Provider:").dim(),
            provider.kind.display_name(),
            provider.model
        ),
        Err(e) => println!("  {} {}", style("Provider:").dim(), style(e).yellow()),
    }
    println!();
}
