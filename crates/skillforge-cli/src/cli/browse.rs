//! `skillforge browse`: list installed skills and copy one into the
//! current project.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Select};

use skillforge_infra::publish::expand_home;
use skillforge_infra::skill_store::{ImportOutcome, discover_skills, import_skill};
use skillforge_types::skill::{SKILL_FILE, SkillSummary};

use crate::prompter::into_io;
use crate::state::AppState;
use crate::ui;

pub async fn run(state: &AppState, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| expand_home(&state.config.output.personal_path));
    let project_root = PathBuf::from(&state.config.output.project_path);

    let skills = discover_skills(&dir)?;
    if skills.is_empty() {
        println!();
        ui::info(&format!("No skills found in {}", dir.display()));
        println!();
        return Ok(());
    }

    ui::heading(&format!("Skills in {}", dir.display()));
    println!("{}", skills_table(&skills));
    println!();

    let mut items: Vec<String> = skills.iter().map(SkillSummary::display).collect();
    items.push("Back".to_string());

    loop {
        let selection = Select::new()
            .with_prompt("Select a skill")
            .items(&items)
            .default(0)
            .interact()?;
        let Some(skill) = skills.get(selection) else {
            return Ok(());
        };

        show_details(skill).await;

        let actions = [
            format!("Import into this project ({})", project_root.display()),
            "Back to list".to_string(),
            "Done".to_string(),
        ];
        match Select::new().items(&actions).default(0).interact()? {
            0 => {
                report_import(import_skill(skill, &project_root, confirm_overwrite)?);
            }
            1 => continue,
            _ => return Ok(()),
        }
    }
}

pub fn skills_table(skills: &[SkillSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Description").fg(Color::White),
        Cell::new("Invocable").fg(Color::White),
    ]);

    for (i, skill) in skills.iter().enumerate() {
        let invocable = if skill.user_invocable {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        let description = if skill.description.is_empty() {
            Cell::new("(no description)").fg(Color::DarkGrey)
        } else {
            Cell::new(&skill.description)
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&skill.name).fg(Color::Cyan),
            description,
            invocable,
        ]);
    }
    table
}

async fn show_details(skill: &SkillSummary) {
    println!();
    println!("  {}", style(&skill.name).cyan().bold());
    println!("  {} {}", style("Path:").dim(), skill.path.display());
    if let Some(tools) = &skill.allowed_tools {
        println!("  {} {}", style("Allowed tools:").dim(), tools);
    }

    let file = skill.path.join(SKILL_FILE);
    match tokio::fs::read_to_string(&file).await {
        Ok(content) => ui::render_skill(&content),
        Err(e) => ui::warn(&format!("Could not read {}: {e}", file.display())),
    }
}

/// Overwrite prompt for imports whose destination already exists.
pub fn confirm_overwrite(dest: &Path) -> io::Result<bool> {
    Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", dest.display()))
        .default(false)
        .interact()
        .map_err(into_io)
}

pub fn report_import(outcome: ImportOutcome) {
    match outcome {
        ImportOutcome::Imported(dest) => ui::success(&format!("Imported to {}", dest.display())),
        ImportOutcome::Skipped(dest) => ui::info(&format!("Skipped {}", dest.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str, description: &str, user_invocable: bool) -> SkillSummary {
        SkillSummary {
            name: name.to_string(),
            path: PathBuf::from(format!("/skills/{name}")),
            description: description.to_string(),
            user_invocable,
            allowed_tools: None,
        }
    }

    #[test]
    fn table_lists_every_skill() {
        let skills = vec![
            skill("commit-linter", "Lints commit messages", true),
            skill("pdf-tools", "", false),
        ];
        let rendered = skills_table(&skills).to_string();
        assert!(rendered.contains("commit-linter"));
        assert!(rendered.contains("Lints commit messages"));
        assert!(rendered.contains("(no description)"));
        assert!(rendered.contains("Invocable"));
    }
}
