//! `skillforge projects`: copy skills into projects found under configured
//! root directories, and manage those roots and the target folders.

use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use skillforge_infra::config::{save_project_roots, save_skill_targets};
use skillforge_infra::publish::expand_home;
use skillforge_infra::skill_store::{ImportOutcome, discover_projects, discover_skills, import_skill};
use skillforge_types::config::SkillTargetsConfig;

use crate::cli::browse::{confirm_overwrite, report_import};
use crate::state::AppState;
use crate::ui;

pub async fn run(state: &mut AppState) -> Result<()> {
    loop {
        render_home(state);

        let actions = [
            "Import a skill into a project",
            "Add a root directory",
            "Remove root directories",
            "Change skill target folders",
            "Back",
        ];
        let choice = Select::new()
            .with_prompt("Choose an action")
            .items(&actions)
            .default(0)
            .interact()?;

        match choice {
            0 => import_flow(state)?,
            1 => add_root(state).await?,
            2 => remove_roots(state).await?,
            3 => change_targets(state).await?,
            _ => return Ok(()),
        }
    }
}

fn render_home(state: &AppState) {
    ui::heading("Project Importer");
    let roots = state.config.projects.normalized_roots();
    if roots.is_empty() {
        ui::info("No root directories configured yet.");
    } else {
        println!("  {}", style("Roots:").bold());
        for root in &roots {
            println!("    {} {}", style("■").green(), root);
        }
    }
    let targets = state.config.skill_targets.normalized();
    println!(
        "  {} {}",
        style("Targets:").bold(),
        targets.selected.join(", ")
    );
    println!();
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

fn import_flow(state: &AppState) -> Result<()> {
    let roots = state.config.projects.normalized_roots();
    if roots.is_empty() {
        ui::warn("Add a root directory first.");
        return Ok(());
    }

    let Some(project) = select_project(&roots)? else {
        return Ok(());
    };
    let Some(source) = pick_skill_source(state)? else {
        return Ok(());
    };

    let skills = discover_skills(&source)?;
    if skills.is_empty() {
        ui::warn(&format!("No skills found in {}", source.display()));
        return Ok(());
    }

    let mut items: Vec<String> = skills.iter().map(|s| s.display()).collect();
    items.push("Back".to_string());
    let selection = Select::new()
        .with_prompt("Select a skill to import")
        .items(&items)
        .default(0)
        .interact()?;
    let Some(skill) = skills.get(selection) else {
        return Ok(());
    };

    let targets = state.config.skill_targets.normalized().selected;
    let mut imported = 0;
    for target in &targets {
        let outcome = import_skill(skill, &project.join(target), confirm_overwrite)?;
        if matches!(outcome, ImportOutcome::Imported(_)) {
            imported += 1;
        }
        report_import(outcome);
    }

    if imported == 0 {
        ui::info("Nothing was imported.");
    }
    println!();
    Ok(())
}

fn select_project(roots: &[String]) -> Result<Option<PathBuf>> {
    let root = if roots.len() == 1 {
        &roots[0]
    } else {
        let mut items: Vec<&str> = roots.iter().map(String::as_str).collect();
        items.push("Back");
        let choice = Select::new()
            .with_prompt("Select a root")
            .items(&items)
            .default(0)
            .interact()?;
        match roots.get(choice) {
            Some(root) => root,
            None => return Ok(None),
        }
    };

    let root_path = expand_home(root);
    let projects = discover_projects(&root_path)?;
    if projects.is_empty() {
        ui::warn(&format!("No projects found under {}", root_path.display()));
        return Ok(None);
    }

    let mut items: Vec<String> = projects.iter().map(|p| folder_label(p)).collect();
    items.push("Back".to_string());
    let choice = Select::new()
        .with_prompt("Select a project")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(projects.get(choice).cloned())
}

fn pick_skill_source(state: &AppState) -> Result<Option<PathBuf>> {
    let output = &state.config.output;
    let items = [
        format!("Personal skills ({})", output.personal_path),
        format!("This project's skills ({})", output.project_path),
        "Custom path...".to_string(),
        "Back".to_string(),
    ];
    let choice = Select::new()
        .with_prompt("Select skill source")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(match choice {
        0 => Some(expand_home(&output.personal_path)),
        1 => Some(PathBuf::from(&output.project_path)),
        2 => Some(prompt_directory(
            "Skills directory (contains skill folders with SKILL.md)",
        )?),
        _ => None,
    })
}

fn prompt_directory(prompt: &str) -> Result<PathBuf> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|value: &String| -> Result<(), String> {
            let path = expand_home(value);
            if path.is_dir() {
                Ok(())
            } else {
                Err(format!("{} is not a directory", path.display()))
            }
        })
        .interact_text()?;
    Ok(expand_home(&input))
}

fn folder_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

async fn add_root(state: &mut AppState) -> Result<()> {
    if let Ok(cwd) = std::env::current_dir() {
        ui::info(&format!("Current directory: {}", cwd.display()));
    }
    let path = prompt_directory("Root directory (projects are its direct subfolders)")?;

    let projects = discover_projects(&path)?;
    if projects.is_empty() {
        ui::warn(&format!("No projects found under {}", path.display()));
        return Ok(());
    }
    for project in &projects {
        println!("    {} {}", style("■").green(), folder_label(project));
    }

    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Add root {} with {} project{}?",
            path.display(),
            projects.len(),
            if projects.len() == 1 { "" } else { "s" }
        ))
        .default(true)
        .interact()?;
    if !confirmed {
        return Ok(());
    }

    let roots = with_root(&state.config.projects.normalized_roots(), &path.display().to_string());
    save_project_roots(&state.config_path, &roots).await?;
    state.reload_config().await?;
    ui::success(&format!("Added {}", path.display()));
    Ok(())
}

async fn remove_roots(state: &mut AppState) -> Result<()> {
    let roots = state.config.projects.normalized_roots();
    if roots.is_empty() {
        ui::warn("No roots to remove.");
        return Ok(());
    }

    let chosen = MultiSelect::new()
        .with_prompt("Select roots to remove (space toggles, enter confirms)")
        .items(&roots)
        .interact()?;
    if chosen.is_empty() {
        return Ok(());
    }

    let kept: Vec<String> = roots
        .iter()
        .enumerate()
        .filter(|(i, _)| !chosen.contains(i))
        .map(|(_, r)| r.clone())
        .collect();
    save_project_roots(&state.config_path, &kept).await?;
    state.reload_config().await?;
    ui::success(&format!("Removed {} root(s)", chosen.len()));
    Ok(())
}

async fn change_targets(state: &mut AppState) -> Result<()> {
    let current = state.config.skill_targets.normalized();
    let defaults: Vec<bool> = current
        .options
        .iter()
        .map(|o| current.selected.contains(o))
        .collect();

    let chosen = MultiSelect::new()
        .with_prompt("Target folders, relative to the project root (space toggles)")
        .items(&current.options)
        .defaults(&defaults)
        .interact()?;
    let chosen: Vec<String> = chosen.into_iter().map(|i| current.options[i].clone()).collect();

    let add_custom = Confirm::new()
        .with_prompt("Add a custom target folder?")
        .default(false)
        .interact()?;
    let custom = if add_custom {
        let value: String = Input::new()
            .with_prompt("Relative path (e.g. .codex/skills or skills)")
            .interact_text()?;
        Some(value)
    } else {
        None
    };

    let Some(updated) = apply_target_selection(&current, chosen, custom) else {
        ui::warn("No targets selected; keeping the previous selection.");
        return Ok(());
    };

    save_skill_targets(&state.config_path, &updated).await?;
    state.reload_config().await?;
    ui::success(&format!("Targets: {}", updated.selected.join(", ")));
    Ok(())
}

/// `roots` plus `root`, unless already present.
fn with_root(roots: &[String], root: &str) -> Vec<String> {
    let mut out = roots.to_vec();
    if !out.iter().any(|r| r == root) {
        out.push(root.to_string());
    }
    out
}

/// New target config from a selection; `None` when nothing is selected.
///
/// The first selected folder becomes the default.
fn apply_target_selection(
    current: &SkillTargetsConfig,
    mut chosen: Vec<String>,
    custom: Option<String>,
) -> Option<SkillTargetsConfig> {
    let mut options = current.options.clone();
    if let Some(custom) = custom.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
        if !options.contains(&custom) {
            options.insert(0, custom.clone());
        }
        if !chosen.contains(&custom) {
            chosen.push(custom);
        }
    }
    let default = chosen.first()?.clone();
    Some(
        SkillTargetsConfig {
            default,
            options,
            selected: chosen,
        }
        .normalized(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_root_skips_duplicates() {
        let roots = vec!["/src".to_string()];
        assert_eq!(with_root(&roots, "/src"), vec!["/src"]);
        assert_eq!(with_root(&roots, "/work"), vec!["/src", "/work"]);
    }

    #[test]
    fn empty_selection_keeps_previous() {
        let current = SkillTargetsConfig::default().normalized();
        assert!(apply_target_selection(&current, vec![], None).is_none());
        assert!(apply_target_selection(&current, vec![], Some("  ".to_string())).is_none());
    }

    #[test]
    fn first_selected_becomes_default() {
        let current = SkillTargetsConfig::default().normalized();
        let updated = apply_target_selection(
            &current,
            vec![".codex/skills".to_string(), ".claude/skills".to_string()],
            None,
        )
        .unwrap();
        assert_eq!(updated.default, ".codex/skills");
        assert_eq!(updated.selected, vec![".codex/skills", ".claude/skills"]);
    }

    #[test]
    fn custom_target_is_added_and_selected() {
        let current = SkillTargetsConfig::default().normalized();
        let updated =
            apply_target_selection(&current, vec![], Some(" skills ".to_string())).unwrap();
        assert_eq!(updated.default, "skills");
        assert_eq!(updated.selected, vec!["skills"]);
        assert_eq!(updated.options[0], "skills");
    }

    #[test]
    fn folder_label_uses_last_component() {
        assert_eq!(folder_label(Path::new("/home/me/code/web")), "web");
    }
}
