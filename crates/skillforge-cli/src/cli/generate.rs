//! `skillforge generate`: the guided skill generation flow.
//!
//! Setup questions (output location, hooks, intent) come first and are
//! remembered in the preferences file. The dialogue itself runs through
//! [`DialogueController`]; nothing is written until a skill has been
//! generated and accepted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use skillforge_core::dialogue::{DialogueController, DialogueOutcome, GeneratedSkill};
use skillforge_core::llm::generator::{GenerationSettings, TextGenerator};
use skillforge_core::session::ConversationSession;
use skillforge_infra::llm::create_provider;
use skillforge_infra::publish::{skill_dir, skills_root, write_skill_file, write_supporting_files};
use skillforge_infra::run_log::RunLog;
use skillforge_infra::skill_store::summarize;
use skillforge_types::config::OutputConfig;
use skillforge_types::skill::{OutputLocation, SKILL_FILE};

use crate::prompter::TerminalPrompter;
use crate::state::AppState;
use crate::ui;

/// Answers supplied on the command line; `None` means ask.
#[derive(Debug, Default)]
pub struct GenerateArgs {
    pub intent: Option<String>,
    pub output: Option<OutputLocation>,
    pub hooks: Option<bool>,
}

pub async fn run(state: &mut AppState, args: GenerateArgs) -> Result<()> {
    // Resolve everything that can fail on configuration before asking anything.
    let provider_config = state.provider_config()?;
    let validator = state.validator()?;

    ui::heading("Skill Generator");
    println!(
        "  Using {} ({})",
        style(provider_config.kind.display_name()).cyan(),
        style(&provider_config.model).dim()
    );
    println!();

    let location = match args.output {
        Some(location) => location,
        None => choose_location(&state.default_location(), &state.config.output)?,
    };
    state.prefs.set_output_location(&location);

    let wants_hooks = match args.hooks {
        Some(hooks) => hooks,
        None => Confirm::new()
            .with_prompt("Should this skill use hooks (commands run on tool events)?")
            .default(state.prefs.wants_hooks().unwrap_or(false))
            .interact()?,
    };
    state.prefs.set_wants_hooks(wants_hooks);

    let intent = match args.intent.filter(|i| !i.trim().is_empty()) {
        Some(intent) => intent,
        None => Input::<String>::new()
            .with_prompt("What should this skill do?")
            .validate_with(|input: &String| -> Result<(), &str> {
                if input.trim().is_empty() {
                    Err("Please describe the skill")
                } else {
                    Ok(())
                }
            })
            .interact_text()?,
    };

    let run_log = Arc::new(RunLog::create(&state.log_dir())?);
    let provider = create_provider(&provider_config)?;
    let generator = TextGenerator::new(provider, GenerationSettings::from_config(&provider_config));
    let session = ConversationSession::new(
        generator,
        state.config.questions.max_questions,
        Arc::clone(&run_log),
    );
    let mut controller = DialogueController::new(session, &validator, TerminalPrompter::new());

    tracing::info!(
        provider = %provider_config.kind,
        model = %provider_config.model,
        location = %location,
        wants_hooks,
        "Starting generation"
    );

    let result = tokio::select! {
        result = controller.run(intent.trim(), wants_hooks) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    // Clears the spinner if the interrupt landed mid-request.
    drop(controller);

    let outcome = match result {
        None => {
            println!();
            ui::info("Generation cancelled.");
            return Ok(());
        }
        Some(Ok(outcome)) => outcome,
        Some(Err(e)) if e.is_interrupted() => {
            println!();
            ui::info("Generation cancelled.");
            return Ok(());
        }
        Some(Err(e)) => {
            ui::info(&format!("Run log: {}", run_log.path().display()));
            return Err(e.into());
        }
    };

    match outcome {
        DialogueOutcome::Generated(skill) => {
            let log_path = run_log.finalize(&skill.name);
            publish(&skill, &location, &state.config.output, &log_path)
        }
        DialogueOutcome::Cancelled => {
            ui::info("Generation cancelled. Nothing was written.");
            Ok(())
        }
        DialogueOutcome::Discarded { errors } => {
            ui::warn(&format!(
                "Skill discarded ({} validation error{}). Nothing was written.",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            Ok(())
        }
    }
}

/// Ask where to save, defaulting to the remembered location.
fn choose_location(default: &OutputLocation, output: &OutputConfig) -> Result<OutputLocation> {
    let items = [
        format!("Personal ({})", output.personal_path),
        format!("Project ({})", output.project_path),
        "Custom path...".to_string(),
    ];
    let default_index = match default {
        OutputLocation::Personal => 0,
        OutputLocation::Project => 1,
        OutputLocation::Custom(_) => 2,
    };

    let selection = Select::new()
        .with_prompt("Where should the skill be saved?")
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(match selection {
        0 => OutputLocation::Personal,
        1 => OutputLocation::Project,
        _ => {
            let mut input = Input::<String>::new().with_prompt("Directory for the skill");
            if let OutputLocation::Custom(path) = default {
                input = input.default(path.display().to_string());
            }
            OutputLocation::Custom(PathBuf::from(input.interact_text()?.trim()))
        }
    })
}

fn publish(
    skill: &GeneratedSkill,
    location: &OutputLocation,
    output: &OutputConfig,
    log_path: &Path,
) -> Result<()> {
    let dir = skill_dir(&skills_root(location, output), &skill.name)?;

    if dir.join(SKILL_FILE).exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", dir.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            ui::info("Kept the existing skill. Nothing was written.");
            return Ok(());
        }
    }

    ui::render_skill(&skill.content);

    let path = write_skill_file(&dir, &skill.content)?;
    ui::success(&format!(
        "Skill '{}' saved to {}",
        style(&skill.name).cyan(),
        path.display()
    ));
    if skill.forced() {
        ui::warn("Saved despite validation errors; review it before use.");
    }
    ui::info(&format!("Run log: {}", log_path.display()));

    let supporting = Confirm::new()
        .with_prompt("Create README.md and examples/examples.md as well?")
        .default(false)
        .interact()?;
    if supporting {
        let files = write_supporting_files(&dir, &summarize(&dir, &skill.content))
            .context("Failed to create supporting files")?;
        for file in files {
            ui::success(&format!("Created {}", file.display()));
        }
    }

    println!();
    Ok(())
}
