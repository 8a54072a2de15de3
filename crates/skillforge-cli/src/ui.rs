//! Terminal output helpers: status lines, spinners, skill previews and
//! error reporting.

use std::io;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use termimad::MadSkin;
use termimad::crossterm::style::Color;

use skillforge_core::rate_limit::rate_limit_notice;
use skillforge_core::validator::split_frontmatter;
use skillforge_types::llm::LlmError;

pub fn success(msg: &str) {
    println!("  {} {}", style("✓").green().bold(), msg);
}

pub fn warn(msg: &str) {
    println!("  {} {}", style("!").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    println!("  {}", style(msg).dim());
}

pub fn heading(title: &str) {
    println!();
    println!("  {}", style(title).cyan().bold());
    println!();
}

/// Start a steady-ticking spinner with `label`.
pub fn spinner(label: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(label.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn skin() -> MadSkin {
    let mut skin = MadSkin::default_dark();
    skin.inline_code.set_fg(Color::Yellow);
    skin.headers[0].set_fg(Color::Cyan);
    skin.headers[1].set_fg(Color::Cyan);
    skin
}

/// Print a SKILL.md: frontmatter verbatim, body rendered as markdown.
pub fn render_skill(content: &str) {
    println!();
    println!("  {}", style("─".repeat(60)).dim());
    match split_frontmatter(content) {
        Ok((yaml, body)) => {
            println!("  {}", style("---").dim());
            for line in yaml.lines() {
                println!("  {}", style(line).yellow());
            }
            println!("  {}", style("---").dim());
            skin().print_text(body);
        }
        Err(_) => skin().print_text(content),
    }
    println!("  {}", style("─".repeat(60)).dim());
    println!();
}

pub fn print_validation_errors(errors: &[String]) {
    println!();
    println!("  {} Validation failed:", style("✗").red().bold());
    for error in errors {
        println!("    {} {}", style("-").red(), error);
    }
    println!();
}

/// The provider error somewhere in `err`'s chain, if any.
pub fn llm_error(err: &anyhow::Error) -> Option<&LlmError> {
    err.chain().find_map(|cause| cause.downcast_ref::<LlmError>())
}

/// Whether `err` was caused by the user interrupting a prompt.
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::Interrupted)
    })
}

pub fn print_rate_limit_notice(err: &anyhow::Error) {
    if let Some(LlmError::RateLimited(info)) = llm_error(err) {
        eprintln!();
        for line in rate_limit_notice(info).lines() {
            eprintln!("  {}", style(line).yellow());
        }
        eprintln!();
    }
}

/// The error chain joined with `: `, skipping causes already quoted by
/// an outer message.
pub fn error_message(err: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if message.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}

/// Report a failed command: rate-limit notice if relevant, then the chain.
pub fn print_error(err: &anyhow::Error) {
    print_rate_limit_notice(err);
    eprintln!("{} {}", style("Error:").red().bold(), error_message(err));
}

pub fn print_help() {
    let text = "\
# Skillforge

Generate agent skills (a `SKILL.md` with YAML frontmatter and markdown \
instructions) by answering a few questions.

## Menu

- **Generate a new skill** - describe what you want; the model asks up to \
`[questions] max_questions` clarifying questions, then writes the skill.
- **Browse personal skills** - list installed skills and copy one into this project.
- **Import skills into projects** - copy skills into projects under your configured roots.
- **Change LLM provider** - switch between the providers in `skillforge.toml`.

## Tips

- Press **Enter** on a question to skip it; best practices fill the gap.
- Press **Ctrl-C** to abort the current run.
- Run `skillforge validate path/to/SKILL.md` to check an existing skill.
";
    skin().print_text(text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillforge_types::llm::RateLimitInfo;

    #[test]
    fn interrupted_prompt_is_detected_through_context() {
        let err = anyhow::Error::new(io::Error::new(io::ErrorKind::Interrupted, "read interrupted"))
            .context("prompt failed");
        assert!(is_interrupted(&err));
        assert!(!is_interrupted(&anyhow::anyhow!("boom")));
    }

    #[test]
    fn error_message_skips_repeated_causes() {
        let err = anyhow::Error::new(io::Error::other("disk full")).context("Failed to write SKILL.md");
        assert_eq!(error_message(&err), "Failed to write SKILL.md: disk full");

        let err = anyhow::Error::new(io::Error::other("timeout")).context("request failed: timeout");
        assert_eq!(error_message(&err), "request failed: timeout");
    }

    #[test]
    fn llm_error_found_in_chain() {
        let err = anyhow::Error::new(LlmError::RateLimited(RateLimitInfo {
            raw: "429 RESOURCE_EXHAUSTED".to_string(),
            ..Default::default()
        }))
        .context("generation failed");
        assert!(matches!(llm_error(&err), Some(LlmError::RateLimited(_))));
        assert!(llm_error(&anyhow::anyhow!("plain")).is_none());
    }
}
