//! Terminal implementation of the dialogue [`Prompter`].

use std::io;

use console::style;
use dialoguer::{Confirm, Input};
use indicatif::ProgressBar;

use skillforge_core::dialogue::Prompter;

use crate::ui;

/// Prompts through dialoguer and shows a spinner while the model works.
#[derive(Default)]
pub struct TerminalPrompter {
    spinner: Option<ProgressBar>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Unwrap dialoguer's error so `ErrorKind::Interrupted` survives.
pub fn into_io(err: dialoguer::Error) -> io::Error {
    match err {
        dialoguer::Error::IO(e) => e,
    }
}

impl Prompter for TerminalPrompter {
    fn working(&mut self, label: &str) {
        self.idle();
        self.spinner = Some(ui::spinner(label));
    }

    fn idle(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn show_questions(&mut self, questions: &[String], remaining: u32) {
        println!();
        println!(
            "  {} {} question{} ({} left in this session)",
            style("?").cyan().bold(),
            questions.len(),
            if questions.len() == 1 { "" } else { "s" },
            remaining
        );
        println!(
            "  {}",
            style("Press Enter to skip a question and let best practices decide.").dim()
        );
    }

    fn ask(&mut self, ordinal: u32, question: &str) -> io::Result<String> {
        println!();
        println!("  {} {}", style(format!("Q{ordinal}.")).cyan().bold(), question);
        Input::<String>::new()
            .with_prompt("  Answer")
            .allow_empty(true)
            .interact_text()
            .map(|answer| answer.trim().to_string())
            .map_err(into_io)
    }

    fn confirm_generation(&mut self) -> io::Result<bool> {
        println!();
        Confirm::new()
            .with_prompt("  Generate the skill now?")
            .default(true)
            .interact()
            .map_err(into_io)
    }

    fn confirm_keep_invalid(&mut self, content: &str, errors: &[String]) -> io::Result<bool> {
        ui::render_skill(content);
        ui::print_validation_errors(errors);
        Confirm::new()
            .with_prompt("  Save it anyway?")
            .default(false)
            .interact()
            .map_err(into_io)
    }
}

impl Drop for TerminalPrompter {
    fn drop(&mut self) {
        self.idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_io_keeps_interrupted_kind() {
        let err = dialoguer::Error::IO(io::Error::new(io::ErrorKind::Interrupted, "read interrupted"));
        assert_eq!(into_io(err).kind(), io::ErrorKind::Interrupted);
    }

    #[test]
    fn idle_without_spinner_is_a_no_op() {
        let mut prompter = TerminalPrompter::new();
        prompter.idle();
        assert!(prompter.spinner.is_none());
    }
}
