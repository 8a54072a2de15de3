//! DialogueController -- drives a session through the interactive loop.
//!
//! The controller owns the question budget on the user side: it parses each
//! round of provider questions, truncates the round to the remaining budget,
//! collects answers through a [`Prompter`], and feeds them back into the
//! session until the provider is ready or the budget is spent. After a
//! confirmation gate it generates and validates the skill. Invalid output is
//! never regenerated automatically; the user decides whether to keep it.

use std::io;

use serde_yaml_ng::Mapping;
use tracing::{debug, info};

use skillforge_types::validation::ValidationResult;

use crate::events::EventSink;
use crate::session::{ConversationSession, FollowUp, SessionError};
use crate::validator::SkillValidator;

// ---------------------------------------------------------------------------
// Prompter
// ---------------------------------------------------------------------------

/// User-facing side of the dialogue.
///
/// The CLI implements this with terminal prompts; tests script it. Methods
/// returning `io::Result` may fail with `ErrorKind::Interrupted` when the
/// user aborts.
pub trait Prompter {
    /// A network call is about to start.
    fn working(&mut self, label: &str);

    /// The network call finished (successfully or not).
    fn idle(&mut self);

    /// A new round of questions is about to be asked.
    fn show_questions(&mut self, questions: &[String], remaining: u32);

    /// Ask one question. A blank answer means "skip, use best practices".
    fn ask(&mut self, ordinal: u32, question: &str) -> io::Result<String>;

    /// Gate before the final generation call.
    fn confirm_generation(&mut self) -> io::Result<bool>;

    /// Validation failed; should the skill be kept anyway?
    fn confirm_keep_invalid(&mut self, content: &str, errors: &[String]) -> io::Result<bool>;
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A generated skill ready to be published.
#[derive(Debug, Clone)]
pub struct GeneratedSkill {
    pub name: String,
    pub content: String,
    pub frontmatter: Mapping,
    pub validation: ValidationResult,
}

impl GeneratedSkill {
    /// Whether the user chose to keep it despite validation errors.
    pub fn forced(&self) -> bool {
        !self.validation.is_valid
    }
}

/// How a dialogue run ended.
#[derive(Debug, Clone)]
pub enum DialogueOutcome {
    Generated(GeneratedSkill),
    /// The user declined the generation gate.
    Cancelled,
    /// Validation failed and the user chose not to keep the output.
    Discarded { errors: Vec<String> },
}

#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] io::Error),

    /// The generated frontmatter has no usable `name`; nothing can be saved.
    #[error("generated skill has no 'name' in its frontmatter")]
    MissingName,
}

impl DialogueError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, DialogueError::Prompt(e) if e.kind() == io::ErrorKind::Interrupted)
    }
}

// ---------------------------------------------------------------------------
// Question parsing
// ---------------------------------------------------------------------------

/// Extract numbered questions (`1.` to `9.`) from provider text.
///
/// Numbering is stripped. Text without any numbered line is returned as a
/// single question.
pub fn parse_questions(text: &str) -> Vec<String> {
    let questions: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let mut chars = line.chars();
            match (chars.next(), chars.next()) {
                (Some(d), Some('.')) if ('1'..='9').contains(&d) => {
                    Some(line[2..].trim().to_string())
                }
                _ => None,
            }
        })
        .filter(|q| !q.is_empty())
        .collect();

    if questions.is_empty() && !text.trim().is_empty() {
        return vec![text.trim().to_string()];
    }
    questions
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct DialogueController<'v, P: Prompter, L: EventSink = ()> {
    session: ConversationSession<L>,
    validator: &'v SkillValidator,
    prompter: P,
}

impl<'v, P: Prompter, L: EventSink> DialogueController<'v, P, L> {
    pub fn new(session: ConversationSession<L>, validator: &'v SkillValidator, prompter: P) -> Self {
        Self {
            session,
            validator,
            prompter,
        }
    }

    pub fn session(&self) -> &ConversationSession<L> {
        &self.session
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Run the whole dialogue for one intent.
    pub async fn run(
        &mut self,
        intent: &str,
        wants_hooks: bool,
    ) -> Result<DialogueOutcome, DialogueError> {
        self.prompter.working("Analyzing your request...");
        let opened = self.session.open(intent, wants_hooks).await;
        self.prompter.idle();
        let mut pending = Some(opened?);

        let mut answers: Vec<String> = Vec::new();
        let mut asked: u32 = 0;

        while let Some(text) = pending.take() {
            let remaining = self.session.max_questions().saturating_sub(asked);
            if remaining == 0 {
                break;
            }

            let mut round = parse_questions(&text);
            round.truncate(remaining as usize);
            debug!(round = round.len(), remaining, "asking questions");

            self.prompter.show_questions(&round, remaining);
            for question in &round {
                asked += 1;
                let answer = self.prompter.ask(asked, question)?;
                answers.push(answer);
            }

            self.prompter.working("Thinking about follow-ups...");
            let next = self.session.follow_up(&answers, asked).await;
            self.prompter.idle();
            if let FollowUp::MoreQuestions(questions) = next? {
                pending = Some(questions);
            }
        }

        info!(
            questions_asked = asked,
            skipped = self.session.skipped().len(),
            "question phase finished"
        );

        if !self.prompter.confirm_generation()? {
            return Ok(DialogueOutcome::Cancelled);
        }

        self.prompter.working("Generating your skill...");
        let generated = self.session.generate().await;
        self.prompter.idle();
        let content = generated?;

        let validation = self.validator.validate(&content);
        if !validation.is_valid
            && !self
                .prompter
                .confirm_keep_invalid(&content, &validation.errors)?
        {
            return Ok(DialogueOutcome::Discarded {
                errors: validation.errors,
            });
        }

        let name = self
            .validator
            .skill_name(&content)
            .ok_or(DialogueError::MissingName)?;
        let frontmatter = self.validator.frontmatter(&content).unwrap_or_default();

        Ok(DialogueOutcome::Generated(GeneratedSkill {
            name,
            content,
            frontmatter,
            validation,
        }))
    }
}
