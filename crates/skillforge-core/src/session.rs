//! ConversationSession -- the three-phase question/answer protocol.
//!
//! OPEN asks the first round of questions, FOLLOWUP records answers and asks
//! whether more clarification is needed, GENERATE produces the SKILL.md
//! text. The session owns the history, the question budget and the set of
//! skipped answers for one run; it is never persisted.

use serde_json::json;
use tracing::{debug, info, warn};

use skillforge_types::conversation::{ConversationHistory, ConversationTurn};
use skillforge_types::llm::LlmError;

use crate::events::EventSink;
use crate::llm::generator::TextGenerator;
use crate::prompt::{
    READY_SENTINEL, SKIPPED_MARKER, build_followup_prompt, build_generate_prompt,
    build_open_prompt, strip_code_fences,
};

/// Result of a FOLLOWUP round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// The provider wants more detail; the text holds the new questions.
    MoreQuestions(String),
    /// Enough information has been gathered (or the budget is spent).
    Ready,
}

impl FollowUp {
    /// Interpret a provider reply. The sentinel must be the whole reply.
    fn from_reply(reply: &str) -> Self {
        let reply = reply.trim();
        if reply == READY_SENTINEL {
            FollowUp::Ready
        } else {
            FollowUp::MoreQuestions(reply.to_string())
        }
    }
}

/// A provider failure, tagged with the phase it happened in.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to generate questions: {0}")]
    Open(#[source] LlmError),

    #[error("failed to generate follow-up questions: {0}")]
    FollowUp(#[source] LlmError),

    #[error("failed to generate skill: {0}")]
    Generate(#[source] LlmError),
}

impl SessionError {
    /// The underlying provider error, unmodified.
    pub fn llm_error(&self) -> &LlmError {
        match self {
            SessionError::Open(e) | SessionError::FollowUp(e) | SessionError::Generate(e) => e,
        }
    }
}

fn error_payload(err: &LlmError) -> serde_json::Value {
    json!({
        "error": err.to_string(),
        "error_type": err.kind(),
        "rate_limited": err.is_rate_limit(),
    })
}

/// One generation run's conversation state.
pub struct ConversationSession<L: EventSink = ()> {
    generator: TextGenerator,
    events: L,
    history: ConversationHistory,
    questions_asked: u32,
    max_questions: u32,
    wants_hooks: bool,
    /// 1-based ordinals of blank answers, in the order they were given.
    skipped: Vec<usize>,
    answers_recorded: usize,
}

impl<L: EventSink> ConversationSession<L> {
    pub fn new(generator: TextGenerator, max_questions: u32, events: L) -> Self {
        Self {
            generator,
            events,
            history: ConversationHistory::new(),
            questions_asked: 0,
            max_questions,
            wants_hooks: false,
            skipped: Vec::new(),
            answers_recorded: 0,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    pub fn questions_remaining(&self) -> u32 {
        self.max_questions.saturating_sub(self.questions_asked)
    }

    pub fn wants_hooks(&self) -> bool {
        self.wants_hooks
    }

    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    /// OPEN: ask the first round of questions for `intent`.
    ///
    /// Starts a fresh conversation; any earlier state is discarded.
    pub async fn open(&mut self, intent: &str, wants_hooks: bool) -> Result<String, SessionError> {
        self.history = ConversationHistory::new();
        self.questions_asked = 0;
        self.skipped.clear();
        self.answers_recorded = 0;
        self.wants_hooks = wants_hooks;

        let prompt = build_open_prompt(intent, wants_hooks, self.max_questions);
        info!(provider = self.generator.provider_name(), "starting conversation");
        self.events.record(
            "start_conversation",
            json!({
                "user_intent": intent,
                "wants_hooks": wants_hooks,
                "prompt": prompt,
            }),
        );

        let questions = match self.generator.generate_text(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to generate questions");
                self.events.record("error_generating_questions", error_payload(&e));
                return Err(SessionError::Open(e));
            }
        };

        debug!(chars = questions.len(), "received questions");
        self.events.record(
            "questions_generated",
            json!({
                "questions": questions,
                "response_length": questions.len(),
            }),
        );

        self.history
            .push(ConversationTurn::user(format!("User intent: {intent}")));
        self.history.push(ConversationTurn::assistant(questions.clone()));
        Ok(questions)
    }

    /// FOLLOWUP: record new answers and ask whether more detail is needed.
    ///
    /// `answers` is every answer collected so far in the run; only those not
    /// yet recorded are appended to the history. Once `questions_asked`
    /// reaches the budget this returns [`FollowUp::Ready`] without calling
    /// the provider.
    pub async fn follow_up(
        &mut self,
        answers: &[String],
        questions_asked: u32,
    ) -> Result<FollowUp, SessionError> {
        self.questions_asked = questions_asked.min(self.max_questions);
        self.record_answers(answers);

        if self.questions_remaining() == 0 {
            debug!(
                questions_asked = self.questions_asked,
                "question budget exhausted; skipping follow-up"
            );
            self.events.record(
                "question_budget_exhausted",
                json!({ "questions_asked": self.questions_asked }),
            );
            return Ok(FollowUp::Ready);
        }

        let prompt = build_followup_prompt(
            &self.history.render(),
            self.questions_remaining(),
            self.max_questions,
            &self.skipped,
        );
        self.events.record(
            "followup_requested",
            json!({
                "questions_asked": self.questions_asked,
                "skipped": self.skipped,
                "prompt": prompt,
            }),
        );

        let reply = match self.generator.generate_text(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to generate follow-up questions");
                self.events.record("error_generating_followup", error_payload(&e));
                return Err(SessionError::FollowUp(e));
            }
        };

        let outcome = FollowUp::from_reply(&reply);
        match &outcome {
            FollowUp::Ready => {
                self.events.record("ready_to_generate", json!({}));
            }
            FollowUp::MoreQuestions(questions) => {
                self.events
                    .record("followup_generated", json!({ "questions": questions }));
                self.history
                    .push(ConversationTurn::assistant(questions.clone()));
            }
        }
        Ok(outcome)
    }

    /// GENERATE: produce the SKILL.md text from the whole conversation.
    pub async fn generate(&mut self) -> Result<String, SessionError> {
        let context = self.history.render();
        let prompt = build_generate_prompt(&context, self.wants_hooks);

        info!(turns = self.history.len(), "generating skill");
        self.events.record(
            "generate_skill_start",
            json!({
                "conversation_length": self.history.len(),
                "context_length": context.len(),
                "prompt": prompt,
            }),
        );

        let raw = match self.generator.generate_text(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to generate skill");
                self.events.record("error_generating_skill", error_payload(&e));
                return Err(SessionError::Generate(e));
            }
        };

        let content = strip_code_fences(&raw);
        self.events.record(
            "skill_generated",
            json!({
                "content_length": content.len(),
                "fences_stripped": content.len() != raw.len(),
                "full_content": content,
            }),
        );
        Ok(content)
    }

    fn record_answers(&mut self, answers: &[String]) {
        for (index, answer) in answers.iter().enumerate().skip(self.answers_recorded) {
            let answer = answer.trim();
            if answer.is_empty() {
                self.skipped.push(index + 1);
                self.history.push(ConversationTurn::user(SKIPPED_MARKER));
            } else {
                self.history
                    .push(ConversationTurn::user(format!("Answer: {answer}")));
            }
        }
        self.answers_recorded = self.answers_recorded.max(answers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::tests::MemorySink;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::generator::tests::{ScriptedProvider, settings};
    use skillforge_types::conversation::TurnRole;
    use std::sync::Arc;

    fn session(
        responses: Vec<Result<String, LlmError>>,
        max_questions: u32,
    ) -> (ConversationSession<Arc<MemorySink>>, ScriptedProvider, Arc<MemorySink>) {
        let provider = ScriptedProvider::new(responses);
        let generator = TextGenerator::new(BoxLlmProvider::new(provider.clone()), settings(1000, None));
        let sink = Arc::new(MemorySink::default());
        (
            ConversationSession::new(generator, max_questions, Arc::clone(&sink)),
            provider,
            sink,
        )
    }

    fn answers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_open_records_intent_and_questions() {
        let (mut s, provider, sink) = session(vec![Ok("1. Which linter?\n2. Which repo?".into())], 5);

        let questions = s.open("lint commits", true).await.unwrap();
        assert_eq!(questions, "1. Which linter?\n2. Which repo?");

        let turns = s.history().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], ConversationTurn::user("User intent: lint commits"));
        assert_eq!(turns[1].role, TurnRole::Assistant);
        assert!(s.wants_hooks());

        assert!(provider.prompts()[0].contains("PreToolUse"));
        assert_eq!(sink.names(), vec!["start_conversation", "questions_generated"]);
    }

    #[tokio::test]
    async fn test_followup_ready_sentinel_maps_to_ready() {
        let (mut s, _, _) = session(
            vec![Ok("1. Q?".into()), Ok("  READY_TO_GENERATE \n".into())],
            5,
        );
        s.open("x", false).await.unwrap();
        let next = s.follow_up(&answers(&["yes"]), 1).await.unwrap();
        assert_eq!(next, FollowUp::Ready);
        assert_eq!(s.history().len(), 3);
    }

    #[tokio::test]
    async fn test_sentinel_inside_text_is_not_ready() {
        let (mut s, _, _) = session(
            vec![Ok("1. Q?".into()), Ok("1. One more? Otherwise READY_TO_GENERATE".into())],
            5,
        );
        s.open("x", false).await.unwrap();
        let next = s.follow_up(&answers(&["a"]), 1).await.unwrap();
        assert!(matches!(next, FollowUp::MoreQuestions(_)));
        assert_eq!(s.history().turns().last().unwrap().role, TurnRole::Assistant);
    }

    #[tokio::test]
    async fn test_exhausted_budget_skips_provider() {
        let (mut s, provider, _) = session(vec![Ok("1. A?\n2. B?".into())], 2);
        s.open("x", false).await.unwrap();
        assert_eq!(provider.call_count(), 1);

        let next = s.follow_up(&answers(&["a", ""]), 2).await.unwrap();
        assert_eq!(next, FollowUp::Ready);
        assert_eq!(provider.call_count(), 1);
        // Answers are still recorded for the final generation.
        assert_eq!(s.history().len(), 4);
        assert_eq!(s.skipped(), &[2]);
    }

    #[tokio::test]
    async fn test_questions_asked_never_exceeds_budget() {
        let (mut s, provider, _) = session(vec![Ok("1. A?".into())], 3);
        s.open("x", false).await.unwrap();
        let next = s.follow_up(&answers(&["a", "b", "c", "d"]), 7).await.unwrap();
        assert_eq!(next, FollowUp::Ready);
        assert_eq!(s.questions_asked(), 3);
        assert_eq!(s.questions_remaining(), 0);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_skip_instruction_is_sticky() {
        let (mut s, provider, _) = session(
            vec![
                Ok("1. A?\n2. B?".into()),
                Ok("1. C?".into()),
                Ok("1. D?".into()),
            ],
            5,
        );
        s.open("x", false).await.unwrap();

        s.follow_up(&answers(&["a", "   "]), 2).await.unwrap();
        s.follow_up(&answers(&["a", "   ", "c"]), 3).await.unwrap();

        let prompts = provider.prompts();
        assert!(!prompts[0].contains("skipped some questions"));
        assert!(prompts[1].contains("skipped some questions (answers 2)"));
        // Round two had no new skip, but the instruction persists.
        assert!(prompts[2].contains("skipped some questions (answers 2)"));
        assert!(prompts[2].contains("You have 2 questions remaining (maximum 5 total)."));
        assert!(prompts[1].contains("USER: [skipped]"));
    }

    #[tokio::test]
    async fn test_no_skip_instruction_without_skips() {
        let (mut s, provider, _) = session(vec![Ok("1. A?".into()), Ok("1. B?".into())], 5);
        s.open("x", false).await.unwrap();
        s.follow_up(&answers(&["a"]), 1).await.unwrap();
        assert!(!provider.prompts()[1].contains("skipped some questions"));
        assert!(s.skipped().is_empty());
    }

    #[tokio::test]
    async fn test_answers_are_recorded_once() {
        let (mut s, _, _) = session(
            vec![Ok("1. A?".into()), Ok("1. B?".into()), Ok("READY_TO_GENERATE".into())],
            5,
        );
        s.open("x", false).await.unwrap();
        s.follow_up(&answers(&["first"]), 1).await.unwrap();
        s.follow_up(&answers(&["first", "second"]), 2).await.unwrap();

        let user_answers: Vec<_> = s
            .history()
            .turns()
            .iter()
            .filter(|t| t.content.starts_with("Answer: "))
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(user_answers, vec!["Answer: first", "Answer: second"]);
    }

    #[tokio::test]
    async fn test_generate_strips_fences_and_uses_history() {
        let (mut s, provider, sink) = session(
            vec![
                Ok("1. A?".into()),
                Ok("READY_TO_GENERATE".into()),
                Ok("```markdown\n---\nname: x\n---\n# X\n```".into()),
            ],
            5,
        );
        s.open("lint commits", false).await.unwrap();
        s.follow_up(&answers(&["commitlint"]), 1).await.unwrap();
        let content = s.generate().await.unwrap();

        assert_eq!(content, "---\nname: x\n---\n# X");
        let prompt = &provider.prompts()[2];
        assert!(prompt.contains("USER: User intent: lint commits"));
        assert!(prompt.contains("USER: Answer: commitlint"));
        assert!(sink.names().contains(&"skill_generated".to_string()));
    }

    #[tokio::test]
    async fn test_provider_error_is_logged_and_propagated() {
        let (mut s, _, sink) = session(vec![Err(LlmError::AuthenticationFailed)], 5);
        let err = s.open("x", false).await.unwrap_err();
        assert!(matches!(err, SessionError::Open(LlmError::AuthenticationFailed)));
        assert!(matches!(err.llm_error(), LlmError::AuthenticationFailed));
        assert_eq!(
            sink.names(),
            vec!["start_conversation", "error_generating_questions"]
        );
        assert!(s.history().is_empty());
    }

    #[tokio::test]
    async fn test_generate_error_is_tagged() {
        let (mut s, _, sink) = session(
            vec![Ok("1. A?".into()), Err(LlmError::EmptyResponse)],
            5,
        );
        s.open("x", false).await.unwrap();
        let err = s.generate().await.unwrap_err();
        assert!(matches!(err, SessionError::Generate(LlmError::EmptyResponse)));
        assert!(sink.names().contains(&"error_generating_skill".to_string()));
    }
}
