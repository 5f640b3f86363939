//! Session state and the orchestrator that owns it.
//!
//! This module owns:
//!   - the single in-memory session (problem, code draft, transcript, flags)
//!   - the epoch discipline that drops stale async results
//!   - the offline/remote split for tutor replies
//!
//! All mutation goes through `AppState` methods; route handlers never touch
//! the session directly. Every problem replacement advances the epoch, and
//! any in-flight result tagged with an older epoch is discarded on arrival.

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::load_coach_config_from_env;
use crate::domain::{ChatMessage, Difficulty, Problem, ProblemSource, RunReport};
use crate::guidance::{GuidanceClient, GuidanceError};
use crate::intent::{classify, ReplyPools};
use crate::seeds::{default_problem, CUSTOM_STARTER_CODE, DEFAULT_STARTER_CODE};
use crate::simulator;

/// Failures the orchestrator reports to the presentation layer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("message text must not be empty")]
    EmptyMessage,
    #[error("a tutor reply is already pending")]
    ChatBusy,
    #[error("a problem generation request is already pending")]
    GenerationBusy,
    #[error("custom problems need both a title and a description")]
    InvalidCustomProblem,
    #[error("problem generation requires the guidance service, and none is configured")]
    GuidanceUnavailable,
    #[error(transparent)]
    Guidance(#[from] GuidanceError),
}

/// What happened to a chat turn once its reply arrived.
#[derive(Debug)]
pub enum ChatOutcome {
    /// Reply appended to the transcript.
    Replied(ChatMessage),
    /// The problem changed while the reply was in flight; reply dropped.
    Superseded,
}

/// The one tutoring session this process serves.
#[derive(Clone, Debug)]
pub struct Session {
    pub problem: Problem,
    pub code: String,
    pub transcript: Vec<ChatMessage>,
    pub epoch: u64,
    pub awaiting_reply: bool,
    pub generating_problem: bool,
    pub last_run: Option<RunReport>,
}

impl Session {
    fn new(problem: Problem, starter_code: &str) -> Self {
        Self {
            problem,
            code: starter_code.to_string(),
            transcript: Vec::new(),
            epoch: 0,
            awaiting_reply: false,
            generating_problem: false,
            last_run: None,
        }
    }

    /// Wholesale problem swap: resets the code draft, clears the transcript
    /// and the last run report, and advances the epoch so in-flight results
    /// issued against the previous problem are dropped on arrival.
    fn replace_problem(&mut self, problem: Problem, starter_code: &str) {
        self.problem = problem;
        self.code = starter_code.to_string();
        self.transcript.clear();
        self.last_run = None;
        self.awaiting_reply = false;
        self.epoch += 1;
    }
}

/// Context captured under the lock when a chat turn opens, handed to the
/// tutor together with the epoch tag the reply must be applied against.
pub struct ChatTicket {
    pub epoch: u64,
    pub messages: Vec<ChatMessage>,
    pub problem: Problem,
    pub code: String,
}

pub struct AppState {
    session: RwLock<Session>,
    pub guidance: Option<GuidanceClient>,
    replies: ReplyPools,
    pub session_id: String,
}

impl AppState {
    /// Build state from env: load config, install the startup problem, and
    /// enable the guidance client if a base URL is configured.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_coach_config_from_env().unwrap_or_default();
        let mut replies = cfg.replies;
        replies.sanitize();

        let (problem, starter) = match cfg.problem {
            Some(p) => p.into_problem(),
            None => (default_problem(), DEFAULT_STARTER_CODE.to_string()),
        };

        let guidance = GuidanceClient::from_env();
        match &guidance {
            Some(g) => {
                info!(target: "coach_backend", base_url = %g.base_url, "Guidance service enabled.")
            }
            None => info!(
                target: "coach_backend",
                "Guidance service disabled (no GUIDANCE_BASE_URL). Using offline reply pools."
            ),
        }

        let session_id = Uuid::new_v4().to_string();
        info!(
            target: "session",
            %session_id,
            problem = %problem.title,
            source = ?problem.source,
            "Session initialized"
        );

        Self {
            session: RwLock::new(Session::new(problem, &starter)),
            guidance,
            replies,
            session_id,
        }
    }

    /// Read-only copy of the session for the presentation layer.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Store the user's current editor draft.
    #[instrument(level = "debug", skip(self, code), fields(code_len = code.len()))]
    pub async fn edit_code(&self, code: String) {
        let mut s = self.session.write().await;
        s.code = code;
    }

    /// Open a chat turn: validate, append the user message, mark the chat
    /// track pending, and capture the context the tutor needs. The user
    /// message lands in the transcript before anything awaits the reply.
    pub(crate) async fn begin_chat(&self, text: &str) -> Result<ChatTicket, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        let mut s = self.session.write().await;
        if s.awaiting_reply {
            return Err(EngineError::ChatBusy);
        }
        s.transcript.push(ChatMessage::user(text));
        s.awaiting_reply = true;
        debug!(target: "session", epoch = s.epoch, turns = s.transcript.len(), "Chat turn opened");

        Ok(ChatTicket {
            epoch: s.epoch,
            messages: s.transcript.clone(),
            problem: s.problem.clone(),
            code: s.code.clone(),
        })
    }

    /// Resolve the tutor reply for a ticket: remotely when a guidance client
    /// is configured, from the offline pools otherwise.
    async fn resolve_reply(&self, ticket: &ChatTicket) -> ChatMessage {
        match &self.guidance {
            Some(client) => {
                client
                    .request_guidance(&ticket.messages, &ticket.problem, &ticket.code)
                    .await
            }
            None => {
                // The last transcript entry is the user message just appended.
                let utterance = ticket
                    .messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                let intent = classify(utterance);
                debug!(target: "session", ?intent, "Offline reply selected");
                ChatMessage::assistant(self.replies.pick(intent))
            }
        }
    }

    /// Close a chat turn. The reply is appended only if the session is still
    /// on the epoch the ticket was issued against; otherwise it is a stale
    /// result and is dropped without touching the transcript.
    pub(crate) async fn finish_chat(&self, epoch: u64, reply: ChatMessage) -> ChatOutcome {
        let mut s = self.session.write().await;
        if s.epoch != epoch {
            warn!(
                target: "session",
                ticket_epoch = epoch,
                current_epoch = s.epoch,
                "Dropping stale tutor reply"
            );
            return ChatOutcome::Superseded;
        }
        s.transcript.push(reply.clone());
        s.awaiting_reply = false;
        info!(target: "session", epoch = s.epoch, turns = s.transcript.len(), "Chat turn closed");
        ChatOutcome::Replied(reply)
    }

    /// Full chat turn: one user message in, exactly one assistant turn out,
    /// unless the problem was swapped mid-flight.
    #[instrument(level = "info", skip(self, text), fields(text_len = text.len()))]
    pub async fn submit_message(&self, text: &str) -> Result<ChatOutcome, EngineError> {
        let ticket = self.begin_chat(text).await?;
        let epoch = ticket.epoch;
        let reply = self.resolve_reply(&ticket).await;
        Ok(self.finish_chat(epoch, reply).await)
    }

    /// Ask the guidance service for a fresh problem and install it. Failures
    /// leave the session unchanged; a problem is never guessed locally.
    #[instrument(level = "info", skip(self), fields(difficulty = ?difficulty, category = ?category))]
    pub async fn request_new_problem(
        &self,
        difficulty: Option<&str>,
        category: Option<&str>,
    ) -> Result<Problem, EngineError> {
        {
            let mut s = self.session.write().await;
            if s.generating_problem {
                return Err(EngineError::GenerationBusy);
            }
            s.generating_problem = true;
        }

        let result = match &self.guidance {
            Some(client) => client
                .generate_problem(difficulty, category)
                .await
                .map_err(EngineError::from),
            None => Err(EngineError::GuidanceUnavailable),
        };

        let mut s = self.session.write().await;
        s.generating_problem = false;
        match result {
            Ok(generated) => {
                s.replace_problem(generated.problem, &generated.starter_code);
                info!(
                    target: "session",
                    epoch = s.epoch,
                    title = %s.problem.title,
                    "Generated problem installed"
                );
                Ok(s.problem.clone())
            }
            Err(e) => {
                warn!(target: "session", error = %e, "Problem generation failed; session unchanged");
                Err(e)
            }
        }
    }

    /// Install a user-authored problem. Synchronous; no network involved.
    #[instrument(level = "info", skip(self, title, description), fields(title_len = title.len()))]
    pub async fn submit_custom_problem(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Problem, EngineError> {
        let title = title.trim();
        let description = description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(EngineError::InvalidCustomProblem);
        }

        let problem = Problem {
            title: title.to_string(),
            description: description.to_string(),
            difficulty: Difficulty::Custom,
            category: "Custom".into(),
            estimated_time: "Self-paced".into(),
            examples: Vec::new(),
            source: ProblemSource::Custom,
        };

        let mut s = self.session.write().await;
        s.replace_problem(problem, CUSTOM_STARTER_CODE);
        info!(target: "session", epoch = s.epoch, title = %s.problem.title, "Custom problem installed");
        Ok(s.problem.clone())
    }

    /// Run the simulator against the current draft. May overlap the chat and
    /// generation tracks freely; only the stored report is epoch-guarded, so
    /// a report for a swapped-out problem cannot resurrect `last_run`.
    #[instrument(level = "info", skip(self))]
    pub async fn run_code(&self) -> RunReport {
        let (epoch, code, sample) = {
            let s = self.session.read().await;
            (
                s.epoch,
                s.code.clone(),
                s.problem.sample_output().map(|o| o.to_string()),
            )
        };

        let report = simulator::simulate_run(&code, sample.as_deref()).await;

        let mut s = self.session.write().await;
        if s.epoch == epoch {
            s.last_run = Some(report.clone());
        } else {
            warn!(
                target: "session",
                ticket_epoch = epoch,
                current_epoch = s.epoch,
                "Dropping stale run report"
            );
        }
        report
    }

    #[cfg(test)]
    fn offline() -> Self {
        Self {
            session: RwLock::new(Session::new(default_problem(), DEFAULT_STARTER_CODE)),
            guidance: None,
            replies: ReplyPools::default(),
            session_id: "test-session".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, RunStatus};

    #[tokio::test]
    async fn sequential_turns_alternate_user_then_assistant() {
        let state = AppState::offline();
        for text in ["Where should I start?", "Can you give me a hint?", "thanks"] {
            let outcome = state.submit_message(text).await.expect("turn");
            assert!(matches!(outcome, ChatOutcome::Replied(_)));
        }

        let s = state.snapshot().await;
        assert_eq!(s.transcript.len(), 6);
        for (i, msg) in s.transcript.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(msg.role, expected, "turn {i}");
            assert!(!msg.content.is_empty());
        }
        assert!(!s.awaiting_reply);
    }

    #[tokio::test]
    async fn blank_messages_are_rejected_without_state_change() {
        let state = AppState::offline();
        let err = state.submit_message("   ").await.expect_err("rejected");
        assert!(matches!(err, EngineError::EmptyMessage));
        assert!(state.snapshot().await.transcript.is_empty());
    }

    #[tokio::test]
    async fn second_chat_is_rejected_while_one_is_pending() {
        let state = AppState::offline();
        let ticket = state.begin_chat("first question").await.expect("ticket");

        let err = state.begin_chat("second question").await.expect_err("busy");
        assert!(matches!(err, EngineError::ChatBusy));

        // Only the first user message landed.
        assert_eq!(state.snapshot().await.transcript.len(), 1);

        let outcome = state
            .finish_chat(ticket.epoch, ChatMessage::assistant("And what do you think?"))
            .await;
        assert!(matches!(outcome, ChatOutcome::Replied(_)));
        assert_eq!(state.snapshot().await.transcript.len(), 2);
    }

    #[tokio::test]
    async fn custom_problem_replaces_everything_wholesale() {
        let state = AppState::offline();
        state.submit_message("where do I start").await.expect("turn");
        state.edit_code("return 42".into()).await;
        state.run_code().await;

        let before = state.snapshot().await;
        assert_eq!(before.transcript.len(), 2);
        assert!(before.last_run.is_some());

        state
            .submit_custom_problem("Reverse List", "Reverse a linked list in place.")
            .await
            .expect("custom problem");

        let s = state.snapshot().await;
        assert_eq!(s.problem.title, "Reverse List");
        assert_eq!(s.problem.difficulty, Difficulty::Custom);
        assert_eq!(s.problem.category, "Custom");
        assert_eq!(s.problem.source, ProblemSource::Custom);
        assert!(s.problem.examples.is_empty());
        assert!(s.transcript.is_empty());
        assert_eq!(s.code, CUSTOM_STARTER_CODE);
        assert!(s.last_run.is_none());
        assert_eq!(s.epoch, before.epoch + 1);
    }

    #[tokio::test]
    async fn blank_custom_problem_fields_are_rejected() {
        let state = AppState::offline();
        state.submit_message("hello").await.expect("turn");

        for (title, desc) in [("  ", "desc"), ("title", "\n"), ("", "")] {
            let err = state
                .submit_custom_problem(title, desc)
                .await
                .expect_err("rejected");
            assert!(matches!(err, EngineError::InvalidCustomProblem));
        }

        // Rejections left the session untouched.
        let s = state.snapshot().await;
        assert_eq!(s.transcript.len(), 2);
        assert_eq!(s.problem.title, "Two Sum");
    }

    #[tokio::test]
    async fn stale_reply_is_discarded_after_problem_swap() {
        let state = AppState::offline();
        let ticket = state.begin_chat("is my approach correct?").await.expect("ticket");

        // The problem is swapped while the reply is in flight.
        state
            .submit_custom_problem("Anagrams", "Group the anagrams.")
            .await
            .expect("custom problem");

        let outcome = state
            .finish_chat(ticket.epoch, ChatMessage::assistant("About the old problem..."))
            .await;
        assert!(matches!(outcome, ChatOutcome::Superseded));

        // The new problem's transcript never saw the stale reply.
        let s = state.snapshot().await;
        assert!(s.transcript.is_empty());
        assert!(!s.awaiting_reply);
    }

    #[tokio::test]
    async fn run_code_stores_report_for_current_epoch() {
        let state = AppState::offline();

        // Default starter code has the placeholder and no return.
        let report = state.run_code().await;
        assert_eq!(report.status, RunStatus::Empty);

        state.edit_code("def two_sum(nums, target):\n    return [i, j]".into()).await;
        let report = state.run_code().await;
        assert_eq!(report.status, RunStatus::Produced);
        assert_eq!(report.message, "Output: [0, 1]");

        let s = state.snapshot().await;
        assert_eq!(s.last_run.expect("report").status, RunStatus::Produced);
    }

    #[tokio::test]
    async fn generation_without_guidance_surfaces_and_clears_the_flag() {
        let state = AppState::offline();
        let err = state.request_new_problem(None, None).await.expect_err("offline");
        assert!(matches!(err, EngineError::GuidanceUnavailable));

        let s = state.snapshot().await;
        assert!(!s.generating_problem);
        assert_eq!(s.problem.title, "Two Sum");

        // The flag was cleared, so the next attempt fails the same way
        // rather than reporting a pending generation.
        let err = state.request_new_problem(None, None).await.expect_err("offline");
        assert!(matches!(err, EngineError::GuidanceUnavailable));
    }
}
