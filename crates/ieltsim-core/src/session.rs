//! Test-session state machine.
//!
//! `SessionEngine` owns the `Session` aggregate and is the single writer to
//! it: every mutation goes through a typed transition method in response to
//! a discrete event (user intent, provider response, countdown expiry).
//! The only suspension points are the two provider calls; each is split
//! into an explicit begin/finish pair keyed by a request epoch so a
//! response that arrives for a superseded attempt is dropped on the floor.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{
    ReadingOutcome, Results, Section, Test, TestMode, UserAnswers, WritingFeedback,
    WritingOutcome, WritingSubmission,
};
use crate::scoring;
use crate::traits::{ConfirmGate, ContentProvider};
use crate::validate;

/// The screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Home,
    GeneratingTest,
    TakingReading,
    TakingWriting,
    ComputingResults,
    ShowingResults,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Home => "on the home screen",
            Phase::GeneratingTest => "generating a test",
            Phase::TakingReading => "taking the reading section",
            Phase::TakingWriting => "taking the writing section",
            Phase::ComputingResults => "computing results",
            Phase::ShowingResults => "showing results",
        };
        write!(f, "{name}")
    }
}

/// The full state of one attempt, as exposed to the presentation layer.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier of the current attempt; nil before the first start.
    pub attempt_id: Uuid,
    pub phase: Phase,
    /// How the attempt was started; `None` on the home screen.
    pub mode: Option<TestMode>,
    /// The generated test, present from `TakingReading`/`TakingWriting` on.
    pub test: Option<Test>,
    /// Working reading answers.
    pub answers: UserAnswers,
    /// Working essay texts.
    pub submission: WritingSubmission,
    /// Questions marked for review.
    pub marked: BTreeSet<u32>,
    /// Flattened index of the question group in view.
    pub active_group: usize,
    /// Finalized results, present in `ShowingResults`.
    pub results: Option<Results>,
    /// Message to show while a provider call is in flight.
    pub loading: Option<String>,
    /// User-visible error from the last failed operation.
    pub error: Option<String>,
    /// Non-blocking warning (degraded grading, word counts).
    pub warning: Option<String>,
    /// Reading outcome held between the two halves of a full attempt.
    pub pending_reading: Option<ReadingOutcome>,
}

impl Session {
    fn new() -> Self {
        Session {
            attempt_id: Uuid::nil(),
            phase: Phase::Home,
            mode: None,
            test: None,
            answers: UserAnswers::new(),
            submission: WritingSubmission::default(),
            marked: BTreeSet::new(),
            active_group: 0,
            results: None,
            loading: None,
            error: None,
            warning: None,
            pending_reading: None,
        }
    }
}

/// Orchestrates one attempt at a time over a content provider and a
/// confirmation gate.
pub struct SessionEngine {
    provider: Arc<dyn ContentProvider>,
    confirm: Arc<dyn ConfirmGate>,
    session: Session,
    /// Monotonic request counter; responses carry the epoch they were
    /// issued under and are dropped if the session has moved on.
    epoch: u64,
}

impl SessionEngine {
    pub fn new(provider: Arc<dyn ContentProvider>, confirm: Arc<dyn ConfirmGate>) -> Self {
        SessionEngine {
            provider,
            confirm,
            session: Session::new(),
            epoch: 0,
        }
    }

    /// Current session state, for rendering.
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn is_full(&self) -> bool {
        self.session.mode.map(|m| m.full).unwrap_or(false)
    }

    fn reset_attempt(&mut self) {
        self.session = Session::new();
    }

    // -----------------------------------------------------------------
    // Test generation
    // -----------------------------------------------------------------

    /// Start a new attempt: reset state, enter `GeneratingTest`, and call
    /// the provider. A repeated call supersedes any incomplete one.
    pub async fn start_test(&mut self, mode: TestMode) {
        let epoch = self.begin_generation(mode);
        let outcome = self.provider.generate_test().await;
        self.finish_generation(epoch, outcome);
    }

    /// Request half of `start_test`: clears the prior attempt and returns
    /// the epoch the eventual response must present.
    pub fn begin_generation(&mut self, mode: TestMode) -> u64 {
        self.reset_attempt();
        self.session.attempt_id = Uuid::new_v4();
        self.session.mode = Some(mode);
        self.session.phase = Phase::GeneratingTest;
        self.session.loading = Some("Generating your IELTS test...".into());
        self.epoch += 1;
        self.epoch
    }

    /// Response half of `start_test`. Validates the payload against the
    /// generation contract; any failure aborts back to the home screen.
    pub fn finish_generation(&mut self, epoch: u64, outcome: anyhow::Result<Test>) {
        if epoch != self.epoch || self.session.phase != Phase::GeneratingTest {
            tracing::debug!(epoch, current = self.epoch, "dropping stale generation response");
            return;
        }
        self.session.loading = None;

        let checked = outcome.and_then(|test| {
            validate::validate_test(&test)?;
            Ok(test)
        });

        match checked {
            Ok(test) => {
                self.session.test = Some(test);
                self.session.phase = match self.session.mode.map(|m| m.section) {
                    Some(Section::Writing) => Phase::TakingWriting,
                    _ => Phase::TakingReading,
                };
            }
            Err(e) => {
                tracing::error!("test generation failed: {e:#}");
                self.session.error =
                    Some("There was an error generating the test. Please try again.".into());
                self.session.phase = Phase::Home;
            }
        }
    }

    // -----------------------------------------------------------------
    // In-test intents
    // -----------------------------------------------------------------

    /// Record an answer edit. Ignored outside the reading phase and for
    /// ids not present in the current test.
    pub fn answer_changed(&mut self, question_id: u32, value: impl Into<String>) {
        if self.session.phase != Phase::TakingReading {
            return;
        }
        let known = self
            .session
            .test
            .as_ref()
            .is_some_and(|t| t.question(question_id).is_some());
        if !known {
            tracing::debug!(question_id, "ignoring answer for unknown question");
            return;
        }
        self.session.answers.insert(question_id, value.into());
    }

    /// Toggle the review mark on a question.
    pub fn toggle_mark(&mut self, question_id: u32) {
        if !self.session.marked.remove(&question_id) {
            self.session.marked.insert(question_id);
        }
    }

    /// Move to a question group by flattened index (clamped).
    pub fn navigate_to_group(&mut self, index: usize) {
        let count = self.session.test.as_ref().map_or(0, Test::group_count);
        if count > 0 {
            self.session.active_group = index.min(count - 1);
        }
    }

    /// Jump to the group containing the given question.
    pub fn jump_to_question(&mut self, question_id: u32) {
        if let Some(index) = self
            .session
            .test
            .as_ref()
            .and_then(|t| t.group_index_of(question_id))
        {
            self.session.active_group = index;
        }
    }

    /// Replace the task 1 essay text.
    pub fn edit_task1(&mut self, text: impl Into<String>) {
        if self.session.phase == Phase::TakingWriting {
            self.session.submission.task1 = text.into();
        }
    }

    /// Replace the task 2 essay text.
    pub fn edit_task2(&mut self, text: impl Into<String>) {
        if self.session.phase == Phase::TakingWriting {
            self.session.submission.task2 = text.into();
        }
    }

    // -----------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------

    /// Finalize the reading section. Unless forced, unanswered questions
    /// route through the confirmation gate first.
    pub async fn submit_reading(&mut self, force: bool) -> Result<(), SessionError> {
        if self.session.phase != Phase::TakingReading {
            return Err(SessionError::InvalidTransition {
                intent: "submitReading",
                phase: self.session.phase,
            });
        }
        let Some(test) = self.session.test.as_ref() else {
            return Err(SessionError::InvalidTransition {
                intent: "submitReading",
                phase: self.session.phase,
            });
        };

        let unanswered = scoring::unanswered(test, &self.session.answers);
        if !force && !unanswered.is_empty() {
            let prompt = format!(
                "You have {} unanswered questions. Are you sure you want to finish?",
                unanswered.len()
            );
            if !self.confirm.confirm(&prompt).await {
                return Ok(());
            }
        }

        let outcome = scoring::score_reading(test, &self.session.answers);

        if self.is_full() {
            self.session.pending_reading = Some(outcome);
            self.session.phase = Phase::TakingWriting;
        } else {
            let overall = outcome.band;
            self.session.results = Some(Results {
                attempt_id: self.session.attempt_id,
                completed_at: Utc::now(),
                reading: Some(outcome),
                writing: None,
                overall_band: overall,
            });
            self.session.phase = Phase::ShowingResults;
        }
        Ok(())
    }

    /// Finalize the writing section and ask the provider to grade it.
    /// Unless forced, submissions below the word minimums are gated.
    pub async fn submit_writing(&mut self, force: bool) -> Result<(), SessionError> {
        if self.session.phase != Phase::TakingWriting {
            return Err(SessionError::InvalidTransition {
                intent: "submitWriting",
                phase: self.session.phase,
            });
        }

        let words_task1 = scoring::word_count(&self.session.submission.task1);
        let words_task2 = scoring::word_count(&self.session.submission.task2);
        let meets_minimums =
            words_task1 >= scoring::TASK1_MIN_WORDS && words_task2 >= scoring::TASK2_MIN_WORDS;

        if !force && !meets_minimums {
            if self.is_full() {
                self.session.warning = Some(format!(
                    "Task 1 needs at least {} words and Task 2 at least {}.",
                    scoring::TASK1_MIN_WORDS,
                    scoring::TASK2_MIN_WORDS
                ));
                return Ok(());
            }
            let proceed = self
                .confirm
                .confirm(
                    "Your response is below the recommended word count. \
                     The feedback may be less accurate. Do you want to submit anyway?",
                )
                .await;
            if !proceed {
                return Ok(());
            }
        }

        let epoch = self.begin_grading()?;
        let submission = self.session.submission.clone();
        let outcome = self.provider.grade_writing(&submission).await;
        self.finish_grading(epoch, outcome);
        Ok(())
    }

    /// Request half of grading: enter `ComputingResults` and return the
    /// epoch the eventual response must present.
    pub fn begin_grading(&mut self) -> Result<u64, SessionError> {
        if self.session.phase != Phase::TakingWriting {
            return Err(SessionError::InvalidTransition {
                intent: "submitWriting",
                phase: self.session.phase,
            });
        }
        self.session.phase = Phase::ComputingResults;
        self.session.loading = Some(if self.is_full() {
            "Calculating scores and analyzing writing...".into()
        } else {
            "Analyzing your writing...".into()
        });
        self.epoch += 1;
        Ok(self.epoch)
    }

    /// Response half of grading. A grading failure degrades gracefully:
    /// feedback is recorded as absent, the writing band contributes zero,
    /// and the session still reaches the results screen.
    pub fn finish_grading(&mut self, epoch: u64, outcome: anyhow::Result<WritingFeedback>) {
        if epoch != self.epoch || self.session.phase != Phase::ComputingResults {
            tracing::debug!(epoch, current = self.epoch, "dropping stale grading response");
            return;
        }
        self.session.loading = None;

        let feedback = match outcome {
            Ok(feedback) => Some(feedback),
            Err(e) => {
                tracing::warn!("writing evaluation failed, continuing without feedback: {e:#}");
                self.session.warning =
                    Some("Sorry, there was an error analyzing your writing submission.".into());
                None
            }
        };
        let writing_band = feedback.as_ref().map(|f| f.overall_band).unwrap_or(0.0);
        let writing = Some(WritingOutcome {
            feedback,
            submission: self.session.submission.clone(),
        });

        let (reading, overall_band) = if self.is_full() {
            let reading = self.session.pending_reading.take();
            let reading_band = reading.as_ref().map(|r| r.band).unwrap_or(0.0);
            (
                reading,
                scoring::combine_overall_band(reading_band, writing_band),
            )
        } else {
            (None, writing_band)
        };

        self.session.results = Some(Results {
            attempt_id: self.session.attempt_id,
            completed_at: Utc::now(),
            reading,
            writing,
            overall_band,
        });
        self.session.phase = Phase::ShowingResults;
    }

    // -----------------------------------------------------------------
    // Countdown and reset
    // -----------------------------------------------------------------

    /// Handle section-time expiry: force-submit whatever is held, without
    /// any confirmation. A late expiry after the phase moved on is a no-op.
    pub async fn timer_expired(&mut self) {
        match self.session.phase {
            Phase::TakingReading => {
                let _ = self.submit_reading(true).await;
            }
            Phase::TakingWriting => {
                let _ = self.submit_writing(true).await;
            }
            _ => {
                tracing::debug!(phase = %self.session.phase, "ignoring late timer expiry");
            }
        }
    }

    /// Discard the attempt and return to the home screen. In-flight
    /// provider responses are invalidated and will be dropped on arrival.
    pub fn start_new(&mut self) {
        self.epoch += 1;
        self.reset_attempt();
    }
}
