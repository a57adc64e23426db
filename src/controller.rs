//! Session lifecycle orchestration.
//!
//! The [`SessionController`] owns the single live [`QuizSession`] together
//! with the [`Countdown`], the [`SessionStore`] and the [`QuestionSource`].
//! Every user action and every timer tick goes through it, so the store and
//! the clock always see the latest in-memory state.
//!
//! # Lifecycle
//!
//! 1. [`initialize`](SessionController::initialize) resumes a saved session or
//!    asks for a fetch.
//! 2. [`fetch_questions`](SessionController::fetch_questions) populates a fresh
//!    session, saves it and starts the clock at the full limit.
//! 3. Answers and navigation mutate the session and save it.
//! 4. The clock reaching zero, or a confirmed submission on the last question,
//!    finishes the attempt: the clock stops and the saved blob is removed.
//! 5. [`restart`](SessionController::restart) discards everything and fetches
//!    new questions; [`reset`](SessionController::reset) only clears answers.
//!
//! The `*_view` methods are pure projections for the rendering layer.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::{QuizError, QuizResult};
use crate::quiz::{format_clock, normalize_all, Advance, Countdown, Phase, QuizSession, TickOutcome};
use crate::store::{KeyValueStore, SessionStore};
use crate::supply::QuestionSource;

/// Default full quiz duration in seconds.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 300;

/// Default number of questions per attempt.
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Prompt shown when advancing without an answer.
pub const SELECT_PROMPT: &str = "Please select an option";

/// Knobs the controller needs from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Full quiz duration.
    pub time_limit_secs: u32,
    /// Questions requested per attempt.
    pub question_count: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

/// How [`SessionController::initialize`] got going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// A saved session was restored and the clock resumed.
    Resumed,
    /// A saved session was restored with no time left and finished at once.
    ResumedExpired,
    /// Nothing usable was saved; call [`SessionController::fetch_questions`].
    NeedsFetch,
}

/// A message for the user, shown until replaced or dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Inline prompt after advancing without a selection.
    SelectPrompt,
    /// Something went wrong but the quiz goes on.
    Warning(String),
    /// The attempt cannot continue until the user restarts.
    Blocking(String),
}

impl Notice {
    /// Text to display.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::SelectPrompt => SELECT_PROMPT,
            Self::Warning(msg) | Self::Blocking(msg) => msg,
        }
    }

    /// Whether the notice blocks interaction.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Blocking(_))
    }
}

/// One choice of the displayed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    /// Choice text.
    pub text: String,
    /// Whether this is the recorded answer.
    pub selected: bool,
}

/// Projection of the displayed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// Zero-based index.
    pub index: usize,
    /// Number of questions.
    pub total: usize,
    /// Question text.
    pub text: String,
    /// Choices in display order.
    pub choices: Vec<ChoiceView>,
    /// "Next", or "Submit" on the last question.
    pub primary_label: &'static str,
}

impl QuestionView {
    /// "Question i / n" counter.
    #[must_use]
    pub fn counter(&self) -> String {
        format!("Question {} / {}", self.index + 1, self.total)
    }
}

/// State of one question indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndicatorView {
    /// Zero-based index.
    pub index: usize,
    /// The question has an answer.
    pub answered: bool,
    /// The question is displayed.
    pub current: bool,
}

/// Final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreView {
    /// Correct answers.
    pub score: usize,
    /// Number of questions.
    pub total: usize,
}

impl ScoreView {
    /// "S / N Questions" line.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} / {} Questions", self.score, self.total)
    }
}

/// Everything the screen needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizView {
    /// Session phase.
    pub phase: Phase,
    /// Displayed question while active.
    pub question: Option<QuestionView>,
    /// One indicator per question.
    pub indicators: Vec<IndicatorView>,
    /// `MM:SS` readout.
    pub timer: String,
    /// Result once finished.
    pub score: Option<ScoreView>,
    /// Notice text, if any.
    pub notice: Option<String>,
}

/// Owns the live session and coordinates clock, store and supply.
pub struct SessionController<Q, S> {
    source: Q,
    store: SessionStore<S>,
    session: QuizSession,
    countdown: Countdown,
    settings: ControllerSettings,
    notice: Option<Notice>,
}

impl<Q: QuestionSource, S: KeyValueStore> SessionController<Q, S> {
    /// Create a controller with an empty, loading session.
    pub fn new(source: Q, store: SessionStore<S>, settings: ControllerSettings) -> Self {
        Self {
            source,
            store,
            session: QuizSession::new(settings.time_limit_secs),
            countdown: Countdown::new(),
            settings,
            notice: None,
        }
    }

    /// Replace the countdown, e.g. with a shorter period in tests.
    #[must_use]
    pub fn with_countdown(mut self, countdown: Countdown) -> Self {
        self.countdown = countdown;
        self
    }

    // ==================== Accessors ====================

    /// The live session.
    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// The question source.
    #[must_use]
    pub fn source(&self) -> &Q {
        &self.source
    }

    /// The session store.
    #[must_use]
    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// Mutable access to the session store.
    pub fn store_mut(&mut self) -> &mut SessionStore<S> {
        &mut self.store
    }

    /// Controller settings.
    #[must_use]
    pub fn settings(&self) -> ControllerSettings {
        self.settings
    }

    /// Current phase of the live session.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Whether the clock is ticking.
    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.countdown.is_running()
    }

    /// Time until the next tick is due.
    #[must_use]
    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.countdown.time_until_next(now)
    }

    /// The notice currently shown, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Drop the current notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ==================== Lifecycle ====================

    /// Resume the saved session if there is a usable one.
    pub fn initialize(&mut self, now: Instant) -> Startup {
        match self.store.load() {
            Some(session) => {
                log::info!(
                    "Resuming saved quiz at question {} of {} with {} left",
                    session.cursor() + 1,
                    session.len(),
                    format_clock(session.remaining_seconds())
                );
                self.session = session;
                if self.session.remaining_seconds() == 0 {
                    self.complete();
                    Startup::ResumedExpired
                } else {
                    self.countdown.start(now);
                    Startup::Resumed
                }
            }
            None => {
                log::debug!("No saved quiz, a fresh question set is needed");
                self.session = QuizSession::new(self.settings.time_limit_secs);
                Startup::NeedsFetch
            }
        }
    }

    /// Fetch, normalize and install a new question set, then start the clock
    /// at the full limit.
    ///
    /// # Errors
    ///
    /// [`QuizError::Fetch`], [`QuizError::EmptyQuestionSet`] or a
    /// normalization error. The session then stays in [`Phase::Loading`] and a
    /// blocking notice is set.
    pub fn fetch_questions(&mut self, now: Instant) -> QuizResult<()> {
        log::info!("Loading questions from {}", self.source.describe());
        let questions = self
            .source
            .fetch(self.settings.question_count)
            .and_then(|raw| normalize_all(&raw))
            .inspect_err(|e| {
                log::error!("Could not load questions: {e}");
                self.notice = Some(Notice::Blocking(format!(
                    "{e}. Press restart to try again."
                )));
            })?;

        let mut session = QuizSession::new(self.settings.time_limit_secs);
        session.populate(questions)?;
        self.session = session;
        self.notice = None;
        self.persist();
        self.countdown.start(now);
        Ok(())
    }

    /// Startup helper for headless use: resume or fetch.
    ///
    /// # Errors
    ///
    /// Propagates [`fetch_questions`](Self::fetch_questions) errors.
    pub fn start(&mut self, now: Instant) -> QuizResult<Startup> {
        let startup = self.initialize(now);
        if startup == Startup::NeedsFetch {
            self.fetch_questions(now)?;
        }
        Ok(startup)
    }

    /// Discard progress and go back to [`Phase::Loading`] with a full clock.
    ///
    /// Call [`fetch_questions`](Self::fetch_questions) afterwards. Split from
    /// [`restart`](Self::restart) so a UI can draw the loading state first.
    pub fn begin_restart(&mut self) {
        log::info!("Restarting quiz with new questions");
        self.countdown.stop();
        if let Err(e) = self.store.clear() {
            self.notice = Some(Notice::Warning(e.to_string()));
        } else {
            self.notice = None;
        }
        self.session = QuizSession::new(self.settings.time_limit_secs);
    }

    /// Discard progress and fetch a fresh question set.
    ///
    /// # Errors
    ///
    /// Propagates [`fetch_questions`](Self::fetch_questions) errors.
    pub fn restart(&mut self, now: Instant) -> QuizResult<()> {
        self.begin_restart();
        self.fetch_questions(now)
    }

    /// Clear answers and cursor, keeping questions and remaining time.
    ///
    /// On a finished session with time left the clock resumes.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::reset`]. A failed save is reported as a warning notice.
    pub fn reset(&mut self, now: Instant) -> QuizResult<()> {
        self.session.reset()?;
        log::info!("Answers cleared, {} left", format_clock(self.session.remaining_seconds()));
        self.notice = None;
        self.persist();
        if !self.countdown.is_running() {
            self.countdown.start(now);
        }
        Ok(())
    }

    // ==================== Controls ====================

    /// Record `choice` for the displayed question.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::record_answer`].
    pub fn select_answer(&mut self, choice: &str) -> QuizResult<()> {
        self.session.record_answer(choice)?;
        if self.notice == Some(Notice::SelectPrompt) {
            self.notice = None;
        }
        self.persist();
        Ok(())
    }

    /// Record the choice at `index` of the displayed question.
    ///
    /// # Errors
    ///
    /// [`QuizError::InvalidIndex`] for an unknown position, otherwise see
    /// [`select_answer`](Self::select_answer).
    pub fn select_choice(&mut self, index: usize) -> QuizResult<()> {
        if self.session.phase() != Phase::Active {
            return Err(QuizError::NotActive {
                phase: self.session.phase(),
            });
        }
        let choice = self
            .session
            .current_question()
            .and_then(|q| q.choices().get(index))
            .cloned()
            .ok_or_else(|| QuizError::InvalidIndex {
                index,
                len: self
                    .session
                    .current_question()
                    .map_or(0, |q| q.choices().len()),
            })?;
        self.select_answer(&choice)
    }

    /// Advance, or report that the quiz is ready to be submitted.
    ///
    /// # Errors
    ///
    /// [`QuizError::NoSelection`] when nothing is selected; the select prompt
    /// is shown and nothing else changes.
    pub fn next(&mut self) -> QuizResult<Advance> {
        match self.session.go_next() {
            Ok(advance) => {
                if self.notice == Some(Notice::SelectPrompt) {
                    self.notice = None;
                }
                if let Advance::Moved(_) = advance {
                    self.persist();
                }
                Ok(advance)
            }
            Err(QuizError::NoSelection) => {
                self.notice = Some(Notice::SelectPrompt);
                Err(QuizError::NoSelection)
            }
            Err(e) => Err(e),
        }
    }

    /// Step back one question.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::go_previous`].
    pub fn previous(&mut self) -> QuizResult<bool> {
        let moved = self.session.go_previous()?;
        if moved {
            self.persist();
        }
        Ok(moved)
    }

    /// Jump straight to question `index`.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::jump_to`].
    pub fn jump_to(&mut self, index: usize) -> QuizResult<()> {
        self.session.jump_to(index)?;
        self.persist();
        Ok(())
    }

    /// Submit from the last question after confirmation.
    ///
    /// # Errors
    ///
    /// [`QuizError::NotAtLastQuestion`] unless the cursor is on the last
    /// question, [`QuizError::NotActive`] outside the active phase.
    pub fn submit(&mut self) -> QuizResult<usize> {
        if self.session.phase() != Phase::Active {
            return Err(QuizError::NotActive {
                phase: self.session.phase(),
            });
        }
        if !self.session.is_at_last() {
            return Err(QuizError::NotAtLastQuestion);
        }
        Ok(self.complete())
    }

    /// Apply every tick that is due at `now` and return the last outcome.
    ///
    /// Missed ticks are applied together and the session is saved once.
    pub fn poll_timer(&mut self, now: Instant) -> TickOutcome {
        let due = self.countdown.due_ticks(now);
        let mut outcome = TickOutcome::Idle;
        for _ in 0..due {
            outcome = self.step_clock();
            if !matches!(outcome, TickOutcome::Running(_)) {
                break;
            }
        }
        self.settle_tick(outcome);
        outcome
    }

    /// Apply one tick: decrement the clock, save, and finish on zero.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.step_clock();
        self.settle_tick(outcome);
        outcome
    }

    fn step_clock(&mut self) -> TickOutcome {
        match self.session.clock_mut() {
            Some(clock) => self.countdown.tick(clock),
            None => {
                self.countdown.stop();
                TickOutcome::Idle
            }
        }
    }

    fn settle_tick(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Running(_) => self.persist(),
            TickOutcome::Expired => {
                self.persist();
                log::info!("Time is up");
                self.complete();
            }
        }
    }

    /// Stop the clock and save the session as it is, e.g. before exiting.
    ///
    /// # Errors
    ///
    /// Propagates [`QuizError::Storage`].
    pub fn suspend(&mut self) -> QuizResult<()> {
        self.countdown.stop();
        if self.session.phase() == Phase::Active {
            self.store.save(&self.session)?;
            log::info!("Progress saved");
        }
        Ok(())
    }

    // ==================== Projections ====================

    /// The displayed question, `None` unless active.
    #[must_use]
    pub fn question_view(&self) -> Option<QuestionView> {
        if self.session.phase() != Phase::Active {
            return None;
        }
        let question = self.session.current_question()?;
        let selected = self.session.current_answer();
        Some(QuestionView {
            index: self.session.cursor(),
            total: self.session.len(),
            text: question.text().to_string(),
            choices: question
                .choices()
                .iter()
                .map(|choice| ChoiceView {
                    text: choice.clone(),
                    selected: selected == Some(choice.as_str()),
                })
                .collect(),
            primary_label: if self.session.is_at_last() {
                "Submit"
            } else {
                "Next"
            },
        })
    }

    /// One indicator per question.
    #[must_use]
    pub fn indicators(&self) -> Vec<IndicatorView> {
        (0..self.session.len())
            .map(|index| IndicatorView {
                index,
                answered: self.session.is_answered(index),
                current: index == self.session.cursor(),
            })
            .collect()
    }

    /// The final score, `None` until finished.
    #[must_use]
    pub fn score_view(&self) -> Option<ScoreView> {
        self.session.score().ok().map(|score| ScoreView {
            score,
            total: self.session.len(),
        })
    }

    /// `MM:SS` readout of the remaining time.
    #[must_use]
    pub fn timer_readout(&self) -> String {
        format_clock(self.session.remaining_seconds())
    }

    /// All projections at once.
    #[must_use]
    pub fn snapshot(&self) -> QuizView {
        QuizView {
            phase: self.session.phase(),
            question: self.question_view(),
            indicators: self.indicators(),
            timer: self.timer_readout(),
            score: self.score_view(),
            notice: self.notice.as_ref().map(|n| n.message().to_string()),
        }
    }

    // ==================== Internals ====================

    /// Finish the attempt: freeze the clock, stop ticking and drop the blob.
    fn complete(&mut self) -> usize {
        self.countdown.stop();
        let score = match self.session.finish() {
            Ok(score) => score,
            Err(e) => {
                log::warn!("Finish requested in phase {}: {e}", self.session.phase());
                return 0;
            }
        };
        if let Err(e) = self.store.clear() {
            self.notice = Some(Notice::Warning(e.to_string()));
        }
        score
    }

    /// Save the live session; a failure becomes a warning and play goes on.
    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.session) {
            self.notice = Some(Notice::Warning(format!(
                "{e}. Progress may not survive a restart."
            )));
        }
    }
}
