//! The quiz session state machine.
//!
//! # Phases
//!
//! ```text
//! Loading --populate--> Active --finish / clock hits 0--> Finished
//!                         ^                                  |
//!                         +------------- reset --------------+  (only while time remains)
//! ```
//!
//! A [`QuizSession`] owns the question set, the per-question answers, the
//! cursor and the remaining time. It never touches storage, the clock or the
//! screen; the controller drives those around it.

use std::fmt;

use serde::Serialize;

use super::question::Question;
use crate::error::{QuizError, QuizResult};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for the question supply. No interaction is allowed.
    #[default]
    Loading,
    /// Questions are loaded and the attempt is in progress.
    Active,
    /// The attempt is over and the score is available.
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::Active => "active",
            Self::Finished => "finished",
        };
        write!(f, "{name}")
    }
}

/// Result of a successful [`QuizSession::go_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor moved to the given index.
    Moved(usize),
    /// The cursor is on the last question; the caller should confirm submission.
    ReadyToFinish,
}

/// One quiz attempt: questions, answers, cursor and clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    phase: Phase,
    questions: Vec<Question>,
    answers: Vec<Option<String>>,
    cursor: usize,
    remaining_seconds: u32,
    final_score: Option<usize>,
}

impl QuizSession {
    /// Create an empty session in [`Phase::Loading`] with a full clock.
    #[must_use]
    pub fn new(time_limit_secs: u32) -> Self {
        Self {
            phase: Phase::Loading,
            questions: Vec::new(),
            answers: Vec::new(),
            cursor: 0,
            remaining_seconds: time_limit_secs,
            final_score: None,
        }
    }

    /// Rebuild a session from persisted parts.
    ///
    /// The result is [`Phase::Active`]; a zero clock is left for the caller to
    /// turn into a finish.
    ///
    /// # Errors
    ///
    /// - [`QuizError::EmptyQuestionSet`] if `questions` is empty
    /// - [`QuizError::MalformedQuestion`] if `answers` does not match `questions` in length
    /// - [`QuizError::InvalidIndex`] if `cursor` is out of range
    /// - [`QuizError::InvalidChoice`] if a recorded answer is not among its question's choices
    pub fn restore(
        questions: Vec<Question>,
        answers: Vec<Option<String>>,
        cursor: usize,
        remaining_seconds: u32,
    ) -> QuizResult<Self> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuestionSet);
        }
        if answers.len() != questions.len() {
            return Err(QuizError::MalformedQuestion(format!(
                "{} answers recorded for {} questions",
                answers.len(),
                questions.len()
            )));
        }
        if cursor >= questions.len() {
            return Err(QuizError::InvalidIndex {
                index: cursor,
                len: questions.len(),
            });
        }
        for (question, answer) in questions.iter().zip(&answers) {
            if let Some(answer) = answer {
                if !question.has_choice(answer) {
                    return Err(QuizError::InvalidChoice(answer.clone()));
                }
            }
        }

        Ok(Self {
            phase: Phase::Active,
            questions,
            answers,
            cursor,
            remaining_seconds,
            final_score: None,
        })
    }

    /// Assign a freshly fetched question set and enter [`Phase::Active`].
    ///
    /// Answers are cleared and the cursor returns to the first question. The
    /// clock is left as it is.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::EmptyQuestionSet`] for an empty set; the session
    /// then stays in its current phase.
    pub fn populate(&mut self, questions: Vec<Question>) -> QuizResult<()> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuestionSet);
        }
        self.answers = vec![None; questions.len()];
        self.questions = questions;
        self.cursor = 0;
        self.final_score = None;
        self.transition(Phase::Active);
        Ok(())
    }

    // ==================== Accessors ====================

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// All questions in order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Recorded answers, one slot per question.
    #[must_use]
    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    /// Index of the displayed question.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Seconds left on the clock.
    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether no questions are loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The displayed question, if any.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    /// The answer recorded for the displayed question.
    #[must_use]
    pub fn current_answer(&self) -> Option<&str> {
        self.answers.get(self.cursor).and_then(|a| a.as_deref())
    }

    /// Whether question `index` has an answer.
    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        matches!(self.answers.get(index), Some(Some(_)))
    }

    /// Number of answered questions.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// Whether the cursor is on the last question.
    #[must_use]
    pub fn is_at_last(&self) -> bool {
        !self.questions.is_empty() && self.cursor == self.questions.len() - 1
    }

    /// Mutable access to the clock, only while the attempt is running.
    ///
    /// Outside [`Phase::Active`] the clock is frozen and `None` is returned.
    pub fn clock_mut(&mut self) -> Option<&mut u32> {
        match self.phase {
            Phase::Active => Some(&mut self.remaining_seconds),
            _ => None,
        }
    }

    // ==================== Operations ====================

    /// Record `choice` for the displayed question. Last write wins.
    ///
    /// # Errors
    ///
    /// [`QuizError::NotActive`] outside the active phase, or
    /// [`QuizError::InvalidChoice`] if the question does not offer `choice`.
    pub fn record_answer(&mut self, choice: &str) -> QuizResult<()> {
        self.ensure_active()?;
        let question = &self.questions[self.cursor];
        if !question.has_choice(choice) {
            return Err(QuizError::InvalidChoice(choice.to_string()));
        }
        self.answers[self.cursor] = Some(choice.to_string());
        log::trace!("Answer recorded for question {}: {choice}", self.cursor);
        Ok(())
    }

    /// Advance to the next question.
    ///
    /// # Errors
    ///
    /// [`QuizError::NoSelection`] if the displayed question is unanswered; the
    /// cursor does not move.
    pub fn go_next(&mut self) -> QuizResult<Advance> {
        self.ensure_active()?;
        if !self.is_answered(self.cursor) {
            return Err(QuizError::NoSelection);
        }
        if self.is_at_last() {
            return Ok(Advance::ReadyToFinish);
        }
        self.cursor += 1;
        log::trace!("Navigate next: cursor = {}", self.cursor);
        Ok(Advance::Moved(self.cursor))
    }

    /// Step back one question. Returns `false` if already on the first one.
    ///
    /// # Errors
    ///
    /// [`QuizError::NotActive`] outside the active phase.
    pub fn go_previous(&mut self) -> QuizResult<bool> {
        self.ensure_active()?;
        if self.cursor == 0 {
            return Ok(false);
        }
        self.cursor -= 1;
        log::trace!("Navigate previous: cursor = {}", self.cursor);
        Ok(true)
    }

    /// Move the cursor to `index` without any answer check.
    ///
    /// # Errors
    ///
    /// [`QuizError::InvalidIndex`] if `index` is out of range.
    pub fn jump_to(&mut self, index: usize) -> QuizResult<()> {
        self.ensure_active()?;
        if index >= self.questions.len() {
            return Err(QuizError::InvalidIndex {
                index,
                len: self.questions.len(),
            });
        }
        self.cursor = index;
        log::trace!("Jump: cursor = {}", self.cursor);
        Ok(())
    }

    /// End the attempt and return the score.
    ///
    /// Calling it again on a finished session returns the same score.
    ///
    /// # Errors
    ///
    /// [`QuizError::NotActive`] while still loading.
    pub fn finish(&mut self) -> QuizResult<usize> {
        match self.phase {
            Phase::Finished => self.score(),
            Phase::Loading => Err(QuizError::NotActive { phase: self.phase }),
            Phase::Active => {
                let score = self.compute_score();
                self.final_score = Some(score);
                self.transition(Phase::Finished);
                log::info!("Quiz finished: {score}/{}", self.questions.len());
                Ok(score)
            }
        }
    }

    /// Number of answers equal to their question's correct choice.
    ///
    /// # Errors
    ///
    /// [`QuizError::NotFinished`] before [`finish`](Self::finish).
    pub fn score(&self) -> QuizResult<usize> {
        match (self.phase, self.final_score) {
            (Phase::Finished, Some(score)) => Ok(score),
            _ => Err(QuizError::NotFinished),
        }
    }

    /// Clear every answer and return to the first question, keeping the
    /// question set and the remaining time.
    ///
    /// # Errors
    ///
    /// - [`QuizError::NotActive`] while loading
    /// - [`QuizError::TimeExpired`] on a finished session with no time left
    pub fn reset(&mut self) -> QuizResult<()> {
        match self.phase {
            Phase::Loading => return Err(QuizError::NotActive { phase: self.phase }),
            Phase::Finished if self.remaining_seconds == 0 => return Err(QuizError::TimeExpired),
            _ => {}
        }
        self.answers = vec![None; self.questions.len()];
        self.cursor = 0;
        self.final_score = None;
        self.transition(Phase::Active);
        Ok(())
    }

    fn compute_score(&self) -> usize {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(question, answer)| {
                answer
                    .as_deref()
                    .is_some_and(|answer| question.is_correct(answer))
            })
            .count()
    }

    fn ensure_active(&self) -> QuizResult<()> {
        if self.phase == Phase::Active {
            Ok(())
        } else {
            Err(QuizError::NotActive { phase: self.phase })
        }
    }

    fn transition(&mut self, phase: Phase) {
        if self.phase != phase {
            log::debug!("Session transition: {} -> {}", self.phase, phase);
        }
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, correct: &str, wrong: &[&str]) -> Question {
        let mut choices: Vec<String> = wrong.iter().map(|s| s.to_string()).collect();
        choices.push(correct.to_string());
        Question::new(text, choices, correct).unwrap()
    }

    fn active_session() -> QuizSession {
        let mut session = QuizSession::new(300);
        session
            .populate(vec![
                question("Q1", "A", &["x", "y"]),
                question("Q2", "B", &["x", "y"]),
                question("Q3", "C", &["x", "y"]),
            ])
            .unwrap();
        session
    }

    #[test]
    fn test_new_session_is_loading() {
        let session = QuizSession::new(300);
        assert_eq!(session.phase(), Phase::Loading);
        assert!(session.is_empty());
        assert_eq!(session.remaining_seconds(), 300);
    }

    #[test]
    fn test_operations_rejected_while_loading() {
        let mut session = QuizSession::new(300);
        assert_eq!(
            session.go_next(),
            Err(QuizError::NotActive {
                phase: Phase::Loading
            })
        );
        assert!(session.record_answer("A").is_err());
        assert!(session.go_previous().is_err());
        assert!(session.jump_to(0).is_err());
        assert!(session.finish().is_err());
        assert!(session.reset().is_err());
    }

    #[test]
    fn test_populate_empty_stays_loading() {
        let mut session = QuizSession::new(300);
        assert_eq!(session.populate(vec![]), Err(QuizError::EmptyQuestionSet));
        assert_eq!(session.phase(), Phase::Loading);
    }

    #[test]
    fn test_populate_enters_active() {
        let session = active_session();
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.answers(), &[None, None, None]);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_record_answer_last_write_wins() {
        let mut session = active_session();
        session.record_answer("x").unwrap();
        session.record_answer("A").unwrap();
        assert_eq!(session.current_answer(), Some("A"));
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn test_record_answer_rejects_unknown_choice() {
        let mut session = active_session();
        assert_eq!(
            session.record_answer("nope"),
            Err(QuizError::InvalidChoice("nope".into()))
        );
        assert_eq!(session.record_answer(""), Err(QuizError::InvalidChoice(String::new())));
        assert_eq!(session.current_answer(), None);
    }

    #[test]
    fn test_go_next_requires_selection() {
        let mut session = active_session();
        assert_eq!(session.go_next(), Err(QuizError::NoSelection));
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_go_next_moves_and_stops_at_last() {
        let mut session = active_session();
        session.record_answer("A").unwrap();
        assert_eq!(session.go_next(), Ok(Advance::Moved(1)));
        session.record_answer("B").unwrap();
        assert_eq!(session.go_next(), Ok(Advance::Moved(2)));
        session.record_answer("C").unwrap();
        assert_eq!(session.go_next(), Ok(Advance::ReadyToFinish));
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.phase(), Phase::Active);
    }

    #[test]
    fn test_go_previous_without_answer() {
        let mut session = active_session();
        assert_eq!(session.go_previous(), Ok(false));
        session.jump_to(2).unwrap();
        assert_eq!(session.go_previous(), Ok(true));
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_jump_to_keeps_answers() {
        let mut session = active_session();
        session.record_answer("A").unwrap();
        session.jump_to(2).unwrap();
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.answers()[0].as_deref(), Some("A"));
        assert_eq!(
            session.jump_to(3),
            Err(QuizError::InvalidIndex { index: 3, len: 3 })
        );
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn test_score_scenario() {
        // answers [A, null, C], correct [A, B, C] -> 2
        let mut session = active_session();
        session.record_answer("A").unwrap();
        session.jump_to(2).unwrap();
        session.record_answer("C").unwrap();
        assert_eq!(session.score(), Err(QuizError::NotFinished));
        assert_eq!(session.finish(), Ok(2));
        assert_eq!(session.score(), Ok(2));
        assert_eq!(session.score(), Ok(2));
        assert_eq!(session.finish(), Ok(2));
    }

    #[test]
    fn test_finished_freezes_clock() {
        let mut session = active_session();
        assert!(session.clock_mut().is_some());
        session.finish().unwrap();
        assert!(session.clock_mut().is_none());
        assert!(session.record_answer("A").is_err());
    }

    #[test]
    fn test_reset_keeps_questions_and_clock() {
        let mut session = active_session();
        session.record_answer("A").unwrap();
        session.go_next().unwrap();
        if let Some(clock) = session.clock_mut() {
            *clock = 120;
        }
        session.reset().unwrap();
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.len(), 3);
        assert_eq!(session.remaining_seconds(), 120);
    }

    #[test]
    fn test_reset_after_finish_with_time_left() {
        let mut session = active_session();
        session.finish().unwrap();
        session.reset().unwrap();
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.score(), Err(QuizError::NotFinished));
    }

    #[test]
    fn test_reset_after_timeout_is_rejected() {
        let mut session = active_session();
        if let Some(clock) = session.clock_mut() {
            *clock = 0;
        }
        session.finish().unwrap();
        assert_eq!(session.reset(), Err(QuizError::TimeExpired));
        assert_eq!(session.phase(), Phase::Finished);
    }

    #[test]
    fn test_restore_validates() {
        let questions = vec![question("Q1", "A", &["x"])];
        assert!(QuizSession::restore(vec![], vec![], 0, 10).is_err());
        assert!(QuizSession::restore(questions.clone(), vec![], 0, 10).is_err());
        assert!(QuizSession::restore(questions.clone(), vec![None], 1, 10).is_err());
        assert!(
            QuizSession::restore(questions.clone(), vec![Some("zzz".into())], 0, 10).is_err()
        );

        let restored = QuizSession::restore(questions, vec![Some("x".into())], 0, 10).unwrap();
        assert_eq!(restored.phase(), Phase::Active);
        assert_eq!(restored.remaining_seconds(), 10);
        assert_eq!(restored.current_answer(), Some("x"));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Loading.to_string(), "loading");
        assert_eq!(Phase::Active.to_string(), "active");
        assert_eq!(Phase::Finished.to_string(), "finished");
    }
}
