//! Integration tests for the session state machine and question normalization.

use rand::rngs::StdRng;
use rand::SeedableRng;
use timed_quiz::error::QuizError;
use timed_quiz::quiz::{
    normalize, normalize_all, normalize_with, Advance, Phase, Question, QuizSession, RawQuestion,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn question(text: &str, correct: &str, others: &[&str]) -> Question {
    let mut choices: Vec<String> = others.iter().map(|s| (*s).to_string()).collect();
    choices.push(correct.to_string());
    Question::new(text, choices, correct).unwrap()
}

/// Three questions whose correct answers are "A", "B", "C".
fn active_session() -> QuizSession {
    let mut session = QuizSession::new(120);
    session
        .populate(vec![
            question("Q1", "A", &["x", "y"]),
            question("Q2", "B", &["x", "y"]),
            question("Q3", "C", &["x", "y"]),
        ])
        .unwrap();
    session
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn test_normalize_decodes_and_keeps_all_choices() {
    let raw = RawQuestion::new(
        "Who wrote &quot;Hamlet&quot;?",
        "Shakespeare",
        ["Marlowe", "Jonson &amp; co", "Kyd"],
    );
    let q = normalize(&raw).unwrap();

    assert_eq!(q.text(), "Who wrote \"Hamlet\"?");
    assert_eq!(q.choices().len(), 4);
    assert!(q.has_choice("Jonson & co"));
    assert!(q.is_correct("Shakespeare"));
    assert_eq!(q.correct_choice(), "Shakespeare");
}

#[test]
fn test_normalize_numeric_references() {
    let raw = RawQuestion::new("It&#039;s?", "Don&#039;t", ["Won&#039;t"]);
    let q = normalize(&raw).unwrap();
    assert_eq!(q.text(), "It's?");
    assert!(q.has_choice("Don't"));
}

#[test]
fn test_normalize_with_seed_is_reproducible() {
    let raw = RawQuestion::new("Q", "a", ["b", "c", "d", "e"]);
    let first = normalize_with(&raw, &mut StdRng::seed_from_u64(7)).unwrap();
    let second = normalize_with(&raw, &mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(first.choices(), second.choices());
}

#[test]
fn test_normalize_rejects_duplicate_choices() {
    let raw = RawQuestion::new("Q", "a", ["a", "b"]);
    assert!(matches!(
        normalize(&raw),
        Err(QuizError::MalformedQuestion(_))
    ));
}

#[test]
fn test_normalize_rejects_empty_choice() {
    let raw = RawQuestion::new("Q", "", ["b"]);
    assert!(matches!(
        normalize(&raw),
        Err(QuizError::MalformedQuestion(_))
    ));
}

#[test]
fn test_normalize_all_empty_is_empty_question_set() {
    assert_eq!(normalize_all(&[]), Err(QuizError::EmptyQuestionSet));
}

// =============================================================================
// Phases
// =============================================================================

#[test]
fn test_new_session_is_loading() {
    let session = QuizSession::new(300);
    assert_eq!(session.phase(), Phase::Loading);
    assert!(session.is_empty());
    assert_eq!(session.remaining_seconds(), 300);
}

#[test]
fn test_populate_empty_keeps_loading() {
    let mut session = QuizSession::new(300);
    assert_eq!(session.populate(Vec::new()), Err(QuizError::EmptyQuestionSet));
    assert_eq!(session.phase(), Phase::Loading);
}

#[test]
fn test_populate_sizes_answers() {
    let session = active_session();
    assert_eq!(session.phase(), Phase::Active);
    assert_eq!(session.answers().len(), 3);
    assert!(session.answers().iter().all(Option::is_none));
    assert_eq!(session.cursor(), 0);
}

#[test]
fn test_operations_rejected_while_loading() {
    let mut session = QuizSession::new(300);
    assert!(matches!(
        session.record_answer("A"),
        Err(QuizError::NotActive { phase: Phase::Loading })
    ));
    assert!(session.go_next().is_err());
    assert!(session.finish().is_err());
    assert!(session.reset().is_err());
}

// =============================================================================
// Answers and Navigation
// =============================================================================

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
        Err(QuizError::InvalidChoice("nope".to_string()))
    );
    assert_eq!(session.current_answer(), None);
}

#[test]
fn test_go_next_requires_selection() {
    let mut session = active_session();
    assert_eq!(session.go_next(), Err(QuizError::NoSelection));
    assert_eq!(session.cursor(), 0);

    session.record_answer("A").unwrap();
    assert_eq!(session.go_next(), Ok(Advance::Moved(1)));
}

#[test]
fn test_go_next_on_last_is_ready_to_finish() {
    let mut session = active_session();
    session.jump_to(2).unwrap();
    session.record_answer("C").unwrap();
    assert_eq!(session.go_next(), Ok(Advance::ReadyToFinish));
    assert_eq!(session.cursor(), 2);
    assert_eq!(session.phase(), Phase::Active);
}

#[test]
fn test_go_previous_at_start_is_noop() {
    let mut session = active_session();
    assert_eq!(session.go_previous(), Ok(false));
    session.jump_to(1).unwrap();
    assert_eq!(session.go_previous(), Ok(true));
    assert_eq!(session.cursor(), 0);
}

#[test]
fn test_jump_ignores_answers_and_checks_range() {
    let mut session = active_session();
    session.jump_to(2).unwrap();
    assert_eq!(session.cursor(), 2);
    assert_eq!(
        session.jump_to(3),
        Err(QuizError::InvalidIndex { index: 3, len: 3 })
    );
    assert_eq!(session.cursor(), 2);
}

#[test]
fn test_answers_survive_navigation() {
    let mut session = active_session();
    session.record_answer("x").unwrap();
    session.go_next().unwrap();
    session.go_previous().unwrap();
    assert_eq!(session.current_answer(), Some("x"));
}

// =============================================================================
// Finish, Score and Reset
// =============================================================================

#[test]
fn test_score_counts_exact_matches() {
    let mut session = active_session();
    session.record_answer("A").unwrap();
    session.jump_to(1).unwrap();
    session.record_answer("x").unwrap();
    // Q3 unanswered
    assert_eq!(session.finish(), Ok(1));
    assert_eq!(session.score(), Ok(1));
    assert_eq!(session.phase(), Phase::Finished);
}

#[test]
fn test_score_before_finish() {
    let session = active_session();
    assert_eq!(session.score(), Err(QuizError::NotFinished));
}

#[test]
fn test_finished_session_rejects_controls() {
    let mut session = active_session();
    session.finish().unwrap();
    assert!(session.record_answer("A").is_err());
    assert!(session.jump_to(0).is_err());
    assert_eq!(session.finish(), Ok(0));
}

#[test]
fn test_reset_keeps_questions_and_clock() {
    let mut session = active_session();
    *session.clock_mut().unwrap() = 42;
    session.record_answer("A").unwrap();
    session.jump_to(2).unwrap();
    let questions = session.questions().to_vec();

    session.reset().unwrap();

    assert_eq!(session.questions(), questions.as_slice());
    assert!(session.answers().iter().all(Option::is_none));
    assert_eq!(session.cursor(), 0);
    assert_eq!(session.remaining_seconds(), 42);
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
fn test_reset_after_time_ran_out() {
    let mut session = active_session();
    *session.clock_mut().unwrap() = 0;
    session.finish().unwrap();
    assert_eq!(session.reset(), Err(QuizError::TimeExpired));
    assert_eq!(session.phase(), Phase::Finished);
}

#[test]
fn test_clock_frozen_outside_active() {
    let mut session = active_session();
    session.finish().unwrap();
    assert!(session.clock_mut().is_none());
}

// =============================================================================
// Restore
// =============================================================================

#[test]
fn test_restore_validates_shape() {
    let questions = vec![question("Q1", "A", &["x"]), question("Q2", "B", &["y"])];

    assert!(QuizSession::restore(Vec::new(), Vec::new(), 0, 10).is_err());
    assert!(QuizSession::restore(questions.clone(), vec![None], 0, 10).is_err());
    assert!(QuizSession::restore(questions.clone(), vec![None, None], 2, 10).is_err());
    assert!(
        QuizSession::restore(questions.clone(), vec![Some("zzz".into()), None], 0, 10).is_err()
    );

    let session =
        QuizSession::restore(questions, vec![Some("x".into()), None], 1, 10).unwrap();
    assert_eq!(session.phase(), Phase::Active);
    assert_eq!(session.cursor(), 1);
    assert!(session.is_answered(0));
}
