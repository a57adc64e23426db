//! Integration tests for TUI navigation and screen content.
//!
//! The app runs headless on a fixed question source and an in-memory store;
//! screens are drawn to a ratatui `TestBackend`.

use std::time::{Duration, Instant};

use ratatui::{backend::TestBackend, Terminal};
use timed_quiz::controller::{ControllerSettings, SessionController, Startup, SELECT_PROMPT};
use timed_quiz::quiz::{normalize, Phase, QuizSession, RawQuestion, TickOutcome};
use timed_quiz::store::{MemoryStore, SessionStore};
use timed_quiz::supply::StaticSource;
use timed_quiz::tui::{render, Action, App, AppMode};

// =============================================================================
// Helper Functions
// =============================================================================

type TestApp = App<StaticSource, MemoryStore>;

fn questions() -> Vec<RawQuestion> {
    vec![
        RawQuestion::new("Largest planet?", "Jupiter", ["Mars", "Venus"]),
        RawQuestion::new("Smallest prime?", "2", ["1", "3"]),
        RawQuestion::new("H2O is?", "Water", ["Salt", "Air"]),
    ]
}

fn app_with_store(store: SessionStore<MemoryStore>, time_limit_secs: u32) -> TestApp {
    let controller = SessionController::new(
        StaticSource::new(questions()),
        store,
        ControllerSettings {
            time_limit_secs,
            question_count: 3,
        },
    );
    App::new(controller)
}

/// An app that has fetched its questions and shows the first one.
fn running_app(time_limit_secs: u32, now: Instant) -> TestApp {
    let store = SessionStore::new(MemoryStore::new(), time_limit_secs);
    let mut app = app_with_store(store, time_limit_secs);
    assert_eq!(app.start(now), Startup::NeedsFetch);
    assert!(app.fetch_pending());
    app.run_pending_fetch(now);
    app
}

fn correct_index(app: &TestApp) -> u8 {
    let question = app.controller().session().current_question().unwrap();
    let index = question
        .choices()
        .iter()
        .position(|c| question.is_correct(c))
        .unwrap();
    u8::try_from(index + 1).unwrap()
}

fn draw(app: &TestApp) -> String {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    terminal.draw(|frame| render(frame, app)).unwrap();
    terminal
        .backend()
        .buffer()
        .content
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

// =============================================================================
// Answering
// =============================================================================

#[test]
fn test_fetch_shows_first_question() {
    let app = running_app(300, Instant::now());
    assert_eq!(app.mode(), AppMode::Answering);
    assert!(!app.fetch_pending());
    assert_eq!(app.highlight(), 0);
    assert_eq!(app.view().question.unwrap().index, 0);
}

#[test]
fn test_highlight_and_select() {
    let now = Instant::now();
    let mut app = running_app(300, now);

    assert!(app.handle_action(Action::Down, now));
    assert!(app.handle_action(Action::Down, now));
    assert!(app.handle_action(Action::Down, now));
    assert_eq!(app.highlight(), 2);
    assert!(app.handle_action(Action::Up, now));
    assert_eq!(app.highlight(), 1);

    assert!(app.handle_action(Action::Select, now));
    let view = app.view().question.unwrap();
    assert!(view.choices[1].selected);
}

#[test]
fn test_pick_out_of_range_is_ignored() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    assert!(!app.handle_action(Action::Pick(4), now));
    assert_eq!(app.controller().session().answered_count(), 0);
}

#[test]
fn test_next_without_answer_shows_prompt_until_cancelled() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    assert!(!app.handle_action(Action::Next, now));
    assert_eq!(app.view().notice.as_deref(), Some(SELECT_PROMPT));
    assert!(draw(&app).contains(SELECT_PROMPT));

    assert!(app.handle_action(Action::Cancel, now));
    assert!(app.view().notice.is_none());
}

#[test]
fn test_previous_restores_highlight_of_recorded_answer() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    app.handle_action(Action::Pick(3), now);
    app.handle_action(Action::Next, now);
    assert_eq!(app.highlight(), 0);

    app.handle_action(Action::Previous, now);
    assert_eq!(app.highlight(), 2);
}

// =============================================================================
// Jump Mode
// =============================================================================

#[test]
fn test_jump_mode_moves_indicator_cursor() {
    let now = Instant::now();
    let mut app = running_app(300, now);

    app.handle_action(Action::JumpMode, now);
    assert_eq!(app.mode(), AppMode::Jumping);
    for _ in 0..5 {
        app.handle_action(Action::Down, now);
    }
    assert_eq!(app.jump_cursor(), 2);

    app.handle_action(Action::Select, now);
    assert_eq!(app.mode(), AppMode::Answering);
    assert_eq!(app.controller().session().cursor(), 2);
}

#[test]
fn test_jump_mode_pick_and_cancel() {
    let now = Instant::now();
    let mut app = running_app(300, now);

    app.handle_action(Action::JumpMode, now);
    app.handle_action(Action::Pick(2), now);
    assert_eq!(app.controller().session().cursor(), 1);
    assert_eq!(app.mode(), AppMode::Answering);

    app.handle_action(Action::JumpMode, now);
    app.handle_action(Action::Down, now);
    app.handle_action(Action::Cancel, now);
    assert_eq!(app.mode(), AppMode::Answering);
    assert_eq!(app.controller().session().cursor(), 1);
}

#[test]
fn test_jump_to_missing_question_reports_status() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    app.handle_action(Action::JumpMode, now);
    assert!(!app.handle_action(Action::Pick(9), now));
    assert!(app.status().is_some());
    assert_eq!(app.mode(), AppMode::Jumping);
}

// =============================================================================
// Submit, Results and Restart
// =============================================================================

#[test]
fn test_cancel_submit_returns_to_question() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    app.handle_action(Action::JumpMode, now);
    app.handle_action(Action::Pick(3), now);
    app.handle_action(Action::Pick(1), now);

    app.handle_action(Action::Next, now);
    assert_eq!(app.mode(), AppMode::ConfirmingSubmit);
    app.handle_action(Action::Cancel, now);
    assert_eq!(app.mode(), AppMode::Answering);
    assert_eq!(app.controller().phase(), Phase::Active);
}

#[test]
fn test_perfect_score_flow() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    for _ in 0..3 {
        let pick = correct_index(&app);
        app.handle_action(Action::Pick(pick), now);
        app.handle_action(Action::Next, now);
    }
    assert_eq!(app.mode(), AppMode::ConfirmingSubmit);
    app.handle_action(Action::Confirm, now);

    assert_eq!(app.mode(), AppMode::Results);
    assert_eq!(app.view().score.unwrap().summary(), "3 / 3 Questions");
    assert!(draw(&app).contains("3 / 3 Questions"));
    assert!(app.controller().store().load().is_none());
}

#[test]
fn test_restart_from_results_loads_new_attempt() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    app.handle_action(Action::JumpMode, now);
    app.handle_action(Action::Pick(3), now);
    app.handle_action(Action::Pick(1), now);
    app.handle_action(Action::Next, now);
    app.handle_action(Action::Confirm, now);
    assert_eq!(app.mode(), AppMode::Results);

    app.handle_action(Action::Restart, now);
    assert_eq!(app.mode(), AppMode::Loading);
    assert!(app.fetch_pending());
    assert!(draw(&app).contains("Loading questions..."));

    app.run_pending_fetch(now);
    assert_eq!(app.mode(), AppMode::Answering);
    assert_eq!(app.controller().session().answered_count(), 0);
    assert_eq!(app.controller().session().remaining_seconds(), 300);
}

#[test]
fn test_reset_clears_answers() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    app.handle_action(Action::Pick(1), now);
    app.handle_action(Action::Next, now);

    app.handle_action(Action::Reset, now);
    assert_eq!(app.mode(), AppMode::Answering);
    assert_eq!(app.controller().session().cursor(), 0);
    assert_eq!(app.controller().session().answered_count(), 0);
}

// =============================================================================
// Timer
// =============================================================================

#[test]
fn test_expiry_shows_results_and_blocks_reset() {
    let now = Instant::now();
    let mut app = running_app(2, now);
    app.handle_action(Action::Pick(1), now);

    assert_eq!(app.on_tick(now + Duration::from_secs(1)), TickOutcome::Running(1));
    assert!(draw(&app).contains("00:01"));
    assert_eq!(app.on_tick(now + Duration::from_secs(2)), TickOutcome::Expired);
    assert_eq!(app.mode(), AppMode::Results);

    assert!(!app.handle_action(Action::Reset, now));
    assert!(app.status().unwrap().contains("Time is up"));
    assert_eq!(app.mode(), AppMode::Results);
}

// =============================================================================
// Help, Quit and Resume
// =============================================================================

#[test]
fn test_help_overlay_swallows_navigation() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    app.handle_action(Action::Help, now);
    assert!(app.show_help());
    assert!(!app.handle_action(Action::Down, now));
    assert_eq!(app.highlight(), 0);

    app.handle_action(Action::Cancel, now);
    assert!(!app.show_help());
    assert_eq!(app.mode(), AppMode::Answering);
}

#[test]
fn test_quit_saves_progress() {
    let now = Instant::now();
    let mut app = running_app(300, now);
    app.handle_action(Action::Pick(2), now);
    app.handle_action(Action::Quit, now);

    assert!(app.should_quit());
    assert!(!app.controller().is_timer_running());
    let saved = app.controller().store().load().unwrap();
    assert!(saved.is_answered(0));
}

#[test]
fn test_resume_highlights_recorded_answer() {
    let mut session = QuizSession::new(120);
    session
        .populate(
            questions()
                .iter()
                .map(|q| normalize(q).unwrap())
                .collect(),
        )
        .unwrap();
    session.jump_to(1).unwrap();
    let answer = session.current_question().unwrap().choices()[2].clone();
    session.record_answer(&answer).unwrap();
    let mut store = SessionStore::new(MemoryStore::new(), 120);
    store.save(&session).unwrap();

    let mut app = app_with_store(store, 120);
    assert_eq!(app.start(Instant::now()), Startup::Resumed);
    assert!(!app.fetch_pending());
    assert_eq!(app.mode(), AppMode::Answering);
    assert_eq!(app.highlight(), 2);
    assert!(draw(&app).contains("Question 2 / 3"));
}

#[test]
fn test_fetch_failure_then_retry() {
    let controller = SessionController::new(
        StaticSource::default(),
        SessionStore::new(MemoryStore::new(), 60),
        ControllerSettings {
            time_limit_secs: 60,
            question_count: 3,
        },
    );
    let mut app = App::new(controller);
    let now = Instant::now();
    app.start(now);
    app.run_pending_fetch(now);

    assert_eq!(app.mode(), AppMode::Loading);
    assert!(draw(&app).contains("Could not load questions"));
    assert!(!app.handle_action(Action::Next, now));

    assert!(app.handle_action(Action::Restart, now));
    assert!(app.fetch_pending());
}
