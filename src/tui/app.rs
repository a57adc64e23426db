//! TUI application state management.
//!
//! # Overview
//!
//! [`App`] wraps the [`SessionController`] with the state that only matters on
//! screen:
//! - the current [`AppMode`] (loading, answering, jumping, confirming, results)
//! - which choice is highlighted
//! - the indicator cursor while jumping
//! - whether the help overlay is open
//!
//! Key events become [`Action`]s (see [`KeyBindings`]); actions go through
//! [`App::handle_action`], which calls into the controller and then re-derives
//! the mode from the session phase.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use timed_quiz::controller::{ControllerSettings, SessionController};
//! use timed_quiz::quiz::RawQuestion;
//! use timed_quiz::store::{MemoryStore, SessionStore};
//! use timed_quiz::supply::StaticSource;
//! use timed_quiz::tui::app::{Action, App, AppMode};
//!
//! let source = StaticSource::new(vec![
//!     RawQuestion::new("2 + 2?", "4", ["3", "5", "22"]),
//! ]);
//! let store = SessionStore::new(MemoryStore::new(), 300);
//! let controller = SessionController::new(source, store, ControllerSettings::default());
//! let mut app = App::new(controller);
//!
//! app.start(Instant::now());
//! assert_eq!(app.mode(), AppMode::Loading);
//! app.run_pending_fetch(Instant::now());
//! assert_eq!(app.mode(), AppMode::Answering);
//!
//! app.handle_action(Action::Select, Instant::now());
//! assert!(app.view().indicators[0].answered);
//! ```

use std::str::FromStr;
use std::time::Instant;

use crossterm::event::KeyEvent;

use super::keybindings::KeyBindings;
use super::theme::Theme;
use crate::controller::{QuizView, SessionController, Startup};
use crate::error::QuizError;
use crate::quiz::{Advance, Phase, TickOutcome};
use crate::store::KeyValueStore;
use crate::supply::QuestionSource;

/// Application mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Waiting for questions, or showing why they could not be loaded
    #[default]
    Loading,
    /// Answering the displayed question
    Answering,
    /// Moving the indicator cursor to pick a question
    Jumping,
    /// Asking whether to submit from the last question
    ConfirmingSubmit,
    /// Showing the final score
    Results,
    /// Application is quitting
    Quitting,
}

impl AppMode {
    /// Whether a question is on screen.
    #[must_use]
    pub fn shows_question(&self) -> bool {
        matches!(self, Self::Answering | Self::Jumping | Self::ConfirmingSubmit)
    }

    /// Check if the application is done (quitting).
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Quitting)
    }
}

/// User action triggered by keyboard input.
///
/// What an action does depends on the mode; `Select` picks the highlighted
/// choice while answering but confirms the jump while jumping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move the highlight up
    Up,
    /// Move the highlight down
    Down,
    /// Act on the highlighted item
    Select,
    /// Choose the n-th choice (1-based) directly
    Pick(u8),
    /// Next question, or submit on the last one
    Next,
    /// Previous question
    Previous,
    /// Toggle question indicator navigation
    JumpMode,
    /// Clear all answers, keeping questions and time
    Reset,
    /// Discard the attempt and load new questions
    Restart,
    /// Confirm the open prompt
    Confirm,
    /// Close the open prompt
    Cancel,
    /// Toggle the help overlay
    Help,
    /// Save and quit
    Quit,
}

impl Action {
    /// Every action, with all nine `Pick` slots.
    #[must_use]
    pub fn all() -> Vec<Action> {
        let mut actions = vec![
            Self::Up,
            Self::Down,
            Self::Select,
            Self::Next,
            Self::Previous,
            Self::JumpMode,
            Self::Reset,
            Self::Restart,
            Self::Confirm,
            Self::Cancel,
            Self::Help,
            Self::Quit,
        ];
        actions.extend((1..=9).map(Self::Pick));
        actions
    }

    /// Config name, e.g. `jump_mode` or `pick_2`.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Up => "up".into(),
            Self::Down => "down".into(),
            Self::Select => "select".into(),
            Self::Pick(n) => format!("pick_{n}"),
            Self::Next => "next".into(),
            Self::Previous => "previous".into(),
            Self::JumpMode => "jump_mode".into(),
            Self::Reset => "reset".into(),
            Self::Restart => "restart".into(),
            Self::Confirm => "confirm".into(),
            Self::Cancel => "cancel".into(),
            Self::Help => "help".into(),
            Self::Quit => "quit".into(),
        }
    }

    /// All config names.
    #[must_use]
    pub fn all_names() -> Vec<String> {
        Self::all().iter().map(Action::name).collect()
    }

    /// Short label for hints.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Up => "Highlight up",
            Self::Down => "Highlight down",
            Self::Select => "Choose / confirm",
            Self::Pick(_) => "Choose by number",
            Self::Next => "Next / Submit",
            Self::Previous => "Previous",
            Self::JumpMode => "Jump to question",
            Self::Reset => "Clear answers",
            Self::Restart => "Start new quiz",
            Self::Confirm => "Confirm",
            Self::Cancel => "Cancel",
            Self::Help => "Help",
            Self::Quit => "Save and quit",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase().replace('-', "_");
        let action = match lower.as_str() {
            "up" => Self::Up,
            "down" => Self::Down,
            "select" | "choose" => Self::Select,
            "next" | "submit" => Self::Next,
            "previous" | "prev" => Self::Previous,
            "jump_mode" | "jump" => Self::JumpMode,
            "reset" => Self::Reset,
            "restart" | "start_new" => Self::Restart,
            "confirm" => Self::Confirm,
            "cancel" => Self::Cancel,
            "help" => Self::Help,
            "quit" => Self::Quit,
            other => {
                let n = other
                    .strip_prefix("pick_")
                    .and_then(|n| n.parse::<u8>().ok())
                    .filter(|n| (1..=9).contains(n))
                    .ok_or_else(|| s.to_string())?;
                Self::Pick(n)
            }
        };
        Ok(action)
    }
}

/// TUI application state.
///
/// Only touched from the main thread; the terminal is not thread-safe.
pub struct App<Q, S> {
    /// Session owner
    controller: SessionController<Q, S>,
    /// Current application mode
    mode: AppMode,
    /// Highlighted choice of the displayed question
    highlight: usize,
    /// Indicator cursor in jump mode
    jump_cursor: usize,
    /// Help overlay visible
    show_help: bool,
    /// A fetch should run after the next draw
    fetch_pending: bool,
    /// Transient status line
    status: Option<String>,
    /// Key mapping, also used for hints
    bindings: KeyBindings,
    /// Color palette
    theme: Theme,
    /// ASCII borders
    accessible: bool,
}

impl<Q: QuestionSource, S: KeyValueStore> App<Q, S> {
    /// Create an app in loading mode with default bindings and theme.
    #[must_use]
    pub fn new(controller: SessionController<Q, S>) -> Self {
        Self {
            controller,
            mode: AppMode::Loading,
            highlight: 0,
            jump_cursor: 0,
            show_help: false,
            fetch_pending: false,
            status: None,
            bindings: KeyBindings::default(),
            theme: Theme::default(),
            accessible: false,
        }
    }

    /// Use these key bindings.
    #[must_use]
    pub fn with_keybindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Use this theme.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Draw ASCII borders.
    #[must_use]
    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    // ==================== Lifecycle ====================

    /// Resume saved progress, or schedule a fetch.
    ///
    /// The fetch itself runs in [`run_pending_fetch`](Self::run_pending_fetch)
    /// so the loading screen can be drawn first.
    pub fn start(&mut self, now: Instant) -> Startup {
        let startup = self.controller.initialize(now);
        self.fetch_pending = startup == Startup::NeedsFetch;
        self.sync_mode();
        startup
    }

    /// Discard saved progress and schedule a fetch.
    pub fn start_fresh(&mut self) {
        self.begin_restart();
    }

    /// Whether a fetch is waiting to run.
    #[must_use]
    pub fn fetch_pending(&self) -> bool {
        self.fetch_pending
    }

    /// Run the scheduled fetch, if any.
    pub fn run_pending_fetch(&mut self, now: Instant) {
        if !self.fetch_pending {
            return;
        }
        self.fetch_pending = false;
        if self.controller.fetch_questions(now).is_ok() {
            self.highlight = 0;
        }
        self.sync_mode();
    }

    /// Apply due timer ticks.
    pub fn on_tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.controller.poll_timer(now);
        if outcome == TickOutcome::Expired {
            log::debug!("Time expired, showing results");
            self.sync_mode();
        }
        outcome
    }

    /// Save progress and stop the clock before leaving.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.controller.suspend() {
            log::error!("Could not save progress: {e}");
        }
        self.set_mode(AppMode::Quitting);
    }

    // ==================== Accessors ====================

    /// Get the current application mode.
    #[must_use]
    pub fn mode(&self) -> AppMode {
        self.mode
    }

    /// Set the application mode.
    pub fn set_mode(&mut self, mode: AppMode) {
        if self.mode != mode {
            log::debug!("Mode transition: {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Whether the main loop should exit.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.mode.is_done()
    }

    /// The session controller.
    #[must_use]
    pub fn controller(&self) -> &SessionController<Q, S> {
        &self.controller
    }

    /// Frame projection of the session.
    #[must_use]
    pub fn view(&self) -> QuizView {
        self.controller.snapshot()
    }

    /// Highlighted choice index.
    #[must_use]
    pub fn highlight(&self) -> usize {
        self.highlight
    }

    /// Indicator cursor in jump mode.
    #[must_use]
    pub fn jump_cursor(&self) -> usize {
        self.jump_cursor
    }

    /// Whether the help overlay is open.
    #[must_use]
    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// Transient status line.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Active key bindings.
    #[must_use]
    pub fn keybindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Active theme.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Whether ASCII borders are on.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    /// Resolve a key event with the active bindings.
    #[must_use]
    pub fn resolve_key(&self, key: &KeyEvent) -> Option<Action> {
        self.bindings.resolve(key)
    }

    // ==================== Action Handling ====================

    /// Handle a user action. Returns true if it did something.
    pub fn handle_action(&mut self, action: Action, now: Instant) -> bool {
        log::trace!("Handling action: {:?} in mode {:?}", action, self.mode);

        match action {
            Action::Quit => {
                self.shutdown();
                return true;
            }
            Action::Help => {
                self.show_help = !self.show_help;
                return true;
            }
            Action::Cancel if self.show_help => {
                self.show_help = false;
                return true;
            }
            _ => {}
        }
        if self.show_help {
            return false;
        }

        self.status = None;
        let handled = match self.mode {
            AppMode::Loading => self.handle_loading(action),
            AppMode::Answering => self.handle_answering(action, now),
            AppMode::Jumping => self.handle_jumping(action),
            AppMode::ConfirmingSubmit => self.handle_confirming(action),
            AppMode::Results => self.handle_results(action, now),
            AppMode::Quitting => false,
        };
        self.sync_mode();
        handled
    }

    fn handle_loading(&mut self, action: Action) -> bool {
        match action {
            Action::Restart | Action::Select if !self.fetch_pending => {
                self.begin_restart();
                true
            }
            _ => false,
        }
    }

    fn handle_answering(&mut self, action: Action, now: Instant) -> bool {
        match action {
            Action::Up => {
                self.highlight = self.highlight.saturating_sub(1);
                true
            }
            Action::Down => {
                let last = self.choice_count().saturating_sub(1);
                self.highlight = (self.highlight + 1).min(last);
                true
            }
            Action::Select => {
                let index = self.highlight;
                self.choose(index)
            }
            Action::Pick(n) => {
                let index = usize::from(n.saturating_sub(1));
                if index < self.choice_count() {
                    self.highlight = index;
                    self.choose(index)
                } else {
                    false
                }
            }
            Action::Next => match self.controller.next() {
                Ok(Advance::Moved(_)) => {
                    self.refresh_highlight();
                    true
                }
                Ok(Advance::ReadyToFinish) => {
                    self.set_mode(AppMode::ConfirmingSubmit);
                    true
                }
                Err(e) => {
                    log::debug!("Next rejected: {e}");
                    false
                }
            },
            Action::Previous => match self.controller.previous() {
                Ok(moved) => {
                    self.refresh_highlight();
                    moved
                }
                Err(e) => self.report(&e),
            },
            Action::JumpMode => {
                self.jump_cursor = self.controller.session().cursor();
                self.set_mode(AppMode::Jumping);
                true
            }
            Action::Reset => self.reset(now),
            Action::Restart => {
                self.begin_restart();
                true
            }
            Action::Cancel => {
                self.controller.dismiss_notice();
                true
            }
            _ => false,
        }
    }

    fn handle_jumping(&mut self, action: Action) -> bool {
        let last = self.controller.session().len().saturating_sub(1);
        match action {
            Action::Up | Action::Previous => {
                self.jump_cursor = self.jump_cursor.saturating_sub(1);
                true
            }
            Action::Down | Action::Next => {
                self.jump_cursor = (self.jump_cursor + 1).min(last);
                true
            }
            Action::Pick(n) => {
                let index = usize::from(n.saturating_sub(1));
                self.jump(index)
            }
            Action::Select | Action::Confirm => {
                let index = self.jump_cursor;
                self.jump(index)
            }
            Action::Cancel | Action::JumpMode => {
                self.set_mode(AppMode::Answering);
                true
            }
            _ => false,
        }
    }

    fn handle_confirming(&mut self, action: Action) -> bool {
        match action {
            Action::Confirm | Action::Select => match self.controller.submit() {
                Ok(score) => {
                    log::debug!("Submitted with score {score}");
                    true
                }
                Err(e) => self.report(&e),
            },
            Action::Cancel => {
                self.set_mode(AppMode::Answering);
                true
            }
            _ => false,
        }
    }

    fn handle_results(&mut self, action: Action, now: Instant) -> bool {
        match action {
            Action::Restart | Action::Select => {
                self.begin_restart();
                true
            }
            Action::Reset => self.reset(now),
            _ => false,
        }
    }

    // ==================== Internals ====================

    fn choose(&mut self, index: usize) -> bool {
        match self.controller.select_choice(index) {
            Ok(()) => true,
            Err(e) => self.report(&e),
        }
    }

    fn jump(&mut self, index: usize) -> bool {
        match self.controller.jump_to(index) {
            Ok(()) => {
                self.refresh_highlight();
                self.set_mode(AppMode::Answering);
                true
            }
            Err(e) => self.report(&e),
        }
    }

    fn reset(&mut self, now: Instant) -> bool {
        match self.controller.reset(now) {
            Ok(()) => {
                self.highlight = 0;
                self.set_mode(AppMode::Answering);
                true
            }
            Err(QuizError::TimeExpired) => {
                self.status = Some("Time is up; start a new quiz instead".to_string());
                false
            }
            Err(e) => self.report(&e),
        }
    }

    fn begin_restart(&mut self) {
        self.controller.begin_restart();
        self.fetch_pending = true;
        self.highlight = 0;
        self.set_mode(AppMode::Loading);
    }

    fn report(&mut self, error: &QuizError) -> bool {
        log::debug!("Action rejected: {error}");
        self.status = Some(error.to_string());
        false
    }

    fn choice_count(&self) -> usize {
        self.controller
            .session()
            .current_question()
            .map_or(0, |q| q.choices().len())
    }

    /// Highlight the recorded answer of the displayed question, or the first choice.
    fn refresh_highlight(&mut self) {
        let session = self.controller.session();
        self.highlight = session
            .current_answer()
            .and_then(|answer| {
                session
                    .current_question()
                    .and_then(|q| q.choices().iter().position(|c| c == answer))
            })
            .unwrap_or(0);
    }

    /// Re-derive the mode from the session phase.
    fn sync_mode(&mut self) {
        if self.mode.is_done() {
            return;
        }
        let mode = match self.controller.phase() {
            Phase::Loading => AppMode::Loading,
            Phase::Finished => AppMode::Results,
            Phase::Active => match self.mode {
                AppMode::Jumping | AppMode::ConfirmingSubmit => self.mode,
                _ => AppMode::Answering,
            },
        };
        if mode == AppMode::Answering && self.mode != AppMode::Answering {
            self.refresh_highlight();
        }
        self.set_mode(mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerSettings;
    use crate::quiz::RawQuestion;
    use crate::store::{MemoryStore, SessionStore};
    use crate::supply::StaticSource;

    fn app() -> App<StaticSource, MemoryStore> {
        let source = StaticSource::new(vec![
            RawQuestion::new("Q1", "A", ["x", "y"]),
            RawQuestion::new("Q2", "B", ["x", "y"]),
        ]);
        let controller = SessionController::new(
            source,
            SessionStore::new(MemoryStore::new(), 300),
            ControllerSettings {
                time_limit_secs: 300,
                question_count: 2,
            },
        );
        let mut app = App::new(controller);
        app.start(Instant::now());
        app.run_pending_fetch(Instant::now());
        app
    }

    #[test]
    fn test_action_names_round_trip() {
        for action in Action::all() {
            assert_eq!(action.name().parse::<Action>(), Ok(action));
        }
        assert_eq!("pick_0".parse::<Action>(), Err("pick_0".to_string()));
        assert!("explode".parse::<Action>().is_err());
    }

    #[test]
    fn test_start_enters_answering() {
        let app = app();
        assert_eq!(app.mode(), AppMode::Answering);
        assert_eq!(app.highlight(), 0);
    }

    #[test]
    fn test_highlight_clamps() {
        let mut app = app();
        let now = Instant::now();
        app.handle_action(Action::Up, now);
        assert_eq!(app.highlight(), 0);
        for _ in 0..10 {
            app.handle_action(Action::Down, now);
        }
        assert_eq!(app.highlight(), 2);
    }

    #[test]
    fn test_next_without_answer_keeps_question() {
        let mut app = app();
        assert!(!app.handle_action(Action::Next, Instant::now()));
        assert_eq!(app.controller().session().cursor(), 0);
        assert_eq!(app.view().notice.as_deref(), Some("Please select an option"));
    }

    #[test]
    fn test_submit_flow() {
        let mut app = app();
        let now = Instant::now();
        app.handle_action(Action::Pick(1), now);
        app.handle_action(Action::Next, now);
        app.handle_action(Action::Pick(1), now);
        app.handle_action(Action::Next, now);
        assert_eq!(app.mode(), AppMode::ConfirmingSubmit);

        app.handle_action(Action::Cancel, now);
        assert_eq!(app.mode(), AppMode::Answering);

        app.handle_action(Action::Next, now);
        app.handle_action(Action::Confirm, now);
        assert_eq!(app.mode(), AppMode::Results);
        assert!(app.view().score.is_some());
    }

    #[test]
    fn test_jump_mode() {
        let mut app = app();
        let now = Instant::now();
        app.handle_action(Action::JumpMode, now);
        assert_eq!(app.mode(), AppMode::Jumping);
        app.handle_action(Action::Down, now);
        assert_eq!(app.jump_cursor(), 1);
        app.handle_action(Action::Select, now);
        assert_eq!(app.mode(), AppMode::Answering);
        assert_eq!(app.controller().session().cursor(), 1);
    }

    #[test]
    fn test_help_swallows_other_actions() {
        let mut app = app();
        let now = Instant::now();
        app.handle_action(Action::Help, now);
        assert!(app.show_help());
        assert!(!app.handle_action(Action::Down, now));
        assert_eq!(app.highlight(), 0);
        app.handle_action(Action::Cancel, now);
        assert!(!app.show_help());
    }

    #[test]
    fn test_quit_saves() {
        let mut app = app();
        app.handle_action(Action::Pick(2), Instant::now());
        app.handle_action(Action::Quit, Instant::now());
        assert!(app.should_quit());
        assert!(app.controller().store().load().is_some());
    }
}
