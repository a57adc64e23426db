//! TUI main loop.
//!
//! # Terminal Management
//!
//! The TUI takes over the terminal by:
//! - Enabling raw mode (unbuffered input, no echo)
//! - Entering the alternate screen buffer
//! - Hiding the cursor
//!
//! All these changes are reverted on exit, including on error and panic.
//!
//! # Event Loop
//!
//! 1. Draw the current state
//! 2. Run a scheduled fetch (after the loading frame is on screen)
//! 3. Poll for a key until the next frame or the next clock tick, whichever
//!    comes first
//! 4. Apply due clock ticks
//!
//! # Example
//!
//! ```no_run
//! use timed_quiz::controller::{ControllerSettings, SessionController};
//! use timed_quiz::store::{FileStore, SessionStore};
//! use timed_quiz::supply::{OpenTdbSource, DEFAULT_API_URL};
//! use timed_quiz::tui::{run_tui, App};
//! use std::time::Duration;
//!
//! let source = OpenTdbSource::new(DEFAULT_API_URL, Duration::from_secs(15)).unwrap();
//! let store = SessionStore::new(FileStore::new("/tmp/quiz"), 300);
//! let controller = SessionController::new(source, store, ControllerSettings::default());
//! let mut app = App::new(controller);
//! run_tui(&mut app, None).unwrap();
//! ```

use std::io::{self, Stdout};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use thiserror::Error;

use super::app::App;
use super::events::EventHandler;
use super::ui::render;
use crate::store::KeyValueStore;
use crate::supply::QuestionSource;

/// Longest wait for input between two frames (~60 FPS).
const POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// Error type for TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    /// I/O error from terminal operations.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Event handling error.
    #[error("event error: {0}")]
    Event(#[from] super::events::EventError),

    /// The TUI was interrupted by a shutdown signal.
    #[error("interrupted by shutdown signal")]
    Interrupted,
}

/// Result type for TUI operations.
pub type TuiResult<T> = Result<T, TuiError>;

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive TUI until the user quits.
///
/// Call [`App::start`] (or [`App::start_fresh`]) first. Progress is saved on
/// every way out.
///
/// # Errors
///
/// Returns `TuiError::Io` for terminal I/O errors, `TuiError::Event` for
/// input errors and `TuiError::Interrupted` if `shutdown_flag` was raised.
pub fn run_tui<Q: QuestionSource, S: KeyValueStore>(
    app: &mut App<Q, S>,
    shutdown_flag: Option<Arc<AtomicBool>>,
) -> TuiResult<()> {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let result = run_tui_inner(app, shutdown_flag.as_deref());

    let _ = panic::take_hook();
    result
}

fn run_tui_inner<Q: QuestionSource, S: KeyValueStore>(
    app: &mut App<Q, S>,
    shutdown_flag: Option<&AtomicBool>,
) -> TuiResult<()> {
    let mut terminal = setup_terminal()?;
    let events = EventHandler::with_bindings(app.keybindings().clone());

    let result = event_loop(&mut terminal, app, &events, shutdown_flag);
    if result.is_err() && !app.should_quit() {
        app.shutdown();
    }

    restore_terminal()?;
    match &result {
        Ok(()) => log::info!("TUI exited normally"),
        Err(e) => log::info!("TUI exited: {e}"),
    }
    result
}

fn event_loop<Q: QuestionSource, S: KeyValueStore>(
    terminal: &mut Terminal,
    app: &mut App<Q, S>,
    events: &EventHandler,
    shutdown_flag: Option<&AtomicBool>,
) -> TuiResult<()> {
    loop {
        if shutdown_flag.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            log::info!("Shutdown signal received, exiting TUI");
            app.shutdown();
            return Err(TuiError::Interrupted);
        }

        if app.should_quit() {
            log::debug!("App requested quit");
            return Ok(());
        }

        terminal.draw(|frame| render(frame, app))?;

        if app.fetch_pending() {
            app.run_pending_fetch(Instant::now());
            continue;
        }

        let timeout = poll_timeout(app, Instant::now());
        if let Some(action) = events.poll(timeout)? {
            if !app.handle_action(action, Instant::now()) {
                log::trace!("Action not handled: {action:?}");
            }
        }

        app.on_tick(Instant::now());
    }
}

/// Wait no longer than one frame or until the next tick is due.
fn poll_timeout<Q: QuestionSource, S: KeyValueStore>(app: &App<Q, S>, now: Instant) -> Duration {
    app.controller()
        .time_until_next_tick(now)
        .map_or(POLL_TIMEOUT, |until_tick| until_tick.min(POLL_TIMEOUT))
}

fn setup_terminal() -> TuiResult<Terminal> {
    log::debug!("Setting up terminal for TUI");

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    log::debug!("Terminal setup complete");
    Ok(terminal)
}

/// Restore the terminal to its original state. Best effort.
fn restore_terminal() -> TuiResult<()> {
    log::debug!("Restoring terminal");

    let _ = terminal::disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);

    Ok(())
}
