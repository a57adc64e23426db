//! Terminal User Interface module.
//!
//! The interactive quiz screen, built with ratatui on the crossterm backend.
//!
//! # Overview
//!
//! - [`app`]: screen state on top of the session controller (modes, highlight, jump cursor)
//! - [`events`]: terminal events to [`Action`]s
//! - [`keybindings`]: profiles and custom key overrides
//! - [`theme`]: color palettes
//! - [`ui`]: ratatui rendering
//! - [`run`]: terminal setup and the main loop
//!
//! # Architecture
//!
//! The TUI follows a unidirectional data flow:
//! 1. Events are captured from the terminal (crossterm)
//! 2. Events are translated to Actions
//! 3. Actions go through the App into the controller
//! 4. The UI renders the controller's projections
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use timed_quiz::controller::{ControllerSettings, SessionController};
//! use timed_quiz::quiz::RawQuestion;
//! use timed_quiz::store::{MemoryStore, SessionStore};
//! use timed_quiz::supply::StaticSource;
//! use timed_quiz::tui::{Action, App, AppMode};
//!
//! let source = StaticSource::new(vec![RawQuestion::new("Largest planet?", "Jupiter", ["Mars"])]);
//! let store = SessionStore::new(MemoryStore::new(), 300);
//! let mut app = App::new(SessionController::new(source, store, ControllerSettings::default()));
//! app.start(Instant::now());
//! app.run_pending_fetch(Instant::now());
//!
//! app.handle_action(Action::Pick(1), Instant::now());
//! app.handle_action(Action::Next, Instant::now());
//! assert_eq!(app.mode(), AppMode::ConfirmingSubmit);
//! ```

pub mod app;
pub mod events;
pub mod keybindings;
pub mod run;
pub mod theme;
pub mod ui;

pub use app::{Action, App, AppMode};
pub use events::{EventError, EventHandler};
pub use keybindings::{KeyBindings, KeybindingError, KeybindingProfile};
pub use run::{run_tui, TuiError, TuiResult};
pub use theme::Theme;
pub use ui::{render, truncate_string};
