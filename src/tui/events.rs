//! TUI event handling with crossterm.
//!
//! [`EventHandler`] polls the terminal with a timeout and turns key presses
//! into [`Action`]s through its [`KeyBindings`]. Resize and mouse events are
//! consumed and ignored; the next frame redraws at the new size anyway.

use std::time::Duration;

use crossterm::event::{self, Event};
use thiserror::Error;

use super::app::Action;
use super::keybindings::{KeyBindings, KeybindingProfile};

/// Error reading terminal events.
#[derive(Debug, Error)]
pub enum EventError {
    /// Polling or reading the event stream failed.
    #[error("failed to read terminal event: {0}")]
    Read(#[from] std::io::Error),
}

/// Translates terminal events into actions.
#[derive(Debug, Clone, Default)]
pub struct EventHandler {
    bindings: KeyBindings,
}

impl EventHandler {
    /// Handler with the Universal profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler with a preset profile.
    #[must_use]
    pub fn with_profile(profile: KeybindingProfile) -> Self {
        Self::with_bindings(KeyBindings::from_profile(profile))
    }

    /// Handler with prepared bindings, custom overrides included.
    #[must_use]
    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    /// Bindings in use.
    #[must_use]
    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Wait up to `timeout` for an event and translate it.
    ///
    /// Returns `Ok(None)` on timeout or for events that map to no action.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Read`] if the terminal cannot be read.
    pub fn poll(&self, timeout: Duration) -> Result<Option<Action>, EventError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let event = event::read()?;
        Ok(self.translate(&event))
    }

    /// Map one event to an action.
    #[must_use]
    pub fn translate(&self, event: &Event) -> Option<Action> {
        match event {
            Event::Key(key) => {
                let action = self.bindings.resolve(key);
                log::trace!("Key {:?} -> {:?}", key.code, action);
                action
            }
            _ => None,
        }
    }
}
