//! Keybinding configuration for the TUI.
//!
//! Keys map to [`Action`]s through a profile plus optional per-action
//! overrides from the config file. The default profile (Universal) accepts
//! both vim-style (hjkl) and arrow keys.
//!
//! # Profiles
//!
//! - [`KeybindingProfile::Universal`]: vim-style AND arrow keys (default)
//! - [`KeybindingProfile::Vim`]: vim-style keys only (hjkl)
//! - [`KeybindingProfile::Standard`]: arrow keys and standard shortcuts only
//!
//! Keys shared by every profile: `Enter`/`Space` select, `1`-`9` pick a
//! choice, `n`/`p` next and previous, `r` reset, `s` start new, `y` confirm,
//! `Esc` cancel, `?`/`F1` help, `q`/`Ctrl+c` save and quit.
//!
//! # Example
//!
//! ```
//! use timed_quiz::tui::keybindings::{KeyBindings, KeybindingProfile};
//! use timed_quiz::tui::Action;
//! use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
//!
//! let bindings = KeyBindings::from_profile(KeybindingProfile::Universal);
//!
//! let j_key = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
//! let down_key = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
//!
//! assert_eq!(bindings.resolve(&j_key), Some(Action::Down));
//! assert_eq!(bindings.resolve(&down_key), Some(Action::Down));
//! ```

use std::collections::HashMap;

use clap::ValueEnum;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::Action;
use crate::config::suggest;

/// Keybinding profile presets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Hash,
    ValueEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum KeybindingProfile {
    /// Both vim-style and arrow key navigation
    #[default]
    Universal,
    /// Vim-style navigation using hjkl keys
    Vim,
    /// Arrow keys and standard shortcuts only
    Standard,
}

impl KeybindingProfile {
    /// Get the display name for the profile.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Universal => "Universal (Vim + Arrow keys)",
            Self::Vim => "Vim (hjkl)",
            Self::Standard => "Standard (Arrow keys)",
        }
    }

    /// Get all available profiles.
    #[must_use]
    pub fn all() -> &'static [KeybindingProfile] {
        &[Self::Universal, Self::Vim, Self::Standard]
    }
}

impl std::fmt::Display for KeybindingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Universal => "universal",
            Self::Vim => "vim",
            Self::Standard => "standard",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for KeybindingProfile {
    type Err = KeybindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "universal" => Ok(Self::Universal),
            "vim" => Ok(Self::Vim),
            "standard" | "arrows" | "arrow" => Ok(Self::Standard),
            _ => Err(KeybindingError::InvalidProfile(s.to_string())),
        }
    }
}

/// Error type for keybinding operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeybindingError {
    /// Invalid profile name.
    #[error("Unknown keybinding profile: '{0}'. Valid profiles: universal, vim, standard")]
    InvalidProfile(String),

    /// Invalid key specification.
    #[error("Invalid key specification: '{0}'. Examples: 'j', 'Ctrl+c', 'Down', 'Space', 'F1'")]
    InvalidKeySpec(String),

    /// Invalid action name.
    #[error("Unknown action: '{name}'{}", suggestion_hint(.suggestion.as_deref()))]
    InvalidAction {
        /// Name as written in the config.
        name: String,
        /// Closest valid action name.
        suggestion: Option<String>,
    },
}

fn suggestion_hint(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!(", did you mean '{s}'?"),
        None => format!(". Valid actions: {}", Action::all_names().join(", ")),
    }
}

/// Maps each [`Action`] to the key events that trigger it.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    profile: KeybindingProfile,
    action_keys: HashMap<Action, Vec<KeyEvent>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_profile(KeybindingProfile::Universal)
    }
}

impl KeyBindings {
    /// Create keybindings from a specific profile.
    #[must_use]
    pub fn from_profile(profile: KeybindingProfile) -> Self {
        let mut action_keys = Self::common_bindings();
        let (vim, arrows) = match profile {
            KeybindingProfile::Universal => (true, true),
            KeybindingProfile::Vim => (true, false),
            KeybindingProfile::Standard => (false, true),
        };
        if vim {
            Self::add(&mut action_keys, Action::Up, [KeyCode::Char('k')]);
            Self::add(&mut action_keys, Action::Down, [KeyCode::Char('j')]);
            Self::add(&mut action_keys, Action::Next, [KeyCode::Char('l')]);
            Self::add(&mut action_keys, Action::Previous, [KeyCode::Char('h')]);
            Self::add(&mut action_keys, Action::JumpMode, [KeyCode::Char('g')]);
        }
        if arrows {
            Self::add(&mut action_keys, Action::Up, [KeyCode::Up]);
            Self::add(&mut action_keys, Action::Down, [KeyCode::Down]);
            Self::add(&mut action_keys, Action::Next, [KeyCode::Right]);
            Self::add(&mut action_keys, Action::Previous, [KeyCode::Left]);
            Self::add(&mut action_keys, Action::JumpMode, [KeyCode::Tab]);
        }

        Self {
            profile,
            action_keys,
        }
    }

    /// Get the keybinding profile.
    #[must_use]
    pub fn profile(&self) -> KeybindingProfile {
        self.profile
    }

    /// Resolve a key press to an action. Release and repeat events are ignored.
    #[must_use]
    pub fn resolve(&self, key: &KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        self.action_keys
            .iter()
            .find(|(_, keys)| keys.iter().any(|k| Self::key_matches(k, key)))
            .map(|(action, _)| *action)
    }

    /// Matches code and modifiers, ignoring kind and state.
    fn key_matches(target: &KeyEvent, actual: &KeyEvent) -> bool {
        target.code == actual.code && target.modifiers == actual.modifiers
    }

    /// Keys bound to `action`, empty if none.
    #[must_use]
    pub fn keys_for_action(&self, action: &Action) -> &[KeyEvent] {
        self.action_keys
            .get(action)
            .map_or(&[], |keys| keys.as_slice())
    }

    /// The first key bound to `action`, formatted for hints.
    #[must_use]
    pub fn key_hint(&self, action: &Action) -> String {
        self.keys_for_action(action)
            .first()
            .map_or_else(String::new, Self::format_key)
    }

    /// Up to `max` keys bound to `action`, joined with `/`.
    #[must_use]
    pub fn key_hints(&self, action: &Action, max: usize) -> String {
        self.keys_for_action(action)
            .iter()
            .take(max)
            .map(Self::format_key)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Format a key event as a human-readable string.
    #[must_use]
    pub fn format_key(key: &KeyEvent) -> String {
        let mut parts = Vec::new();

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl");
        }
        if key.modifiers.contains(KeyModifiers::ALT) {
            parts.push("Alt");
        }
        if key.modifiers.contains(KeyModifiers::SHIFT) && !matches!(key.code, KeyCode::Char(_)) {
            parts.push("Shift");
        }

        let key_name = match key.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::PageUp => "PgUp".to_string(),
            KeyCode::PageDown => "PgDn".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "Shift+Tab".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::Delete => "Delete".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            _ => "?".to_string(),
        };

        if parts.is_empty() {
            key_name
        } else {
            parts.push(&key_name);
            parts.join("+")
        }
    }

    /// Parse a key specification such as `j`, `Space`, `Down`, `F1` or `Ctrl+c`.
    ///
    /// # Errors
    ///
    /// Returns `KeybindingError::InvalidKeySpec` if the key specification
    /// cannot be parsed.
    ///
    /// # Example
    ///
    /// ```
    /// use timed_quiz::tui::keybindings::KeyBindings;
    /// use crossterm::event::{KeyCode, KeyModifiers};
    ///
    /// let key = KeyBindings::parse_key("Ctrl+j").unwrap();
    /// assert_eq!(key.code, KeyCode::Char('j'));
    /// assert_eq!(key.modifiers, KeyModifiers::CONTROL);
    /// ```
    pub fn parse_key(spec: &str) -> Result<KeyEvent, KeybindingError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(KeybindingError::InvalidKeySpec(spec.to_string()));
        }

        // '+' on its own is the plus key, not a separator
        let parts: Vec<&str> = if spec == "+" {
            vec!["+"]
        } else {
            spec.split('+').map(str::trim).collect()
        };

        let mut modifiers = KeyModifiers::NONE;
        let mut key_part = None;

        for (i, part) in parts.iter().enumerate() {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" | "meta" | "option" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => {
                    if i != parts.len() - 1 {
                        return Err(KeybindingError::InvalidKeySpec(format!(
                            "'{spec}' - unexpected modifier position for '{part}'"
                        )));
                    }
                    key_part = Some(*part);
                }
            }
        }

        let key_str = key_part.ok_or_else(|| {
            KeybindingError::InvalidKeySpec(format!("'{spec}' - missing key after modifiers"))
        })?;

        let code = Self::parse_key_code(key_str)
            .ok_or_else(|| KeybindingError::InvalidKeySpec(spec.to_string()))?;

        Ok(KeyEvent::new(code, modifiers))
    }

    fn parse_key_code(s: &str) -> Option<KeyCode> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(KeyCode::Char(c));
        }

        let lower = s.to_lowercase();
        if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            return (1..=12).contains(&n).then_some(KeyCode::F(n));
        }

        match lower.as_str() {
            "space" | "spc" => Some(KeyCode::Char(' ')),
            "enter" | "return" | "ret" | "cr" => Some(KeyCode::Enter),
            "esc" | "escape" => Some(KeyCode::Esc),
            "tab" => Some(KeyCode::Tab),
            "backtab" | "shifttab" => Some(KeyCode::BackTab),
            "backspace" | "bs" => Some(KeyCode::Backspace),
            "delete" | "del" => Some(KeyCode::Delete),
            "up" | "uparrow" => Some(KeyCode::Up),
            "down" | "downarrow" => Some(KeyCode::Down),
            "left" | "leftarrow" => Some(KeyCode::Left),
            "right" | "rightarrow" => Some(KeyCode::Right),
            "pageup" | "pgup" | "page_up" => Some(KeyCode::PageUp),
            "pagedown" | "pgdn" | "pgdown" | "page_down" => Some(KeyCode::PageDown),
            "home" => Some(KeyCode::Home),
            "end" => Some(KeyCode::End),
            _ => None,
        }
    }

    /// Parse an action name, suggesting the closest one on a typo.
    ///
    /// # Errors
    ///
    /// Returns `KeybindingError::InvalidAction` if the name is not recognized.
    pub fn parse_action(name: &str) -> Result<Action, KeybindingError> {
        name.parse::<Action>().map_err(|_| {
            let names = Action::all_names();
            let candidates: Vec<&str> = names.iter().map(String::as_str).collect();
            KeybindingError::InvalidAction {
                name: name.to_string(),
                suggestion: suggest(name, &candidates).map(str::to_string),
            }
        })
    }

    /// Add custom keys on top of the profile.
    ///
    /// A custom key is removed from every other action so the override wins.
    ///
    /// # Errors
    ///
    /// Returns an error if any action name or key specification is invalid.
    pub fn with_custom_overrides(
        mut self,
        custom: &HashMap<String, Vec<String>>,
    ) -> Result<Self, KeybindingError> {
        for (action_name, key_specs) in custom {
            let action = Self::parse_action(action_name)?;

            for key_spec in key_specs {
                let key_event = Self::parse_key(key_spec)?;

                for (other_action, other_keys) in &mut self.action_keys {
                    if *other_action != action {
                        other_keys.retain(|k| !Self::key_matches(k, &key_event));
                    }
                }

                let keys = self.action_keys.entry(action).or_default();
                if !keys.iter().any(|k| Self::key_matches(k, &key_event)) {
                    keys.push(key_event);
                }
            }
        }

        Ok(self)
    }

    /// `from_profile` followed by `with_custom_overrides`.
    ///
    /// # Errors
    ///
    /// Returns an error if any custom binding is invalid.
    pub fn from_profile_with_custom(
        profile: KeybindingProfile,
        custom: &HashMap<String, Vec<String>>,
    ) -> Result<Self, KeybindingError> {
        Self::from_profile(profile).with_custom_overrides(custom)
    }

    // =========================================================================
    // Profile Binding Definitions
    // =========================================================================

    fn add<const N: usize>(
        bindings: &mut HashMap<Action, Vec<KeyEvent>>,
        action: Action,
        codes: [KeyCode; N],
    ) {
        bindings
            .entry(action)
            .or_default()
            .extend(codes.into_iter().map(|c| KeyEvent::new(c, KeyModifiers::NONE)));
    }

    /// Keys every profile shares.
    fn common_bindings() -> HashMap<Action, Vec<KeyEvent>> {
        let mut bindings = HashMap::new();

        Self::add(
            &mut bindings,
            Action::Select,
            [KeyCode::Enter, KeyCode::Char(' ')],
        );
        for n in 1..=9u8 {
            let digit = char::from(b'0' + n);
            Self::add(&mut bindings, Action::Pick(n), [KeyCode::Char(digit)]);
        }
        Self::add(&mut bindings, Action::Next, [KeyCode::Char('n')]);
        Self::add(&mut bindings, Action::Previous, [KeyCode::Char('p')]);
        Self::add(&mut bindings, Action::Reset, [KeyCode::Char('r')]);
        Self::add(&mut bindings, Action::Restart, [KeyCode::Char('s')]);
        Self::add(&mut bindings, Action::Confirm, [KeyCode::Char('y')]);
        Self::add(&mut bindings, Action::Cancel, [KeyCode::Esc]);
        Self::add(&mut bindings, Action::Help, [KeyCode::Char('?'), KeyCode::F(1)]);
        // Some terminals report '?' with SHIFT
        bindings
            .entry(Action::Help)
            .or_default()
            .push(KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT));
        Self::add(&mut bindings, Action::Quit, [KeyCode::Char('q')]);
        bindings
            .entry(Action::Quit)
            .or_default()
            .push(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        bindings
    }
}
