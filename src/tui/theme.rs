//! TUI theming support.
//!
//! [`Theme`] holds the color palette. There is a dark and a light variant,
//! plus detection from the terminal environment.

use ratatui::style::Color;

use crate::cli::ThemeArg;

/// A collection of colors used for TUI components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub danger: Color,
    pub success: Color,
    pub warning: Color,
    pub dim: Color,
    pub normal: Color,
    pub inverted_fg: Color,
}

impl Theme {
    /// High-contrast dark theme (default).
    ///
    /// Palette:
    /// - Primary: Cyan (headers, borders)
    /// - Secondary: Yellow (highlight, jump cursor)
    /// - Danger: Red (errors, last minute of the clock)
    /// - Success: Green (answered questions, score)
    /// - Warning: Magenta (prompts and notices)
    /// - Dim: DarkGray (unanswered questions, hints)
    /// - Normal: White (main text)
    /// - Inverted FG: Black (text on colored background)
    #[must_use]
    pub fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Yellow,
            danger: Color::Red,
            success: Color::Green,
            warning: Color::Magenta,
            dim: Color::DarkGray,
            normal: Color::White,
            inverted_fg: Color::Black,
        }
    }

    /// High-contrast light theme.
    #[must_use]
    pub fn light() -> Self {
        Self {
            primary: Color::Blue,
            secondary: Color::Magenta,
            danger: Color::Red,
            success: Color::Green,
            warning: Color::Yellow,
            dim: Color::Gray,
            normal: Color::Black,
            inverted_fg: Color::White,
        }
    }

    /// Detect terminal theme or return dark theme as default.
    #[must_use]
    pub fn auto() -> Self {
        if is_light_terminal() {
            Self::light()
        } else {
            Self::dark()
        }
    }

    /// Theme for the `--theme` / config value.
    #[must_use]
    pub fn from_arg(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Auto => Self::auto(),
            ThemeArg::Dark => Self::dark(),
            ThemeArg::Light => Self::light(),
        }
    }

    /// Check if this is a light theme.
    #[must_use]
    pub fn is_light(&self) -> bool {
        self.normal == Color::Black
    }
}

/// Light-background heuristic based on `COLORFGBG` ("fg;bg").
fn is_light_terminal() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .as_deref()
        .and_then(background_index)
        .is_some_and(|bg| bg >= 7 && bg != 8)
}

fn background_index(colorfgbg: &str) -> Option<u32> {
    colorfgbg.rsplit(';').next()?.trim().parse().ok()
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
