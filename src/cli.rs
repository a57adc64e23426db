//! Command-line interface definitions for the quiz.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options control verbosity, color and configuration; subcommands pick
//! what to do with the saved session.
//!
//! # Example
//!
//! ```bash
//! # Play (default), resuming saved progress if any
//! timed-quiz
//!
//! # Fresh hard quiz of 20 questions with a 10 minute limit
//! timed-quiz play --fresh --amount 20 --difficulty hard --time-limit 10m
//!
//! # Offline play from a local question file
//! timed-quiz play --questions-file questions.json
//!
//! # Inspect or discard saved progress
//! timed-quiz status
//! timed-quiz clear
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::supply::Difficulty;
use crate::tui::keybindings::KeybindingProfile;

/// Timed multiple-choice trivia quiz in the terminal.
///
/// Questions come from the Open Trivia DB (or a local file). Progress is saved
/// after every answer and every second, so an interrupted quiz picks up where
/// it left off.
#[derive(Debug, Parser)]
#[command(name = "timed-quiz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Named profile from the configuration file
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Write logs to a file instead of stderr
    ///
    /// Useful while the TUI owns the terminal.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Color theme
    #[arg(long, global = true, value_enum)]
    pub theme: Option<ThemeArg>,

    /// Subcommand to execute (defaults to `play`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand, with `play` filled in when none was given.
    #[must_use]
    pub fn command_or_default(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Play(PlayArgs::default()))
    }
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Play the quiz, resuming saved progress if any
    Play(PlayArgs),
    /// Show the saved session as JSON
    Status(StatusArgs),
    /// Remove the saved session
    Clear(StatusArgs),
    /// Show or write the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the play subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct PlayArgs {
    /// Number of questions to request (1-50)
    #[arg(short = 'n', long, value_name = "N")]
    pub amount: Option<usize>,

    /// Time limit for the whole quiz (e.g. 300, 90s, 5m, 1m30s)
    #[arg(short = 't', long, value_name = "DURATION", value_parser = parse_duration_secs)]
    pub time_limit: Option<u32>,

    /// Trivia API endpoint
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Trivia category id
    #[arg(long, value_name = "ID")]
    pub category: Option<u32>,

    /// Question difficulty
    #[arg(long, value_enum)]
    pub difficulty: Option<Difficulty>,

    /// Directory holding the saved session
    #[arg(long, value_name = "PATH")]
    pub state_dir: Option<PathBuf>,

    /// Read questions from a JSON file instead of the API
    ///
    /// Accepts an array of `{question, correct_answer, incorrect_answers}`
    /// records or a saved API response.
    #[arg(long, value_name = "PATH")]
    pub questions_file: Option<PathBuf>,

    /// Discard saved progress and start with new questions
    #[arg(long)]
    pub fresh: bool,

    /// Keybinding profile
    #[arg(long, value_enum, value_name = "PROFILE")]
    pub keys: Option<KeybindingProfile>,
}

/// Arguments for the status and clear subcommands.
#[derive(Debug, Clone, Default, Args)]
pub struct StatusArgs {
    /// Directory holding the saved session
    #[arg(long, value_name = "PATH")]
    pub state_dir: Option<PathBuf>,
}

/// Arguments for the config subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    pub write: bool,
}

/// Theme choice for the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeArg {
    /// Detect from the terminal
    #[default]
    Auto,
    /// Light text on a dark background
    Dark,
    /// Dark text on a light background
    Light,
}

impl std::fmt::Display for ThemeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeArg::Auto => write!(f, "auto"),
            ThemeArg::Dark => write!(f, "dark"),
            ThemeArg::Light => write!(f, "light"),
        }
    }
}

/// Parse a duration into whole seconds.
///
/// Accepts plain seconds or `h`/`m`/`s` suffixed parts. Case-insensitive.
///
/// # Examples
///
/// ```
/// use timed_quiz::cli::parse_duration_secs;
///
/// assert_eq!(parse_duration_secs("300").unwrap(), 300);
/// assert_eq!(parse_duration_secs("90s").unwrap(), 90);
/// assert_eq!(parse_duration_secs("5m").unwrap(), 300);
/// assert_eq!(parse_duration_secs("1m30s").unwrap(), 90);
/// assert_eq!(parse_duration_secs("1h").unwrap(), 3600);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, has an unknown unit, or is zero.
pub fn parse_duration_secs(s: &str) -> Result<u32, String> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let multiplier = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            ' ' => continue,
            _ => return Err(format!("Unknown duration unit: '{c}'")),
        };
        if digits.is_empty() {
            return Err(format!("Missing number before '{c}'"));
        }
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("Invalid number: '{digits}'"))?;
        total = total.saturating_add(value.saturating_mul(multiplier));
        digits.clear();
    }
    if !digits.is_empty() {
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("Invalid number: '{digits}'"))?;
        total = total.saturating_add(value);
    }

    if total == 0 {
        return Err("Duration must be at least one second".to_string());
    }
    u32::try_from(total).map_err(|_| format!("Duration too long: {total} seconds"))
}
