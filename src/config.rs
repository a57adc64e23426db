//! Application configuration management.
//!
//! Settings are layered with figment, lowest to highest priority:
//!
//! 1. built-in defaults
//! 2. the TOML config file (`<config dir>/config.toml` or `--config`)
//! 3. a named `[profile.NAME]` table from that file (`--profile`)
//! 4. `TIMED_QUIZ_*` environment variables (`__` separates nested keys)
//! 5. command-line flags ([`Config::merge_cli`], [`Config::merge_play_args`])
//!
//! A config file that fails to parse is reported and ignored so the quiz
//! still starts with defaults. Out-of-range values are caught by
//! [`Config::validate`] after all layers are merged.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{Cli, PlayArgs, ThemeArg};
use crate::controller::{ControllerSettings, DEFAULT_QUESTION_COUNT, DEFAULT_TIME_LIMIT_SECS};
use crate::supply::{Difficulty, DEFAULT_API_URL, MAX_QUESTIONS_PER_REQUEST};
use crate::tui::keybindings::KeybindingProfile;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TIMED_QUIZ_";

/// Default HTTP timeout for the question supply.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

const TOP_LEVEL_KEYS: &[&str] = &[
    "time_limit_secs",
    "question_count",
    "api_url",
    "category",
    "difficulty",
    "request_timeout_secs",
    "state_dir",
    "theme",
    "keybinding_profile",
    "custom_keybindings",
    "accessibility",
    "profile",
];

const ACCESSIBILITY_KEYS: &[&str] = &["use_ascii_borders"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is outside its allowed range.
    #[error("invalid value for '{field}': {message}")]
    Invalid {
        /// Offending key.
        field: &'static str,
        /// What is wrong.
        message: String,
    },
    /// The layered sources could not be merged into a [`Config`].
    #[error("failed to load configuration: {0}")]
    Extract(String),
    /// No platform directory could be determined.
    #[error("could not determine the platform {0} directory")]
    NoProjectDirs(&'static str),
}

/// Accessibility options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilityConfig {
    /// Draw borders with plain ASCII characters.
    pub use_ascii_borders: bool,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Full quiz duration in seconds.
    pub time_limit_secs: u32,
    /// Questions requested per attempt.
    pub question_count: usize,
    /// Trivia API endpoint.
    pub api_url: String,
    /// Trivia category id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<u32>,
    /// Question difficulty filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// HTTP timeout for a question request.
    pub request_timeout_secs: u64,
    /// Where the saved session lives. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Preferred TUI theme.
    pub theme: ThemeArg,
    /// Base keybinding profile.
    pub keybinding_profile: KeybindingProfile,
    /// Per-action key overrides, e.g. `quit = ["q", "Ctrl+c"]`.
    pub custom_keybindings: HashMap<String, Vec<String>>,
    /// Accessibility options.
    pub accessibility: AccessibilityConfig,
    /// Named override tables.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub profile: BTreeMap<String, toml::Table>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            question_count: DEFAULT_QUESTION_COUNT,
            api_url: DEFAULT_API_URL.to_string(),
            category: None,
            difficulty: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            state_dir: None,
            theme: ThemeArg::Auto,
            keybinding_profile: KeybindingProfile::Universal,
            custom_keybindings: HashMap::new(),
            accessibility: AccessibilityConfig::default(),
            profile: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load from `path` (or the default location) with an optional profile.
    pub fn load(path: Option<&Path>, profile: Option<&str>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Ok(path) => path,
                Err(e) => {
                    log::debug!("{e}, using defaults");
                    return Self::load_layers(None, profile).unwrap_or_default();
                }
            },
        };
        Self::load_from_path(path, profile)
    }

    /// Load from an explicit file, falling back to defaults on any error.
    pub fn load_from_path(path: impl AsRef<Path>, profile: Option<&str>) -> Self {
        match Self::try_load_from_path(path.as_ref(), profile) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Load from an explicit file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Extract`] if a layer has the wrong shape.
    pub fn try_load_from_path(path: &Path, profile: Option<&str>) -> Result<Self, ConfigError> {
        if let Ok(content) = fs::read_to_string(path) {
            match content.parse::<toml::Table>() {
                Ok(table) => {
                    for warning in unknown_key_warnings(&table) {
                        log::warn!("{}: {warning}", path.display());
                    }
                }
                Err(e) => {
                    return Err(ConfigError::Extract(format!("{}: {e}", path.display())));
                }
            }
        } else {
            log::debug!("No config file at {}", path.display());
        }
        Self::load_layers(Some(path), profile)
    }

    fn load_layers(path: Option<&Path>, profile: Option<&str>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(name) = profile {
            let key = format!("profile.{name}");
            if figment.contains(&key) {
                log::debug!("Applying config profile '{name}'");
                let focused = figment.focus(&key);
                figment = figment.merge(focused);
            } else {
                log::warn!("Config profile '{name}' not found, using base settings");
            }
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment
            .extract()
            .map_err(|e| ConfigError::Extract(e.to_string()))
    }

    /// Apply global CLI overrides.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(theme) = cli.theme {
            self.theme = theme;
        }
    }

    /// Apply `play` overrides.
    pub fn merge_play_args(&mut self, args: &PlayArgs) {
        if let Some(amount) = args.amount {
            self.question_count = amount;
        }
        if let Some(limit) = args.time_limit {
            self.time_limit_secs = limit;
        }
        if let Some(url) = &args.api_url {
            self.api_url.clone_from(url);
        }
        if args.category.is_some() {
            self.category = args.category;
        }
        if args.difficulty.is_some() {
            self.difficulty = args.difficulty;
        }
        self.merge_state_dir(args.state_dir.as_deref());
        if let Some(keys) = args.keys {
            self.keybinding_profile = keys;
        }
    }

    /// Apply a `--state-dir` override.
    pub fn merge_state_dir(&mut self, dir: Option<&Path>) {
        if let Some(dir) = dir {
            self.state_dir = Some(dir.to_path_buf());
        }
    }

    /// Check ranges after all layers are merged.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "time_limit_secs",
                message: "must be at least 1 second".to_string(),
            });
        }
        if !(1..=MAX_QUESTIONS_PER_REQUEST).contains(&self.question_count) {
            return Err(ConfigError::Invalid {
                field: "question_count",
                message: format!(
                    "{} is outside 1..={MAX_QUESTIONS_PER_REQUEST}",
                    self.question_count
                ),
            });
        }
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "api_url",
                message: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// Controller knobs derived from this config.
    #[must_use]
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            time_limit_secs: self.time_limit_secs,
            question_count: self.question_count,
        }
    }

    /// The state directory, resolving the platform default.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoProjectDirs`] when no default can be determined.
    pub fn resolved_state_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs("data")?.data_dir().to_path_buf()),
        }
    }

    /// Serialize as pretty TOML.
    ///
    /// # Errors
    ///
    /// Fails if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }

    /// Write the configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails on serialization or I/O errors.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoProjectDirs`] when no home directory is known.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs("config")?.config_dir().join("config.toml"))
    }
}

fn project_dirs(kind: &'static str) -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("com", "timedquiz", "timed-quiz").ok_or(ConfigError::NoProjectDirs(kind))
}

/// Warnings for keys the config does not know, with a close match if any.
#[must_use]
pub fn unknown_key_warnings(table: &toml::Table) -> Vec<String> {
    let mut warnings = Vec::new();
    check_keys(table, TOP_LEVEL_KEYS, "", &mut warnings);
    if let Some(toml::Value::Table(accessibility)) = table.get("accessibility") {
        check_keys(accessibility, ACCESSIBILITY_KEYS, "accessibility.", &mut warnings);
    }
    if let Some(toml::Value::Table(profiles)) = table.get("profile") {
        for (name, profile) in profiles {
            if let toml::Value::Table(profile) = profile {
                let prefix = format!("profile.{name}.");
                check_keys(profile, TOP_LEVEL_KEYS, &prefix, &mut warnings);
            }
        }
    }
    warnings
}

fn check_keys(table: &toml::Table, known: &[&str], prefix: &str, warnings: &mut Vec<String>) {
    for key in table.keys() {
        if known.contains(&key.as_str()) {
            continue;
        }
        let message = match suggest(key, known) {
            Some(suggestion) => {
                format!("unknown key '{prefix}{key}', did you mean '{prefix}{suggestion}'?")
            }
            None => format!("unknown key '{prefix}{key}' is ignored"),
        };
        warnings.push(message);
    }
}

/// Closest known name to `input`, if reasonably close.
#[must_use]
pub fn suggest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|candidate| (*candidate, strsim::jaro_winkler(input, candidate)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}
