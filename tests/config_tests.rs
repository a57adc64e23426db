//! Integration tests for configuration and the non-interactive commands.
//!
//! Covers the layered load (defaults, TOML file, named profiles, environment
//! variables, CLI flags), validation, and the `status`/`clear` output.

use std::fs;
use std::sync::Mutex;

use clap::Parser;
use tempfile::tempdir;
use timed_quiz::cli::{Cli, Commands, ThemeArg};
use timed_quiz::config::{unknown_key_warnings, Config, ConfigError};
use timed_quiz::error::ExitCode;
use timed_quiz::quiz::{normalize, QuizSession, RawQuestion};
use timed_quiz::store::{FileStore, SessionStore};
use timed_quiz::supply::Difficulty;
use timed_quiz::tui::keybindings::KeybindingProfile;
use timed_quiz::{clear_saved, print_status};

// =============================================================================
// Helper Functions
// =============================================================================

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all TIMED_QUIZ_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("TIMED_QUIZ_") {
            std::env::remove_var(key);
        }
    }
}

fn play_args(cli: &Cli) -> timed_quiz::cli::PlayArgs {
    match cli.command_or_default() {
        Commands::Play(args) => args,
        other => panic!("expected play, got {other:?}"),
    }
}

const PROFILE_TOML: &str = r#"
time_limit_secs = 600
question_count = 20
theme = "light"

[profile.sprint]
time_limit_secs = 60
question_count = 5

[profile.hard]
difficulty = "hard"
"#;

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let config = Config::load_from_path(dir.path().join("missing.toml"), None);
    assert_eq!(config, Config::default());
    assert_eq!(config.theme, ThemeArg::Auto);
    assert_eq!(config.keybinding_profile, KeybindingProfile::Universal);
    assert!(!config.accessibility.use_ascii_borders);
}

#[test]
fn test_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
time_limit_secs = 90
question_count = 7
difficulty = "easy"
category = 9
keybinding_profile = "vim"

[custom_keybindings]
quit = ["q", "Ctrl+c"]

[accessibility]
use_ascii_borders = true
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path, None);

    assert_eq!(config.time_limit_secs, 90);
    assert_eq!(config.question_count, 7);
    assert_eq!(config.difficulty, Some(Difficulty::Easy));
    assert_eq!(config.category, Some(9));
    assert_eq!(config.keybinding_profile, KeybindingProfile::Vim);
    assert_eq!(
        config.custom_keybindings.get("quit").unwrap(),
        &vec!["q".to_string(), "Ctrl+c".to_string()]
    );
    assert!(config.accessibility.use_ascii_borders);
}

#[test]
fn test_malformed_toml_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "time_limit_secs = [").unwrap();

    assert!(matches!(
        Config::try_load_from_path(&path, None),
        Err(ConfigError::Extract(_))
    ));
    assert_eq!(Config::load_from_path(&path, None), Config::default());
}

#[test]
fn test_wrong_type_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "time_limit_secs = \"soon\"").unwrap();

    assert!(Config::try_load_from_path(&path, None).is_err());
    assert_eq!(Config::load_from_path(&path, None).time_limit_secs, 300);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "question_cont = 3\nquestion_count = 4\n").unwrap();

    let config = Config::load_from_path(&path, None);
    assert_eq!(config.question_count, 4);

    let table: toml::Table = fs::read_to_string(&path).unwrap().parse().unwrap();
    let warnings = unknown_key_warnings(&table);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("did you mean 'question_count'"));
}

// =============================================================================
// Profiles
// =============================================================================

#[test]
fn test_profile_overrides_base_values() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, PROFILE_TOML).unwrap();

    let base = Config::load_from_path(&path, None);
    assert_eq!(base.time_limit_secs, 600);
    assert_eq!(base.question_count, 20);

    let sprint = Config::load_from_path(&path, Some("sprint"));
    assert_eq!(sprint.time_limit_secs, 60);
    assert_eq!(sprint.question_count, 5);
    // Keys the profile does not set keep the base value
    assert_eq!(sprint.theme, ThemeArg::Light);

    let hard = Config::load_from_path(&path, Some("hard"));
    assert_eq!(hard.difficulty, Some(Difficulty::Hard));
    assert_eq!(hard.time_limit_secs, 600);
}

#[test]
fn test_missing_profile_uses_base() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, PROFILE_TOML).unwrap();

    let config = Config::load_from_path(&path, Some("marathon"));
    assert_eq!(config.time_limit_secs, 600);
}

// =============================================================================
// Environment Variables
// =============================================================================

#[test]
fn test_env_overrides_file_and_profile() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, PROFILE_TOML).unwrap();

    std::env::set_var("TIMED_QUIZ_TIME_LIMIT_SECS", "45");
    std::env::set_var("TIMED_QUIZ_ACCESSIBILITY__USE_ASCII_BORDERS", "true");
    let config = Config::load_from_path(&path, Some("sprint"));
    clear_env();

    assert_eq!(config.time_limit_secs, 45);
    assert_eq!(config.question_count, 5);
    assert!(config.accessibility.use_ascii_borders);
}

#[test]
fn test_env_without_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    std::env::set_var("TIMED_QUIZ_QUESTION_COUNT", "12");
    std::env::set_var("TIMED_QUIZ_KEYBINDING_PROFILE", "standard");
    let config = Config::load_from_path(dir.path().join("none.toml"), None);
    clear_env();

    assert_eq!(config.question_count, 12);
    assert_eq!(config.keybinding_profile, KeybindingProfile::Standard);
}

// =============================================================================
// CLI Overrides
// =============================================================================

#[test]
fn test_cli_overrides_everything() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, PROFILE_TOML).unwrap();
    std::env::set_var("TIMED_QUIZ_QUESTION_COUNT", "12");

    let cli = Cli::parse_from([
        "timed-quiz",
        "--theme",
        "dark",
        "play",
        "-n",
        "3",
        "-t",
        "2m",
        "--difficulty",
        "medium",
        "--keys",
        "vim",
        "--state-dir",
        "/tmp/quiz-state",
    ]);
    let mut config = Config::load_from_path(&path, Some("sprint"));
    clear_env();
    config.merge_cli(&cli);
    config.merge_play_args(&play_args(&cli));

    assert_eq!(config.theme, ThemeArg::Dark);
    assert_eq!(config.question_count, 3);
    assert_eq!(config.time_limit_secs, 120);
    assert_eq!(config.difficulty, Some(Difficulty::Medium));
    assert_eq!(config.keybinding_profile, KeybindingProfile::Vim);
    assert_eq!(
        config.resolved_state_dir().unwrap(),
        std::path::PathBuf::from("/tmp/quiz-state")
    );
}

#[test]
fn test_cli_without_flags_keeps_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let cli = Cli::parse_from(["timed-quiz"]);
    let mut config = Config {
        question_count: 8,
        theme: ThemeArg::Light,
        ..Config::default()
    };
    config.merge_cli(&cli);
    config.merge_play_args(&play_args(&cli));
    assert_eq!(config.question_count, 8);
    assert_eq!(config.theme, ThemeArg::Light);
}

// =============================================================================
// Validation and Saving
// =============================================================================

#[test]
fn test_validate_rejects_out_of_range_values() {
    let cases = [
        (
            Config {
                time_limit_secs: 0,
                ..Config::default()
            },
            "time_limit_secs",
        ),
        (
            Config {
                question_count: 51,
                ..Config::default()
            },
            "question_count",
        ),
        (
            Config {
                api_url: "  ".to_string(),
                ..Config::default()
            },
            "api_url",
        ),
        (
            Config {
                request_timeout_secs: 0,
                ..Config::default()
            },
            "request_timeout_secs",
        ),
    ];
    for (config, expected) in cases {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected {expected} to be rejected, got {other:?}"),
        }
    }
}

#[test]
fn test_controller_settings_follow_config() {
    let config = Config {
        time_limit_secs: 42,
        question_count: 4,
        ..Config::default()
    };
    let settings = config.controller_settings();
    assert_eq!(settings.time_limit_secs, 42);
    assert_eq!(settings.question_count, 4);
}

#[test]
fn test_save_and_reload() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = Config {
        time_limit_secs: 75,
        difficulty: Some(Difficulty::Hard),
        keybinding_profile: KeybindingProfile::Standard,
        ..Config::default()
    };

    config.save(&path).unwrap();
    let reloaded = Config::load_from_path(&path, None);
    assert_eq!(reloaded, config);
}

// =============================================================================
// Status and Clear
// =============================================================================

fn config_with_state(dir: &std::path::Path) -> Config {
    Config {
        state_dir: Some(dir.to_path_buf()),
        ..Config::default()
    }
}

fn save_session(dir: &std::path::Path) {
    let mut session = QuizSession::new(300);
    session
        .populate(vec![
            normalize(&RawQuestion::new("Q1", "A", ["B"])).unwrap(),
            normalize(&RawQuestion::new("Q2", "C", ["D"])).unwrap(),
        ])
        .unwrap();
    session.record_answer("A").unwrap();
    *session.clock_mut().unwrap() = 187;
    SessionStore::new(FileStore::new(dir), 300)
        .save(&session)
        .unwrap();
}

#[test]
fn test_status_without_saved_session() {
    let dir = tempdir().unwrap();
    let mut out = Vec::new();
    let code = print_status(&config_with_state(dir.path()), &mut out).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(String::from_utf8(out).unwrap().starts_with("No saved session in"));
}

#[test]
fn test_status_prints_json_report() {
    let dir = tempdir().unwrap();
    save_session(dir.path());

    let mut out = Vec::new();
    print_status(&config_with_state(dir.path()), &mut out).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(value["summary"]["total_questions"], 2);
    assert_eq!(value["summary"]["answered"], 1);
    assert_eq!(value["summary"]["current_question"], 1);
    assert_eq!(value["summary"]["remaining"], "03:07");
    assert_eq!(value["questions"][0]["answer"], "A");
    assert_eq!(value["questions"][1]["answered"], false);
}

#[test]
fn test_clear_removes_saved_session() {
    let dir = tempdir().unwrap();
    save_session(dir.path());
    let config = config_with_state(dir.path());

    let mut out = Vec::new();
    clear_saved(&config, &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().starts_with("Removed"));
    assert!(!dir.path().join("quizState.json").exists());

    let mut out = Vec::new();
    clear_saved(&config, &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().starts_with("No saved session in"));
}
