//! Timed Quiz - multiple-choice trivia in the terminal
//!
//! Questions come from the Open Trivia DB (or a local file), the whole quiz
//! runs against one countdown, and progress is saved after every change so an
//! interrupted attempt resumes where it stopped.
//!
//! # Modules
//!
//! - [`quiz`]: question normalization, the session state machine, the countdown
//! - [`store`]: the persisted session blob
//! - [`supply`]: question sources
//! - [`controller`]: wires the above together and projects view state
//! - [`tui`]: the interactive terminal interface
//! - [`cli`], [`config`], [`logging`], [`signal`], [`error`], [`report`]: application plumbing

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod quiz;
pub mod report;
pub mod signal;
pub mod store;
pub mod supply;
pub mod tui;

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use yansi::Paint;

use cli::{Cli, Commands, ConfigArgs, PlayArgs, StatusArgs};
use config::Config;
use controller::SessionController;
use error::ExitCode;
use quiz::Phase;
use report::StatusReport;
use store::{FileStore, KeyValueStore, SessionStore, SESSION_KEY};
use supply::{FileSource, OpenTdbSource, QuestionSource};
use tui::{run_tui, App, KeyBindings, Theme, TuiError};

/// Run the command selected on the command line.
///
/// # Errors
///
/// Returns an error for invalid configuration, unusable state directories,
/// terminal failures and storage failures outside the TUI.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
    if cli.no_color {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref(), cli.profile.as_deref());
    config.merge_cli(&cli);

    match cli.command_or_default() {
        Commands::Play(args) => run_play(config, &args, cli.quiet),
        Commands::Status(args) => {
            let config = with_state_dir(config, &args)?;
            print_status(&config, &mut std::io::stdout().lock())
        }
        Commands::Clear(args) => {
            let config = with_state_dir(config, &args)?;
            clear_saved(&config, &mut std::io::stdout().lock())
        }
        Commands::Config(args) => run_config(&cli, &config, &args),
    }
}

fn with_state_dir(mut config: Config, args: &StatusArgs) -> Result<Config> {
    config.merge_state_dir(args.state_dir.as_deref());
    config.validate()?;
    Ok(config)
}

fn run_play(mut config: Config, args: &PlayArgs, quiet: bool) -> Result<ExitCode> {
    config.merge_play_args(args);
    config.validate()?;

    let state_dir = config.resolved_state_dir()?;
    log::debug!("State directory: {}", state_dir.display());

    let bindings =
        KeyBindings::from_profile_with_custom(config.keybinding_profile, &config.custom_keybindings)
            .context("invalid custom_keybindings in configuration")?;
    let source = build_source(&config, args)?;
    log::info!("Question source: {}", source.describe());

    let store = SessionStore::new(FileStore::new(&state_dir), config.time_limit_secs);
    let controller = SessionController::new(source, store, config.controller_settings());
    let mut app = App::new(controller)
        .with_keybindings(bindings)
        .with_theme(Theme::from_arg(config.theme))
        .with_accessible(config.accessibility.use_ascii_borders);

    let shutdown = signal::install_handler()?;

    if args.fresh {
        log::info!("Discarding saved progress");
        app.start_fresh();
    } else {
        let startup = app.start(Instant::now());
        log::info!("Startup: {startup:?}");
    }

    match run_tui(&mut app, Some(shutdown.get_flag())) {
        Ok(()) => {}
        Err(TuiError::Interrupted) => {
            eprintln!("Progress saved to {}", state_dir.display());
            return Ok(ExitCode::Interrupted);
        }
        Err(e) => return Err(e).context("terminal UI failed"),
    }

    Ok(print_outcome(&app, quiet))
}

/// One-line summary after the TUI has released the terminal.
fn print_outcome<Q: QuestionSource, S: KeyValueStore>(app: &App<Q, S>, quiet: bool) -> ExitCode {
    let controller = app.controller();
    match controller.phase() {
        Phase::Finished => {
            if let Some(score) = controller.score_view() {
                if !quiet {
                    println!(
                        "{} Your Score: {}",
                        "Quiz Finished!".bold(),
                        score.summary().green().bold()
                    );
                }
            }
            ExitCode::Success
        }
        Phase::Active => {
            if !quiet {
                println!(
                    "{} {} left, run {} to continue",
                    "Progress saved.".cyan(),
                    controller.timer_readout(),
                    "timed-quiz".bold()
                );
            }
            ExitCode::Success
        }
        Phase::Loading => match controller.notice().filter(|n| n.is_blocking()) {
            Some(notice) => {
                eprintln!("{} {}", "Could not load questions:".red().bold(), notice.message());
                ExitCode::FetchFailed
            }
            None => ExitCode::Success,
        },
    }
}

fn build_source(config: &Config, args: &PlayArgs) -> Result<Box<dyn QuestionSource>> {
    if let Some(path) = &args.questions_file {
        return Ok(Box::new(FileSource::new(path)));
    }
    let source = OpenTdbSource::new(
        config.api_url.as_str(),
        Duration::from_secs(config.request_timeout_secs),
    )?
    .with_category(config.category)
    .with_difficulty(config.difficulty);
    Ok(Box::new(source))
}

/// Write the saved session as a JSON report, or a note that there is none.
///
/// # Errors
///
/// Fails when the state directory cannot be resolved or `out` cannot be written.
pub fn print_status<W: Write>(config: &Config, out: &mut W) -> Result<ExitCode> {
    let dir = config.resolved_state_dir()?;
    let store = SessionStore::new(FileStore::new(&dir), config.time_limit_secs);
    match store.load() {
        Some(session) => {
            let path = store.medium().path_for(SESSION_KEY);
            StatusReport::new(&session, &path).write_to(out)?;
        }
        None => writeln!(out, "No saved session in {}", dir.display())?,
    }
    Ok(ExitCode::Success)
}

/// Remove the saved session. Succeeds when there is none.
///
/// # Errors
///
/// Fails when the blob exists but cannot be removed.
pub fn clear_saved<W: Write>(config: &Config, out: &mut W) -> Result<ExitCode> {
    let dir = config.resolved_state_dir()?;
    let mut store = SessionStore::new(FileStore::new(&dir), config.time_limit_secs);
    let path = store.medium().path_for(SESSION_KEY);
    let existed = path.exists();
    SessionStore::clear(&mut store)?;
    if existed {
        writeln!(out, "Removed {}", path.display())?;
    } else {
        writeln!(out, "No saved session in {}", dir.display())?;
    }
    Ok(ExitCode::Success)
}

fn run_config(cli: &Cli, config: &Config, args: &ConfigArgs) -> Result<ExitCode> {
    config.validate()?;
    if args.write {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::config_path()?,
        };
        config.save(&path)?;
        println!("Wrote {}", path.display());
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(ExitCode::Success)
}
