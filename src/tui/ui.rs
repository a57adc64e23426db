//! TUI layout and rendering with ratatui.
//!
//! # Overview
//!
//! Every frame has three rows:
//! - header with title, question counter and remaining time
//! - content for the current mode (loading, question, results)
//! - footer with the keys that do something right now
//!
//! The submit confirmation and the help overlay are drawn as modal dialogs
//! on top.
//!
//! # Example
//!
//! ```no_run
//! use ratatui::Frame;
//! use timed_quiz::store::FileStore;
//! use timed_quiz::supply::OpenTdbSource;
//! use timed_quiz::tui::app::App;
//! use timed_quiz::tui::ui::render;
//!
//! fn draw(frame: &mut Frame, app: &App<OpenTdbSource, FileStore>) {
//!     render(frame, app);
//! }
//! ```

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::app::{Action, App, AppMode};
use super::keybindings::KeyBindings;
use crate::controller::{IndicatorView, QuestionView};
use crate::store::KeyValueStore;
use crate::supply::QuestionSource;

/// The clock turns red at or below this many seconds.
pub const LOW_TIME_SECS: u32 = 60;

// ==================== Accessible Mode Helpers ====================

/// ASCII border set for accessible mode (+, -, |).
const ASCII_BORDER_SET: border::Set = border::Set {
    top_left: "+",
    top_right: "+",
    bottom_left: "+",
    bottom_right: "+",
    vertical_left: "|",
    vertical_right: "|",
    horizontal_top: "-",
    horizontal_bottom: "-",
};

fn get_border_set(accessible: bool) -> border::Set {
    if accessible {
        ASCII_BORDER_SET
    } else {
        border::ROUNDED
    }
}

fn create_block(accessible: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(get_border_set(accessible))
}

fn create_block_with_title<'a>(accessible: bool, title: impl Into<Line<'a>>) -> Block<'a> {
    create_block(accessible).title(title)
}

/// Render the TUI based on current application state.
///
/// This is the main entry point for rendering. It dispatches to
/// mode-specific rendering functions based on the current `AppMode`.
pub fn render<Q: QuestionSource, S: KeyValueStore>(frame: &mut Frame, app: &App<Q, S>) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_content(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);

    if app.mode() == AppMode::ConfirmingSubmit {
        render_confirm_dialog(frame, app, area);
    }
    if app.show_help() {
        render_help_dialog(frame, app, area);
    }
}

/// Title, counter and clock.
fn render_header<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    let theme = app.theme();
    let session = app.controller().session();

    let mut spans = vec![Span::styled(
        "Timed Quiz",
        Style::default()
            .fg(theme.primary)
            .add_modifier(Modifier::BOLD),
    )];

    if app.mode().shows_question() {
        if let Some(question) = app.controller().question_view() {
            spans.push(Span::styled(" | ", Style::default().fg(theme.dim)));
            spans.push(Span::styled(
                question.counter(),
                Style::default().fg(theme.normal),
            ));
        }
    }

    if !session.is_empty() {
        let clock_color = if session.remaining_seconds() <= LOW_TIME_SECS {
            theme.danger
        } else {
            theme.success
        };
        spans.push(Span::styled(" | ", Style::default().fg(theme.dim)));
        spans.push(Span::styled("Time left: ", Style::default().fg(theme.dim)));
        spans.push(Span::styled(
            app.controller().timer_readout(),
            Style::default()
                .fg(clock_color)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(create_block(app.is_accessible()).border_style(Style::default().fg(theme.primary)));

    frame.render_widget(header, area);
}

fn render_content<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    match app.mode() {
        AppMode::Loading => render_loading_content(frame, app, area),
        AppMode::Answering | AppMode::Jumping | AppMode::ConfirmingSubmit => {
            render_question_content(frame, app, area);
        }
        AppMode::Results => render_results_content(frame, app, area),
        AppMode::Quitting => {
            let text = Paragraph::new("Saving progress...")
                .style(Style::default().fg(app.theme().dim))
                .alignment(Alignment::Center)
                .block(create_block(app.is_accessible()));
            frame.render_widget(text, area);
        }
    }
}

/// Loading screen, or the error that stopped loading.
fn render_loading_content<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    let theme = app.theme();
    let blocking = app
        .controller()
        .notice()
        .filter(|notice| notice.is_blocking());

    let lines = match blocking {
        Some(notice) if !app.fetch_pending() => vec![
            Line::from(Span::styled(
                "Could not load questions",
                Style::default()
                    .fg(theme.danger)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(notice.message().to_string()),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "Press {} to try again",
                    app.keybindings().key_hint(&Action::Restart)
                ),
                Style::default().fg(theme.primary),
            )),
        ],
        _ => vec![
            Line::from(""),
            Line::from(Span::styled(
                "Loading questions...",
                Style::default()
                    .fg(theme.secondary)
                    .add_modifier(Modifier::BOLD),
            )),
        ],
    };

    let content = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(create_block(app.is_accessible()));

    frame.render_widget(content, area);
}

/// Indicators, question with choices, and the notice line.
fn render_question_content<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    let Some(question) = app.controller().question_view() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Indicators
            Constraint::Min(0),    // Question
            Constraint::Length(1), // Notice
        ])
        .split(area);

    render_indicators(frame, app, chunks[0]);
    render_question(frame, app, &question, chunks[1]);
    render_notice(frame, app, chunks[2]);
}

fn render_indicators<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    let jumping = app.mode() == AppMode::Jumping;
    let spans: Vec<Span> = app
        .controller()
        .indicators()
        .iter()
        .map(|indicator| {
            let cursor = jumping && indicator.index == app.jump_cursor();
            indicator_span(app, indicator, cursor)
        })
        .collect();

    let title = if jumping {
        "Jump to question"
    } else {
        "Questions"
    };
    let border_color = if jumping {
        app.theme().secondary
    } else {
        app.theme().dim
    };

    let indicators = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: false })
        .block(
            create_block_with_title(app.is_accessible(), title)
                .border_style(Style::default().fg(border_color)),
        );

    frame.render_widget(indicators, area);
}

/// One indicator cell. Accessible mode adds text markers so state does not
/// rely on color alone.
fn indicator_span<'a, Q: QuestionSource, S: KeyValueStore>(
    app: &App<Q, S>,
    indicator: &IndicatorView,
    cursor: bool,
) -> Span<'a> {
    let theme = app.theme();
    let number = indicator.index + 1;
    let label = if app.is_accessible() {
        let mark = if indicator.answered { "*" } else { "" };
        if indicator.current {
            format!("[{number}{mark}]")
        } else {
            format!(" {number}{mark} ")
        }
    } else {
        format!(" {number} ")
    };

    let mut style = if indicator.answered {
        Style::default().fg(theme.success)
    } else {
        Style::default().fg(theme.dim)
    };
    if indicator.current {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }
    if cursor {
        style = style.fg(theme.inverted_fg).bg(theme.secondary);
    }
    Span::styled(label, style)
}

fn render_question<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    question: &QuestionView,
    area: Rect,
) {
    let theme = app.theme();
    let answering = app.mode() == AppMode::Answering;

    let mut lines = vec![
        Line::from(Span::styled(
            question.text.clone(),
            Style::default()
                .fg(theme.normal)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, choice) in question.choices.iter().enumerate() {
        let highlighted = answering && i == app.highlight();
        let pointer = if highlighted { "> " } else { "  " };
        let radio = if choice.selected { "(*)" } else { "( )" };
        let style = if highlighted {
            Style::default()
                .fg(theme.secondary)
                .add_modifier(Modifier::BOLD)
        } else if choice.selected {
            Style::default().fg(theme.success)
        } else {
            Style::default().fg(theme.normal)
        };
        lines.push(Line::from(Span::styled(
            format!("{pointer}{radio} {}. {}", i + 1, choice.text),
            style,
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "[{}] {}",
            app.keybindings().key_hint(&Action::Next),
            question.primary_label
        ),
        Style::default().fg(theme.primary),
    )));

    let body = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(
            create_block_with_title(app.is_accessible(), question.counter())
                .border_style(Style::default().fg(theme.primary)),
        );

    frame.render_widget(body, area);
}

/// Controller notice, or the app's status line.
fn render_notice<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    let theme = app.theme();
    let (text, color) = match (app.controller().notice(), app.status()) {
        (Some(notice), _) => (notice.message().to_string(), theme.warning),
        (None, Some(status)) => (status.to_string(), theme.danger),
        (None, None) => return,
    };

    let width = usize::from(area.width.saturating_sub(2));
    let line = Paragraph::new(Span::styled(
        format!(" {}", truncate_string(&text, width)),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(line, area);
}

/// Final score and the way back in.
fn render_results_content<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    let theme = app.theme();
    let summary = app
        .controller()
        .score_view()
        .map_or_else(|| "-".to_string(), |score| score.summary());

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Quiz Finished!",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Your Score: ", Style::default().fg(theme.normal)),
            Span::styled(
                summary,
                Style::default()
                    .fg(theme.success)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "[{}] Start New",
                app.keybindings().key_hint(&Action::Restart)
            ),
            Style::default().fg(theme.secondary),
        )),
    ];

    if let Some(notice) = app.controller().notice() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            notice.message().to_string(),
            Style::default().fg(theme.warning),
        )));
    }

    let results = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            create_block_with_title(app.is_accessible(), "Results")
                .border_style(Style::default().fg(theme.success)),
        );

    frame.render_widget(results, area);
}

/// Footer with the hints for the current mode.
fn render_footer<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    let theme = app.theme();
    let mut spans = Vec::new();
    for (key, desc) in get_footer_commands(app) {
        spans.push(Span::styled(
            format!("[{key}]"),
            Style::default()
                .fg(theme.secondary)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {desc}  "),
            Style::default().fg(theme.normal),
        ));
    }

    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(create_block(app.is_accessible()).border_style(Style::default().fg(theme.dim)));

    frame.render_widget(footer, area);
}

/// Modal asking to submit from the last question.
fn render_confirm_dialog<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    let dialog_area = centered_rect(50, 40, area);
    frame.render_widget(Clear, dialog_area);

    let theme = app.theme();
    let session = app.controller().session();
    let bindings = app.keybindings();

    let lines = vec![
        Line::from(Span::styled(
            "Submit quiz?",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "Answered {} of {} questions.",
            session.answered_count(),
            session.len()
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "[{}] Submit    [{}] Keep answering",
                bindings.key_hint(&Action::Confirm),
                bindings.key_hint(&Action::Cancel)
            ),
            Style::default().fg(theme.secondary),
        )),
    ];

    let confirm = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            create_block_with_title(app.is_accessible(), "Confirm")
                .border_style(Style::default().fg(theme.secondary)),
        );

    frame.render_widget(confirm, dialog_area);
}

/// Help overlay listing every bound action.
fn render_help_dialog<Q: QuestionSource, S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<Q, S>,
    area: Rect,
) {
    let dialog_area = centered_rect(70, 80, area);
    frame.render_widget(Clear, dialog_area);

    let theme = app.theme();
    let bindings = app.keybindings();

    let mut lines = vec![
        Line::from(Span::styled(
            "Keybinding Reference",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Profile: ", Style::default().fg(theme.dim)),
            Span::styled(
                bindings.profile().display_name(),
                Style::default()
                    .fg(theme.secondary)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
    ];
    lines.extend(help_lines(app, bindings));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "Press {} or {} to close",
            bindings.key_hint(&Action::Cancel),
            bindings.key_hint(&Action::Help)
        ),
        Style::default().fg(theme.dim),
    )));

    let help = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(
            create_block_with_title(app.is_accessible(), "Help")
                .border_style(Style::default().fg(theme.primary)),
        );

    frame.render_widget(help, dialog_area);
}

fn help_lines<'a, Q: QuestionSource, S: KeyValueStore>(
    app: &App<Q, S>,
    bindings: &KeyBindings,
) -> Vec<Line<'a>> {
    const HELP_ACTIONS: [Action; 12] = [
        Action::Up,
        Action::Down,
        Action::Select,
        Action::Next,
        Action::Previous,
        Action::JumpMode,
        Action::Reset,
        Action::Restart,
        Action::Confirm,
        Action::Cancel,
        Action::Help,
        Action::Quit,
    ];

    let theme = app.theme();
    let mut lines: Vec<Line> = HELP_ACTIONS
        .iter()
        .filter(|action| !bindings.keys_for_action(action).is_empty())
        .map(|action| {
            Line::from(vec![
                Span::styled(
                    format!("  {:<14}", bindings.key_hints(action, 3)),
                    Style::default().fg(theme.secondary),
                ),
                Span::styled(action.description(), Style::default().fg(theme.normal)),
            ])
        })
        .collect();

    let first = bindings.key_hint(&Action::Pick(1));
    let last = bindings.key_hint(&Action::Pick(9));
    if !first.is_empty() && !last.is_empty() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<14}", format!("{first}-{last}")),
                Style::default().fg(theme.secondary),
            ),
            Span::styled(
                Action::Pick(1).description(),
                Style::default().fg(theme.normal),
            ),
        ]));
    }
    lines
}

// ==================== Dynamic Footer Hints ====================

/// Footer hints `(key, description)` for the current mode.
fn get_footer_commands<Q: QuestionSource, S: KeyValueStore>(
    app: &App<Q, S>,
) -> Vec<(String, &'static str)> {
    let bindings = app.keybindings();
    let hint = |action: Action, desc: &'static str| (bindings.key_hints(&action, 2), desc);

    if app.show_help() {
        return vec![hint(Action::Help, "Close help")];
    }

    let commands = match app.mode() {
        AppMode::Loading if app.fetch_pending() => vec![hint(Action::Quit, "Quit")],
        AppMode::Loading => vec![hint(Action::Restart, "Retry"), hint(Action::Quit, "Quit")],
        AppMode::Answering => vec![
            hint(Action::Select, "Choose"),
            hint(Action::Next, "Next"),
            hint(Action::Previous, "Prev"),
            hint(Action::JumpMode, "Jump"),
            hint(Action::Reset, "Reset"),
            hint(Action::Help, "Help"),
            hint(Action::Quit, "Quit"),
        ],
        AppMode::Jumping => vec![
            hint(Action::Next, "Move"),
            hint(Action::Select, "Go"),
            hint(Action::Cancel, "Back"),
        ],
        AppMode::ConfirmingSubmit => {
            vec![hint(Action::Confirm, "Submit"), hint(Action::Cancel, "Back")]
        }
        AppMode::Results => vec![hint(Action::Restart, "Start New"), hint(Action::Quit, "Quit")],
        AppMode::Quitting => Vec::new(),
    };

    commands.into_iter().filter(|(key, _)| !key.is_empty()).collect()
}

// ==================== Helpers ====================

/// Truncate a string with ellipsis if it exceeds `max_len` characters.
///
/// # Examples
///
/// ```
/// use timed_quiz::tui::ui::truncate_string;
///
/// assert_eq!(truncate_string("hello", 10), "hello");
/// assert_eq!(truncate_string("hello world", 8), "hello...");
/// ```
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Create a centered rectangle with given percentage of parent.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
