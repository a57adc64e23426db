//! Error types and exit codes.
//!
//! [`QuizError`] covers every failure the quiz core can signal. Some of them
//! are local and recoverable (e.g. [`QuizError::NoSelection`], which the UI
//! turns into an inline prompt); others end the current attempt and are
//! reported to the user until they restart.

use serde::Serialize;
use thiserror::Error;

use crate::quiz::Phase;

/// Errors raised by the quiz core, the session store and the question supply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// The question supply answered with zero questions.
    #[error("no questions returned from the question supply")]
    EmptyQuestionSet,

    /// The request to the question supply failed or was rejected.
    #[error("failed to load questions: {0}")]
    Fetch(String),

    /// An advance was requested while the current question is unanswered.
    #[error("please select an option")]
    NoSelection,

    /// Writing or clearing the persisted session failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Character references in supply text could not be decoded.
    ///
    /// Part of the public error surface only: [`crate::quiz::question::decode_text`]
    /// is infallible and leaves malformed references verbatim, so nothing
    /// constructs this today.
    #[error("failed to decode question text: {0}")]
    Decode(String),

    /// A supply record cannot form a valid question.
    #[error("malformed question: {0}")]
    MalformedQuestion(String),

    /// The operation needs an active session.
    #[error("operation requires an active session (current phase: {phase})")]
    NotActive {
        /// Phase the session was in when the operation was attempted.
        phase: Phase,
    },

    /// The score was requested before the session finished.
    #[error("the quiz has not finished yet")]
    NotFinished,

    /// The answer is not one of the current question's choices.
    #[error("'{0}' is not one of the available choices")]
    InvalidChoice(String),

    /// A jump targeted a question that does not exist.
    #[error("question index {index} is out of range (0..{len})")]
    InvalidIndex {
        /// Requested index.
        index: usize,
        /// Number of questions in the session.
        len: usize,
    },

    /// Submission was attempted before reaching the last question.
    #[error("the quiz can only be submitted from the last question")]
    NotAtLastQuestion,

    /// The clock has already run out.
    #[error("no time remaining")]
    TimeExpired,
}

impl QuizError {
    /// Whether the condition is local and leaves the session untouched.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoSelection
                | Self::InvalidChoice(_)
                | Self::InvalidIndex { .. }
                | Self::NotAtLastQuestion
                | Self::Storage(_)
        )
    }
}

/// Result type for quiz operations.
pub type QuizResult<T> = Result<T, QuizError>;

/// Exit codes for the timed-quiz application.
///
/// - 0: Success (quiz played or command completed)
/// - 1: General error (unexpected failure)
/// - 2: Questions could not be loaded
/// - 3: Saved progress could not be written
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed normally.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// The question supply failed or returned nothing.
    FetchFailed = 2,
    /// The persisted session could not be written.
    StorageFailed = 3,
    /// Interrupted: the quiz was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "TQ000",
            Self::GeneralError => "TQ001",
            Self::FetchFailed => "TQ002",
            Self::StorageFailed => "TQ003",
            Self::Interrupted => "TQ130",
        }
    }

    /// Pick the exit code matching an application error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<QuizError>() {
            Some(QuizError::Fetch(_) | QuizError::EmptyQuestionSet) => Self::FetchFailed,
            Some(QuizError::Storage(_)) => Self::StorageFailed,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TQ001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the quiz was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
