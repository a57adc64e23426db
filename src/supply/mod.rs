//! Question supply.
//!
//! A [`QuestionSource`] answers "give me N multiple-choice questions" with
//! raw, still-encoded records. The quiz ships three sources:
//!
//! * [`OpenTdbSource`]: the Open Trivia DB HTTP API (default).
//! * [`FileSource`]: a local JSON file, for offline play.
//! * [`StaticSource`]: a fixed list, for tests and demos.
//!
//! Fetches are a single attempt. Failures surface as [`QuizError::Fetch`] or
//! [`QuizError::EmptyQuestionSet`] and the user retries by restarting.

pub mod file;
pub mod opentdb;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use file::FileSource;
pub use opentdb::{OpenTdbResponse, OpenTdbSource, DEFAULT_API_URL};

use crate::error::{QuizError, QuizResult};
use crate::quiz::RawQuestion;

/// Largest batch the supply hands out in one request.
pub const MAX_QUESTIONS_PER_REQUEST: usize = 50;

/// Anything that can hand out raw questions.
pub trait QuestionSource {
    /// Fetch up to `amount` raw multiple-choice questions.
    ///
    /// # Errors
    ///
    /// [`QuizError::Fetch`] when the request fails, [`QuizError::EmptyQuestionSet`]
    /// when the source has nothing to offer.
    fn fetch(&self, amount: usize) -> QuizResult<Vec<RawQuestion>>;

    /// Short human-readable description used in logs.
    fn describe(&self) -> String;
}

impl<T: QuestionSource + ?Sized> QuestionSource for Box<T> {
    fn fetch(&self, amount: usize) -> QuizResult<Vec<RawQuestion>> {
        (**self).fetch(amount)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Question difficulty filter understood by the supply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy questions only
    Easy,
    /// Medium questions only
    Medium,
    /// Hard questions only
    Hard,
}

impl Difficulty {
    /// Query-string value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// A fixed list of questions.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    questions: Vec<RawQuestion>,
}

impl StaticSource {
    /// Serve `questions`, truncated to the requested amount.
    #[must_use]
    pub fn new(questions: Vec<RawQuestion>) -> Self {
        Self { questions }
    }
}

impl QuestionSource for StaticSource {
    fn fetch(&self, amount: usize) -> QuizResult<Vec<RawQuestion>> {
        if self.questions.is_empty() || amount == 0 {
            return Err(QuizError::EmptyQuestionSet);
        }
        Ok(self.questions.iter().take(amount).cloned().collect())
    }

    fn describe(&self) -> String {
        format!("{} built-in questions", self.questions.len())
    }
}
