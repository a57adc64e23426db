//! Question records and normalization of raw supply data.
//!
//! The question supply returns text with HTML character references
//! (`&quot;`, `&#039;`, ...). [`normalize`] decodes every field, merges the
//! correct answer into the incorrect ones and shuffles the result once. After
//! that the choice order is fixed for the life of the [`Question`].

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{QuizError, QuizResult};

/// A question as delivered by the question supply, before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    /// Question text, possibly containing character references.
    #[serde(rename = "question")]
    pub question_text: String,
    /// The single correct answer.
    pub correct_answer: String,
    /// The distractors.
    pub incorrect_answers: Vec<String>,
}

impl RawQuestion {
    /// Convenience constructor, mostly for tests and offline question files.
    pub fn new(
        question_text: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            question_text: question_text.into(),
            correct_answer: correct_answer.into(),
            incorrect_answers: incorrect_answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// A decoded multiple-choice question with a fixed choice order.
///
/// Invariants (checked by [`Question::new`] and on deserialization):
/// - at least two choices, all non-empty and unique
/// - the correct choice is one of the choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    text: String,
    choices: Vec<String>,
    correct_choice: String,
}

/// Wire shape of a question inside the persisted blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionRecord {
    question: String,
    choices: Vec<String>,
    answer: String,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuizError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(record.question, record.choices, record.answer)
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        Self {
            question: question.text,
            choices: question.choices,
            answer: question.correct_choice,
        }
    }
}

impl Question {
    /// Build a question from already-decoded parts, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::MalformedQuestion`] when fewer than two choices are
    /// given, a choice is empty or repeated, or the correct choice is missing.
    pub fn new(
        text: impl Into<String>,
        choices: Vec<String>,
        correct_choice: impl Into<String>,
    ) -> QuizResult<Self> {
        let text = text.into();
        let correct_choice = correct_choice.into();

        if choices.len() < 2 {
            return Err(QuizError::MalformedQuestion(format!(
                "'{text}' has {} choice(s), at least 2 required",
                choices.len()
            )));
        }
        if choices.iter().any(String::is_empty) {
            return Err(QuizError::MalformedQuestion(format!(
                "'{text}' has an empty choice"
            )));
        }
        let mut seen = HashSet::with_capacity(choices.len());
        if let Some(dup) = choices.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(QuizError::MalformedQuestion(format!(
                "'{text}' lists '{dup}' more than once"
            )));
        }
        if !choices.contains(&correct_choice) {
            return Err(QuizError::MalformedQuestion(format!(
                "'{text}' does not offer its correct answer '{correct_choice}'"
            )));
        }

        Ok(Self {
            text,
            choices,
            correct_choice,
        })
    }

    /// The decoded question text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Choices in display order.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// The correct answer.
    #[must_use]
    pub fn correct_choice(&self) -> &str {
        &self.correct_choice
    }

    /// Whether `choice` is one of this question's choices.
    #[must_use]
    pub fn has_choice(&self, choice: &str) -> bool {
        self.choices.iter().any(|c| c == choice)
    }

    /// Exact comparison against the correct answer. No case folding or trimming.
    #[must_use]
    pub fn is_correct(&self, choice: &str) -> bool {
        self.correct_choice == choice
    }
}

/// Decode HTML character references in supply text.
///
/// Plain text passes through untouched, so decoding already-decoded ASCII is
/// a no-op.
#[must_use]
pub fn decode_text(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Normalize a raw supply record using the thread-local RNG.
///
/// # Errors
///
/// See [`normalize_with`].
pub fn normalize(raw: &RawQuestion) -> QuizResult<Question> {
    normalize_with(raw, &mut rand::thread_rng())
}

/// Normalize a raw supply record with an explicit RNG.
///
/// Decodes every text field, appends the correct answer to the incorrect
/// ones and applies a uniform random permutation to the result.
///
/// # Errors
///
/// Returns [`QuizError::MalformedQuestion`] if the decoded record does not
/// satisfy the [`Question`] invariants.
pub fn normalize_with<R: Rng + ?Sized>(raw: &RawQuestion, rng: &mut R) -> QuizResult<Question> {
    let text = decode_text(&raw.question_text);
    let correct = decode_text(&raw.correct_answer);

    let mut choices: Vec<String> = raw
        .incorrect_answers
        .iter()
        .map(|answer| decode_text(answer))
        .collect();
    choices.push(correct.clone());
    choices.shuffle(rng);

    Question::new(text, choices, correct)
}

/// Normalize a full supply response.
///
/// # Errors
///
/// Returns [`QuizError::EmptyQuestionSet`] for an empty response, or the first
/// normalization error.
pub fn normalize_all(raw: &[RawQuestion]) -> QuizResult<Vec<Question>> {
    if raw.is_empty() {
        return Err(QuizError::EmptyQuestionSet);
    }
    raw.iter().map(normalize).collect()
}
