//! JSON report of a saved session, printed by `timed-quiz status`.
//!
//! Correct answers are left out so the report can be shown mid-quiz.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "questions": [
//!     { "number": 1, "question": "...", "choices": ["..."], "answer": "...", "answered": true }
//!   ],
//!   "summary": {
//!     "total_questions": 10,
//!     "answered": 4,
//!     "current_question": 5,
//!     "remaining_seconds": 187,
//!     "remaining": "03:07",
//!     "state_file": "/home/me/.local/share/timed-quiz/quizState.json"
//!   }
//! }
//! ```

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::quiz::{format_clock, QuizSession};

/// One saved question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonQuestion {
    /// 1-based position
    pub number: usize,
    /// Decoded question text
    pub question: String,
    /// Choices in display order
    pub choices: Vec<String>,
    /// Recorded answer
    pub answer: Option<String>,
    /// Whether an answer is recorded
    pub answered: bool,
}

/// Progress figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total_questions: usize,
    pub answered: usize,
    /// 1-based question the cursor is on
    pub current_question: usize,
    pub remaining_seconds: u32,
    /// `MM:SS` readout
    pub remaining: String,
    pub state_file: String,
}

/// Complete status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub questions: Vec<JsonQuestion>,
    pub summary: StatusSummary,
}

impl StatusReport {
    /// Build the report for a restored session stored at `state_file`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use timed_quiz::quiz::{normalize, QuizSession, RawQuestion};
    /// use timed_quiz::report::StatusReport;
    ///
    /// let question = normalize(&RawQuestion::new("1 + 1?", "2", ["3"])).unwrap();
    /// let mut session = QuizSession::new(60);
    /// session.populate(vec![question]).unwrap();
    /// session.record_answer("2").unwrap();
    ///
    /// let report = StatusReport::new(&session, Path::new("/tmp/quizState.json"));
    /// assert_eq!(report.summary.answered, 1);
    /// assert_eq!(report.summary.remaining, "01:00");
    /// ```
    #[must_use]
    pub fn new(session: &QuizSession, state_file: &Path) -> Self {
        let questions = session
            .questions()
            .iter()
            .zip(session.answers())
            .enumerate()
            .map(|(i, (question, answer))| JsonQuestion {
                number: i + 1,
                question: question.text().to_string(),
                choices: question.choices().to_vec(),
                answer: answer.clone(),
                answered: answer.is_some(),
            })
            .collect();

        Self {
            questions,
            summary: StatusSummary {
                total_questions: session.len(),
                answered: session.answered_count(),
                current_question: session.cursor() + 1,
                remaining_seconds: session.remaining_seconds(),
                remaining: format_clock(session.remaining_seconds()),
                state_file: state_file.display().to_string(),
            },
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON plus a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{normalize, RawQuestion};

    fn session() -> QuizSession {
        let questions = vec![
            normalize(&RawQuestion::new("Q1", "A", ["B", "C"])).unwrap(),
            normalize(&RawQuestion::new("Q2 &amp; more", "D", ["E"])).unwrap(),
        ];
        let mut session = QuizSession::new(125);
        session.populate(questions).unwrap();
        session.record_answer("B").unwrap();
        session
    }

    #[test]
    fn test_report_fields() {
        let report = StatusReport::new(&session(), Path::new("/state/quizState.json"));
        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.questions[0].answer.as_deref(), Some("B"));
        assert!(!report.questions[1].answered);
        assert_eq!(report.questions[1].question, "Q2 & more");
        assert_eq!(report.summary.current_question, 1);
        assert_eq!(report.summary.remaining, "02:05");
    }

    #[test]
    fn test_report_hides_correct_answer() {
        let report = StatusReport::new(&session(), Path::new("/s"));
        let json = report.to_json_pretty().unwrap();
        assert!(!json.contains("correct"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total_questions"], 2);
        assert_eq!(value["summary"]["answered"], 1);
    }

    #[test]
    fn test_write_to_ends_with_newline() {
        let report = StatusReport::new(&session(), Path::new("/s"));
        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        assert!(out.ends_with(b"}\n"));
    }
}
