//! Data structures for the persisted session blob.
//!
//! The layout is shared with earlier releases of the quiz and must keep
//! round-tripping:
//!
//! ```json
//! {
//!   "questions": [ { "question": "...", "choices": ["..."], "answer": "..." } ],
//!   "userAnswers": [ "..." , null ],
//!   "currentIndex": 0,
//!   "timeLeft": 300
//! }
//! ```
//!
//! Older blobs may lack `timeLeft`; those fall back to the configured limit.

use serde::{Deserialize, Serialize};

use crate::error::QuizResult;
use crate::quiz::{Question, QuizSession};

/// Serializable snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBlob {
    /// Questions in display order, choices already shuffled.
    pub questions: Vec<Question>,
    /// One slot per question; `null` when unanswered.
    pub user_answers: Vec<Option<String>>,
    /// Cursor position.
    pub current_index: usize,
    /// Remaining seconds. Missing in blobs written by old versions.
    #[serde(default)]
    pub time_left: Option<i64>,
}

impl SessionBlob {
    /// Snapshot a live session.
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        Self {
            questions: session.questions().to_vec(),
            user_answers: session.answers().to_vec(),
            current_index: session.cursor(),
            time_left: Some(i64::from(session.remaining_seconds())),
        }
    }

    /// Remaining seconds, defaulting when absent and clamping negatives to zero.
    #[must_use]
    pub fn remaining_seconds(&self, default_time_limit: u32) -> u32 {
        match self.time_left {
            None => default_time_limit,
            Some(secs) => u32::try_from(secs.max(0)).unwrap_or(u32::MAX),
        }
    }

    /// Rebuild a session from the snapshot.
    ///
    /// Empty-string answers are read as "unanswered".
    ///
    /// # Errors
    ///
    /// Fails when the snapshot is internally inconsistent; see
    /// [`QuizSession::restore`].
    pub fn into_session(self, default_time_limit: u32) -> QuizResult<QuizSession> {
        let remaining = self.remaining_seconds(default_time_limit);
        let answers = self
            .user_answers
            .into_iter()
            .map(|answer| answer.filter(|a| !a.is_empty()))
            .collect();
        QuizSession::restore(self.questions, answers, self.current_index, remaining)
    }

    /// Serialize to the compact JSON stored under the session key.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a stored blob.
    ///
    /// # Errors
    ///
    /// Fails when required fields are missing or a question is malformed.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
