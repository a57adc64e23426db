//! Offline question supply backed by a JSON file.
//!
//! Accepts either a bare array of raw records or a saved API response
//! (`{"response_code": 0, "results": [...]}`).

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use serde::Deserialize;

use super::{OpenTdbResponse, QuestionSource};
use crate::error::{QuizError, QuizResult};
use crate::quiz::RawQuestion;

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionFile {
    Bare(Vec<RawQuestion>),
    Response(OpenTdbResponse),
}

/// Serves a random subset of the questions stored in a file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Read questions from `path` on every fetch.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> QuizResult<Vec<RawQuestion>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            QuizError::Fetch(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let parsed: QuestionFile = serde_json::from_str(&content).map_err(|e| {
            QuizError::Fetch(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        match parsed {
            QuestionFile::Bare(questions) => Ok(questions),
            QuestionFile::Response(response) => response.into_questions(),
        }
    }
}

impl QuestionSource for FileSource {
    fn fetch(&self, amount: usize) -> QuizResult<Vec<RawQuestion>> {
        let mut questions = self.read_all()?;
        if questions.is_empty() {
            return Err(QuizError::EmptyQuestionSet);
        }
        questions.shuffle(&mut rand::thread_rng());
        questions.truncate(amount);
        log::debug!(
            "Loaded {} questions from {}",
            questions.len(),
            self.path.display()
        );
        Ok(questions)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
