//! Open Trivia DB client.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use super::{Difficulty, QuestionSource, MAX_QUESTIONS_PER_REQUEST};
use crate::error::{QuizError, QuizResult};
use crate::quiz::RawQuestion;

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://opentdb.com/api.php";

/// Response envelope of the API.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenTdbResponse {
    /// 0 on success; see [`OpenTdbResponse::into_questions`] for the others.
    pub response_code: u8,
    /// The questions. Absent on some error responses.
    #[serde(default)]
    pub results: Vec<RawQuestion>,
}

impl OpenTdbResponse {
    /// Map the response code to questions or an error.
    ///
    /// | code | meaning |
    /// |---|---|
    /// | 0 | success |
    /// | 1 | not enough questions for the query |
    /// | 2 | invalid parameter |
    /// | 3, 4 | session token problem |
    /// | 5 | rate limited |
    ///
    /// # Errors
    ///
    /// [`QuizError::EmptyQuestionSet`] for code 1 or an empty result list,
    /// [`QuizError::Fetch`] for any other non-zero code.
    pub fn into_questions(self) -> QuizResult<Vec<RawQuestion>> {
        match self.response_code {
            0 if self.results.is_empty() => Err(QuizError::EmptyQuestionSet),
            0 => Ok(self.results),
            1 => Err(QuizError::EmptyQuestionSet),
            2 => Err(QuizError::Fetch("the trivia API rejected the request parameters".into())),
            5 => Err(QuizError::Fetch("rate limited by the trivia API, wait a few seconds".into())),
            code => Err(QuizError::Fetch(format!("trivia API returned code {code}"))),
        }
    }
}

/// Fetches questions from the Open Trivia DB API.
#[derive(Debug, Clone)]
pub struct OpenTdbSource {
    client: Client,
    base_url: String,
    category: Option<u32>,
    difficulty: Option<Difficulty>,
}

impl OpenTdbSource {
    /// Build a client for `base_url` with a request timeout.
    ///
    /// # Errors
    ///
    /// [`QuizError::Fetch`] if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> QuizResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("timed-quiz/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QuizError::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            category: None,
            difficulty: None,
        })
    }

    /// Restrict to one category id.
    #[must_use]
    pub fn with_category(mut self, category: Option<u32>) -> Self {
        self.category = category;
        self
    }

    /// Restrict to one difficulty.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Request URL for `amount` questions.
    ///
    /// # Errors
    ///
    /// [`QuizError::Fetch`] if the base URL does not parse.
    pub fn request_url(&self, amount: usize) -> QuizResult<Url> {
        let amount = amount.clamp(1, MAX_QUESTIONS_PER_REQUEST).to_string();
        let mut params = vec![("amount", amount), ("type", "multiple".to_string())];
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        if let Some(difficulty) = self.difficulty {
            params.push(("difficulty", difficulty.as_str().to_string()));
        }
        Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| QuizError::Fetch(format!("invalid API URL '{}': {e}", self.base_url)))
    }
}

impl QuestionSource for OpenTdbSource {
    fn fetch(&self, amount: usize) -> QuizResult<Vec<RawQuestion>> {
        let url = self.request_url(amount)?;
        log::info!("Requesting {amount} questions from {}", url.host_str().unwrap_or("?"));

        let response: OpenTdbResponse = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| {
                log::error!("Question request failed: {e}");
                QuizError::Fetch(e.to_string())
            })?;

        let questions = response.into_questions()?;
        log::debug!("Received {} questions", questions.len());
        Ok(questions)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
