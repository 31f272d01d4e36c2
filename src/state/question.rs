use std::{collections::HashSet, time::Duration};

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Number of options every multiple-choice question carries.
pub const OPTION_COUNT: usize = 4;

/// A single multiple-choice question attached to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Stable identifier used by answer submissions.
    pub id: u64,
    /// Text shown to players.
    pub prompt: String,
    /// Ordered option texts; always [`OPTION_COUNT`] entries once validated.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_index: usize,
    /// Optional explanation revealed together with the answer.
    pub explanation: Option<String>,
    /// Per-question time limit override in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl Question {
    /// Time players have to answer, falling back to the session default.
    pub fn time_limit(&self, fallback: Duration) -> Duration {
        self.time_limit_ms
            .map(Duration::from_millis)
            .unwrap_or(fallback)
    }

    /// Whether the given option is the correct one. The sentinel never is.
    pub fn is_correct(&self, option: Option<usize>) -> bool {
        option == Some(self.correct_index)
    }

    /// Projection safe to show players before the reveal.
    pub fn public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            prompt: self.prompt.clone(),
            options: self.options.clone(),
        }
    }
}

/// Question payload pushed to clients while answering; omits the correct index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PublicQuestion {
    pub id: u64,
    pub prompt: String,
    pub options: Vec<String>,
}

/// A titled, ordered question bank as supplied by the question-set provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    /// Provider-side identifier.
    pub id: String,
    /// Display title of the quiz.
    pub title: String,
    /// Ordered questions.
    pub questions: Vec<Question>,
}

/// Reasons a question bank cannot be attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionSetError {
    #[error("question set has no questions")]
    Empty,
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: u64 },
    #[error("question {id} has {count} options, expected {OPTION_COUNT}")]
    WrongOptionCount { id: u64, count: usize },
    #[error("question {id} marks option {index} as correct, which does not exist")]
    CorrectIndexOutOfRange { id: u64, index: usize },
    #[error("question {id} has a zero time limit")]
    ZeroTimeLimit { id: u64 },
    #[error("question id {0} appears more than once")]
    DuplicateId(u64),
}

/// Check that a question bank can drive a session.
pub fn validate_questions(questions: &[Question]) -> Result<(), QuestionSetError> {
    if questions.is_empty() {
        return Err(QuestionSetError::Empty);
    }

    let mut seen = HashSet::new();
    for question in questions {
        let id = question.id;
        if !seen.insert(id) {
            return Err(QuestionSetError::DuplicateId(id));
        }
        if question.prompt.trim().is_empty() {
            return Err(QuestionSetError::EmptyPrompt { id });
        }
        if question.options.len() != OPTION_COUNT {
            return Err(QuestionSetError::WrongOptionCount {
                id,
                count: question.options.len(),
            });
        }
        if question.correct_index >= question.options.len() {
            return Err(QuestionSetError::CorrectIndexOutOfRange {
                id,
                index: question.correct_index,
            });
        }
        if question.time_limit_ms == Some(0) {
            return Err(QuestionSetError::ZeroTimeLimit { id });
        }
    }

    Ok(())
}
