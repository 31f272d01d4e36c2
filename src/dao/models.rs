use serde::{Deserialize, Serialize};

use crate::state::question::{Question, QuestionSet};

/// Question bank entry as stored in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionSetEntity {
    /// Stable identifier hosts pass when creating a session.
    pub id: String,
    /// Human readable quiz title.
    pub title: String,
    /// Ordered questions.
    pub questions: Vec<QuestionEntity>,
}

/// Single question inside a [`QuestionSetEntity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    pub id: u64,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Overrides the configured default answer window.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            prompt: value.prompt,
            options: value.options,
            correct_index: value.correct_index,
            explanation: value.explanation,
            time_limit_ms: value.time_limit_ms,
        }
    }
}

impl From<QuestionSetEntity> for QuestionSet {
    fn from(value: QuestionSetEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            questions: value.questions.into_iter().map(Into::into).collect(),
        }
    }
}
