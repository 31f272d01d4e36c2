mod json;
mod memory;

pub use self::json::JsonQuestionSetProvider;
pub use self::memory::InMemoryQuestionSetProvider;

use futures::future::BoxFuture;

use crate::dao::storage::ProviderResult;
use crate::state::question::QuestionSet;

/// Catalog listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSetSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
}

/// Read-only source of question banks, consulted when a session is created.
pub trait QuestionSetProvider: Send + Sync {
    /// Fetch one question set by id. `Ok(None)` when the id is unknown.
    fn get_questions(&self, id: &str) -> BoxFuture<'static, ProviderResult<Option<QuestionSet>>>;
    /// List every available question set.
    fn list(&self) -> BoxFuture<'static, ProviderResult<Vec<QuestionSetSummary>>>;
}

impl From<&QuestionSet> for QuestionSetSummary {
    fn from(value: &QuestionSet) -> Self {
        Self {
            id: value.id.clone(),
            title: value.title.clone(),
            question_count: value.questions.len(),
        }
    }
}
