use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use indexmap::IndexMap;

use crate::{
    dao::{
        question_sets::{QuestionSetProvider, QuestionSetSummary},
        storage::ProviderResult,
    },
    state::question::QuestionSet,
};

/// Fixed catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionSetProvider {
    sets: Arc<IndexMap<String, QuestionSet>>,
}

impl InMemoryQuestionSetProvider {
    /// Build a catalog from `sets`; later duplicates of an id win.
    pub fn new(sets: impl IntoIterator<Item = QuestionSet>) -> Self {
        let sets = sets
            .into_iter()
            .map(|set| (set.id.clone(), set))
            .collect::<IndexMap<_, _>>();
        Self {
            sets: Arc::new(sets),
        }
    }
}

impl QuestionSetProvider for InMemoryQuestionSetProvider {
    fn get_questions(&self, id: &str) -> BoxFuture<'static, ProviderResult<Option<QuestionSet>>> {
        let found = self.sets.get(id).cloned();
        futures::future::ready(Ok(found)).boxed()
    }

    fn list(&self) -> BoxFuture<'static, ProviderResult<Vec<QuestionSetSummary>>> {
        let summaries = self.sets.values().map(QuestionSetSummary::from).collect();
        futures::future::ready(Ok(summaries)).boxed()
    }
}
