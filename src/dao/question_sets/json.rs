use std::path::{Path, PathBuf};

use futures::{FutureExt, future::BoxFuture};
use tracing::debug;

use crate::{
    dao::{
        models::QuestionSetEntity,
        question_sets::{QuestionSetProvider, QuestionSetSummary},
        storage::{ProviderError, ProviderResult},
    },
    state::question::QuestionSet,
};

/// Catalog backed by a JSON file holding an array of question sets.
///
/// The file is read on every request so edits apply to the next session
/// without a restart.
#[derive(Debug, Clone)]
pub struct JsonQuestionSetProvider {
    path: PathBuf,
}

impl JsonQuestionSetProvider {
    /// Provider reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the catalog file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_catalog(path: PathBuf) -> ProviderResult<Vec<QuestionSet>> {
        let contents = tokio::fs::read_to_string(&path).await.map_err(|err| {
            ProviderError::unavailable(format!("cannot read {}", path.display()), err)
        })?;
        let entities: Vec<QuestionSetEntity> =
            serde_json::from_str(&contents).map_err(|source| ProviderError::Malformed {
                message: path.display().to_string(),
                source,
            })?;
        debug!(path = %path.display(), sets = entities.len(), "read question set catalog");

        Ok(entities.into_iter().map(Into::into).collect())
    }
}

impl QuestionSetProvider for JsonQuestionSetProvider {
    fn get_questions(&self, id: &str) -> BoxFuture<'static, ProviderResult<Option<QuestionSet>>> {
        let path = self.path.clone();
        let id = id.to_string();
        async move {
            let catalog = Self::read_catalog(path).await?;
            Ok(catalog.into_iter().find(|set| set.id == id))
        }
        .boxed()
    }

    fn list(&self) -> BoxFuture<'static, ProviderResult<Vec<QuestionSetSummary>>> {
        let path = self.path.clone();
        async move {
            let catalog = Self::read_catalog(path).await?;
            Ok(catalog.iter().map(QuestionSetSummary::from).collect())
        }
        .boxed()
    }
}
