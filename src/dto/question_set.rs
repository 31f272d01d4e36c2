use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::question_sets::QuestionSetSummary;

/// Question set available to create a session from.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSetSummaryDto {
    pub id: String,
    pub title: String,
    pub question_count: usize,
}

impl From<QuestionSetSummary> for QuestionSetSummaryDto {
    fn from(value: QuestionSetSummary) -> Self {
        Self {
            id: value.id,
            title: value.title,
            question_count: value.question_count,
        }
    }
}
