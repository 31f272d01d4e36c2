use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::SessionPhase;

/// Publicly visible session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Players are joining.
    Lobby,
    /// A question accepts answers.
    QuestionOpen,
    /// The correct option is displayed.
    AnswerRevealed,
    /// Intermediate standings are displayed.
    LeaderboardShown,
    /// The podium is displayed.
    FinalResults,
    /// Session ended and is read-only.
    Closed,
}

impl From<&SessionPhase> for VisiblePhase {
    fn from(value: &SessionPhase) -> Self {
        match value {
            SessionPhase::Lobby => VisiblePhase::Lobby,
            SessionPhase::QuestionOpen { .. } => VisiblePhase::QuestionOpen,
            SessionPhase::AnswerRevealed { .. } => VisiblePhase::AnswerRevealed,
            SessionPhase::LeaderboardShown { .. } => VisiblePhase::LeaderboardShown,
            SessionPhase::FinalResults => VisiblePhase::FinalResults,
            SessionPhase::Closed => VisiblePhase::Closed,
        }
    }
}

/// Phase reached after a host transition.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhaseResponse {
    pub phase: VisiblePhase,
    /// Question the phase refers to, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
}

impl From<SessionPhase> for PhaseResponse {
    fn from(value: SessionPhase) -> Self {
        Self {
            phase: VisiblePhase::from(&value),
            question_index: value.question_index(),
        }
    }
}
