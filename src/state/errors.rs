use thiserror::Error;

use crate::state::{question::QuestionSetError, state_machine::InvalidTransition};

/// Typed rejection returned by a session for any refused operation.
///
/// None of these mutate the session; they are reported back to the caller only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Joins are only accepted while the session is in the lobby.
    #[error("session is not accepting new players")]
    SessionNotJoinable,
    /// A live player already uses this name (case-insensitive).
    #[error("name '{0}' is already taken")]
    NameTaken(String),
    /// The submitted name is empty, too long or contains control characters.
    #[error("invalid player name: {0}")]
    InvalidName(String),
    /// The roster reached its configured capacity.
    #[error("session is full")]
    SessionFull,
    /// No live player with that name exists in the session.
    #[error("player '{0}' is not part of this session")]
    PlayerUnknown(String),
    /// The answer does not target the question currently open.
    #[error("question is not currently open for answers")]
    NotActiveQuestion,
    /// The player already has an answer recorded for this question.
    #[error("answer already recorded for this question")]
    AlreadyAnswered,
    /// The chosen option does not exist on the question.
    #[error("option {0} does not exist on this question")]
    InvalidOption(usize),
    /// Host-only operation attempted by someone else.
    #[error("only the host can perform this action")]
    NotHost,
    /// Starting requires at least one live player.
    #[error("cannot start a session without players")]
    RosterEmpty,
    /// Operation not allowed from the current phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// Requested question index does not exist or has not been shown yet.
    #[error("question {0} has not been shown")]
    QuestionNotShown(usize),
    /// The question set cannot be attached to a session.
    #[error(transparent)]
    InvalidQuestionSet(#[from] QuestionSetError),
    /// The session has ended and only accepts reads.
    #[error("session has ended and is read-only")]
    ReadOnly,
    /// The session has been disposed.
    #[error("session is closed")]
    SessionClosed,
}

impl SessionError {
    /// Conflicts are benign outcomes of concurrent callers rather than failures.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SessionError::SessionNotJoinable
                | SessionError::NameTaken(_)
                | SessionError::SessionFull
                | SessionError::NotActiveQuestion
                | SessionError::AlreadyAnswered
                | SessionError::RosterEmpty
                | SessionError::ReadOnly
                | SessionError::InvalidTransition(_)
        )
    }
}
