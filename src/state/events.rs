use serde::Serialize;

use crate::state::{
    leaderboard::LeaderboardEntry, ledger::QuestionResults, question::PublicQuestion,
};

/// Why a question stopped accepting answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The deadline elapsed.
    Timeout,
    /// Every live player had answered.
    AllAnswered,
}

/// Event pushed to every subscriber of a session, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    /// Per-session sequence number, starting at 1 and increasing by one.
    pub seq: u64,
    /// Event body; its tag doubles as the SSE event name.
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl SessionEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        self.payload.name()
    }
}

/// Body of a [`SessionEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EventPayload {
    RosterJoined {
        name: String,
        players: Vec<String>,
    },
    RosterChanged {
        left: String,
        players: Vec<String>,
    },
    GameStarted {
        question_count: usize,
    },
    QuestionShown {
        index: usize,
        count: usize,
        question: PublicQuestion,
        time_limit_ms: u64,
    },
    AnswerTallyChanged {
        index: usize,
        answered: usize,
        eligible: usize,
    },
    AnswerRevealed {
        index: usize,
        question_id: u64,
        correct_index: usize,
        explanation: Option<String>,
        reason: CloseReason,
        results: QuestionResults,
    },
    LeaderboardShown {
        index: usize,
        is_final: bool,
        entries: Vec<LeaderboardEntry>,
    },
    GameEnded {
        entries: Vec<LeaderboardEntry>,
    },
    Error {
        message: String,
    },
}

impl EventPayload {
    /// Wire name, identical to the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            EventPayload::RosterJoined { .. } => "roster-joined",
            EventPayload::RosterChanged { .. } => "roster-changed",
            EventPayload::GameStarted { .. } => "game-started",
            EventPayload::QuestionShown { .. } => "question-shown",
            EventPayload::AnswerTallyChanged { .. } => "answer-tally-changed",
            EventPayload::AnswerRevealed { .. } => "answer-revealed",
            EventPayload::LeaderboardShown { .. } => "leaderboard-shown",
            EventPayload::GameEnded { .. } => "game-ended",
            EventPayload::Error { .. } => "error",
        }
    }
}
