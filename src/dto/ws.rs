use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from player WebSocket clients.
#[serde(tag = "type")]
pub enum PlayerInboundMessage {
    /// Must be the first message; binds the socket to a roster entry.
    #[serde(rename = "join")]
    Join { name: String },
    /// Answer for the open question. A `null` option is an explicit "no answer".
    #[serde(rename = "answer")]
    Answer {
        question_id: u64,
        #[serde(default)]
        option_index: Option<usize>,
        #[serde(default)]
        elapsed_ms: Option<u64>,
    },
    #[serde(other)]
    Unknown,
}

impl PlayerInboundMessage {
    /// Parse a text frame.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Replies sent to the player on its own socket, next to the session events.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerOutboundMessage {
    /// Join accepted.
    Joined { name: String, players: Vec<String> },
    /// Answer accepted.
    AnswerResult {
        is_correct: bool,
        points: u64,
    },
    /// Request refused; the session is unchanged.
    Rejected { message: String },
}
