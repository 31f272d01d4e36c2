use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::session::SessionInfoDto,
    state::{events::SessionEvent, question::PublicQuestion, session::SessionSnapshot},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Render a session event, named after its wire tag.
    pub fn from_session_event(event: &SessionEvent) -> serde_json::Result<Self> {
        Self::json(Some(event.name().to_string()), event)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// First message on every session stream, consistent with the events that follow.
pub struct SnapshotEvent {
    pub session: SessionInfoDto,
    /// Live players in join order.
    pub players: Vec<String>,
    /// Question currently open, without its answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<PublicQuestion>,
    /// Time left to answer the open question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<u64>,
    /// Sequence number of the last event already applied.
    pub seq: u64,
}

impl From<SessionSnapshot> for SnapshotEvent {
    fn from(value: SessionSnapshot) -> Self {
        Self {
            session: SessionInfoDto::from(value.info),
            players: value.players,
            question: value.question,
            remaining_ms: value.remaining_ms,
            seq: value.seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::events::EventPayload;

    #[test]
    fn session_events_are_named_after_their_tag() {
        let event = SessionEvent {
            seq: 1,
            payload: EventPayload::RosterJoined {
                name: "Ana".into(),
                players: vec!["Ana".into()],
            },
        };

        let server_event = ServerEvent::from_session_event(&event).unwrap();
        assert_eq!(server_event.event.as_deref(), Some("roster-joined"));
        let data: serde_json::Value = serde_json::from_str(&server_event.data).unwrap();
        assert_eq!(data["seq"], 1);
        assert_eq!(data["players"][0], "Ana");
    }
}
