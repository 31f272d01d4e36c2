use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        format_system_time,
        phase::VisiblePhase,
        validation::{validate_not_blank, validate_player_name},
    },
    state::{
        ledger::SubmitOutcome,
        session::{AnswerSubmission, PlayerStatus, SessionInfo},
    },
};

/// Payload used to open a new session from a stored question set.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 64))]
    pub question_set_id: String,
    /// Identity the host will present in `x-host-id`. Generated when omitted.
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub host_id: Option<String>,
}

/// Response returned once a session is registered under its PIN.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionCreatedResponse {
    pub pin: String,
    pub host_id: String,
    pub session: SessionInfoDto,
}

/// Public summary of a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfoDto {
    pub pin: String,
    pub title: String,
    pub phase: VisiblePhase,
    /// Question the current phase refers to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
    pub question_count: usize,
    pub player_count: usize,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<SessionInfo> for SessionInfoDto {
    fn from(value: SessionInfo) -> Self {
        Self {
            pin: value.pin.to_string(),
            title: value.title,
            phase: VisiblePhase::from(&value.phase),
            question_index: value.phase.question_index(),
            question_count: value.question_count,
            player_count: value.player_count,
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Player joining the lobby.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRequest {
    pub name: String,
}

impl Validate for JoinRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_player_name(&self.name) {
            errors.add("name", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Live roster after a join or leave.
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterResponse {
    /// Display names of live players in join order.
    pub players: Vec<String>,
}

/// Player as listed by the roster endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerDto {
    pub name: String,
    pub connected: bool,
    /// RFC 3339 timestamp of the latest join.
    pub joined_at: String,
}

impl From<PlayerStatus> for PlayerDto {
    fn from(value: PlayerStatus) -> Self {
        Self {
            name: value.name,
            connected: value.connected,
            joined_at: format_system_time(value.joined_at),
        }
    }
}

/// Answer submitted by a player for the open question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    pub player: String,
    pub question_id: u64,
    /// Chosen option; `null` records an explicit "no answer".
    #[serde(default)]
    pub option_index: Option<usize>,
    /// Client-measured response time. Measured server-side when omitted.
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
}

impl Validate for SubmitAnswerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_not_blank(&self.player) {
            errors.add("player", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<SubmitAnswerRequest> for AnswerSubmission {
    fn from(value: SubmitAnswerRequest) -> Self {
        Self {
            player: value.player,
            question_id: value.question_id,
            option: value.option_index,
            elapsed_ms: value.elapsed_ms,
        }
    }
}

/// Outcome of an accepted answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    pub accepted: bool,
    pub is_correct: bool,
    pub points: u64,
}

impl From<SubmitOutcome> for AnswerResponse {
    fn from(value: SubmitOutcome) -> Self {
        Self {
            accepted: true,
            is_correct: value.is_correct,
            points: value.points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_requires_a_question_set_id() {
        let request: CreateSessionRequest =
            serde_json::from_str(r#"{ "question_set_id": "" }"#).unwrap();
        assert!(request.validate().is_err());

        let request: CreateSessionRequest =
            serde_json::from_str(r#"{ "question_set_id": "capitals" }"#).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.host_id.is_none());
    }

    #[test]
    fn join_request_rejects_blank_names() {
        let request = JoinRequest { name: "  ".into() };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn null_option_is_the_no_answer_sentinel() {
        let request: SubmitAnswerRequest = serde_json::from_str(
            r#"{ "player": "Ana", "question_id": 1, "option_index": null }"#,
        )
        .unwrap();
        let submission = AnswerSubmission::from(request);
        assert_eq!(submission.option, None);
        assert_eq!(submission.elapsed_ms, None);
    }
}
