//! Business logic behind the session REST routes: PIN resolution, question-set
//! lookup and translation between wire DTOs and session actor calls.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::{
        phase::PhaseResponse,
        question_set::QuestionSetSummaryDto,
        session::{
            AnswerResponse, CreateSessionRequest, PlayerDto, RosterResponse,
            SessionCreatedResponse, SessionInfoDto, SubmitAnswerRequest,
        },
    },
    error::ServiceError,
    state::{
        SharedState, leaderboard::LeaderboardEntry, ledger::QuestionResults, pin::Pin,
        session::SessionHandle,
    },
};

/// Resolve a PIN path segment to a live session.
///
/// Malformed PINs are invalid input; unknown and disposed sessions both read
/// as not found.
pub fn find_session(state: &SharedState, pin: &str) -> Result<SessionHandle, ServiceError> {
    let pin: Pin = pin.parse()?;
    state.registry().get(&pin).ok_or_else(|| {
        debug!(%pin, "lookup for unknown session");
        ServiceError::NotFound("session not found".into())
    })
}

/// Open a session from a stored question set.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionCreatedResponse, ServiceError> {
    let question_set = state
        .question_sets()
        .get_questions(&request.question_set_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "question set `{}` not found",
                request.question_set_id
            ))
        })?;

    let host_id = request
        .host_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    let handle = state
        .registry()
        .create(question_set.title, host_id.clone(), question_set.questions)?;
    let session = handle.info().await?;
    info!(
        pin = %handle.pin(),
        question_set = %request.question_set_id,
        question_count = session.question_count,
        "session opened"
    );

    Ok(SessionCreatedResponse {
        pin: handle.pin().to_string(),
        host_id,
        session: session.into(),
    })
}

/// Public summary of a session.
pub async fn session_info(state: &SharedState, pin: &str) -> Result<SessionInfoDto, ServiceError> {
    let handle = find_session(state, pin)?;
    Ok(handle.info().await?.into())
}

/// Add a player to the lobby.
pub async fn join(
    state: &SharedState,
    pin: &str,
    name: String,
) -> Result<RosterResponse, ServiceError> {
    let handle = find_session(state, pin)?;
    let players = handle.join(name).await?;
    Ok(RosterResponse { players })
}

/// Remove a player from the live roster.
pub async fn leave(
    state: &SharedState,
    pin: &str,
    name: String,
) -> Result<RosterResponse, ServiceError> {
    let handle = find_session(state, pin)?;
    let players = handle.leave(name).await?;
    Ok(RosterResponse { players })
}

/// Every player admitted so far, live or not.
pub async fn list_players(state: &SharedState, pin: &str) -> Result<Vec<PlayerDto>, ServiceError> {
    let handle = find_session(state, pin)?;
    let players = handle.players().await?;
    Ok(players.into_iter().map(PlayerDto::from).collect())
}

/// Host starts the quiz.
pub async fn start(
    state: &SharedState,
    pin: &str,
    host_id: String,
) -> Result<PhaseResponse, ServiceError> {
    let handle = find_session(state, pin)?;
    Ok(handle.start(host_id).await?.into())
}

/// Host moves the session one step forward.
pub async fn advance(
    state: &SharedState,
    pin: &str,
    host_id: String,
) -> Result<PhaseResponse, ServiceError> {
    let handle = find_session(state, pin)?;
    Ok(handle.advance(host_id).await?.into())
}

/// Record a player's answer.
pub async fn submit_answer(
    state: &SharedState,
    pin: &str,
    request: SubmitAnswerRequest,
) -> Result<AnswerResponse, ServiceError> {
    let handle = find_session(state, pin)?;
    let outcome = handle.submit_answer(request.into()).await?;
    Ok(outcome.into())
}

/// Current standings.
pub async fn leaderboard(
    state: &SharedState,
    pin: &str,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let handle = find_session(state, pin)?;
    Ok(handle.leaderboard().await?)
}

/// Answer distribution for a shown question, host only.
pub async fn question_results(
    state: &SharedState,
    pin: &str,
    host_id: String,
    index: usize,
) -> Result<QuestionResults, ServiceError> {
    let handle = find_session(state, pin)?;
    Ok(handle.question_results(host_id, index).await?)
}

/// Host ends the session, freezing the final standings.
pub async fn end(
    state: &SharedState,
    pin: &str,
    host_id: String,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let handle = find_session(state, pin)?;
    Ok(handle.end(host_id).await?)
}

/// Question sets a session can be created from.
pub async fn list_question_sets(
    state: &SharedState,
) -> Result<Vec<QuestionSetSummaryDto>, ServiceError> {
    let sets = state.question_sets().list().await?;
    Ok(sets.into_iter().map(QuestionSetSummaryDto::from).collect())
}
