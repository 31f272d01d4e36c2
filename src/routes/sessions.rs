use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    routing::{delete, get, post},
};
use validator::Validate;

use crate::{
    dto::{
        phase::PhaseResponse,
        question_set::QuestionSetSummaryDto,
        session::{
            AnswerResponse, CreateSessionRequest, JoinRequest, PlayerDto, RosterResponse,
            SessionCreatedResponse, SessionInfoDto, SubmitAnswerRequest,
        },
    },
    error::AppError,
    services::session_service,
    state::{SharedState, leaderboard::LeaderboardEntry, ledger::QuestionResults},
};

const HOST_ID_HEADER: &str = "x-host-id";

/// Identity presented by the caller for host-only operations.
pub struct HostId(pub String);

impl<S> FromRequestParts<S> for HostId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(HOST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| HostId(value.to_owned()))
            .ok_or_else(|| AppError::Unauthorized("missing host identity header `X-Host-Id`".into()))
    }
}

/// Session lifecycle endpoints for hosts and players.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/question-sets", get(list_question_sets))
        .route("/sessions", post(create_session))
        .route("/sessions/{pin}", get(get_session))
        .route("/sessions/{pin}/players", get(list_players).post(join_session))
        .route("/sessions/{pin}/players/{name}", delete(leave_session))
        .route("/sessions/{pin}/start", post(start_session))
        .route("/sessions/{pin}/advance", post(advance_session))
        .route("/sessions/{pin}/answers", post(submit_answer))
        .route("/sessions/{pin}/leaderboard", get(get_leaderboard))
        .route(
            "/sessions/{pin}/questions/{index}/results",
            get(get_question_results),
        )
        .route("/sessions/{pin}/end", post(end_session))
}

/// List the question sets a session can be created from.
#[utoipa::path(
    get,
    path = "/question-sets",
    tag = "sessions",
    responses(
        (status = 200, description = "Available question sets", body = [QuestionSetSummaryDto]),
        (status = 503, description = "Question-set provider unavailable")
    )
)]
pub async fn list_question_sets(
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuestionSetSummaryDto>>, AppError> {
    Ok(Json(session_service::list_question_sets(&state).await?))
}

/// Open a new session in the lobby under a fresh PIN.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionCreatedResponse),
        (status = 400, description = "Invalid request or unusable question set (QuestionSetEmpty)"),
        (status = 404, description = "Question set not found"),
        (status = 503, description = "No PIN available or provider unavailable")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionCreatedResponse>), AppError> {
    payload.validate()?;
    let created = session_service::create_session(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Retrieve the public summary of a session.
#[utoipa::path(
    get,
    path = "/sessions/{pin}",
    tag = "sessions",
    params(("pin" = String, Path, description = "Six-digit session PIN")),
    responses(
        (status = 200, description = "Session summary", body = SessionInfoDto),
        (status = 400, description = "Malformed PIN"),
        (status = 404, description = "Unknown or disposed session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(pin): Path<String>,
) -> Result<Json<SessionInfoDto>, AppError> {
    Ok(Json(session_service::session_info(&state, &pin).await?))
}

/// List every player admitted to the session with their liveness.
#[utoipa::path(
    get,
    path = "/sessions/{pin}/players",
    tag = "players",
    params(("pin" = String, Path, description = "Six-digit session PIN")),
    responses(
        (status = 200, description = "Players in join order", body = [PlayerDto]),
        (status = 404, description = "Unknown or disposed session")
    )
)]
pub async fn list_players(
    State(state): State<SharedState>,
    Path(pin): Path<String>,
) -> Result<Json<Vec<PlayerDto>>, AppError> {
    Ok(Json(session_service::list_players(&state, &pin).await?))
}

/// Join the lobby under a display name.
#[utoipa::path(
    post,
    path = "/sessions/{pin}/players",
    tag = "players",
    params(("pin" = String, Path, description = "Six-digit session PIN")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Joined; live roster returned", body = RosterResponse),
        (status = 400, description = "Invalid name"),
        (status = 404, description = "Unknown or disposed session"),
        (status = 409, description = "Name taken, session full or not in the lobby")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Path(pin): Path<String>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<RosterResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        session_service::join(&state, &pin, payload.name).await?,
    ))
}

/// Leave the session; answers already recorded keep counting.
#[utoipa::path(
    delete,
    path = "/sessions/{pin}/players/{name}",
    tag = "players",
    params(
        ("pin" = String, Path, description = "Six-digit session PIN"),
        ("name" = String, Path, description = "Player display name (case-insensitive)")
    ),
    responses(
        (status = 200, description = "Left; live roster returned", body = RosterResponse),
        (status = 404, description = "Unknown session or player"),
        (status = 409, description = "Session has ended")
    )
)]
pub async fn leave_session(
    State(state): State<SharedState>,
    Path((pin, name)): Path<(String, String)>,
) -> Result<Json<RosterResponse>, AppError> {
    Ok(Json(session_service::leave(&state, &pin, name).await?))
}

/// Host starts the quiz and opens the first question.
#[utoipa::path(
    post,
    path = "/sessions/{pin}/start",
    tag = "host",
    params(
        ("pin" = String, Path, description = "Six-digit session PIN"),
        ("X-Host-Id" = String, Header, description = "Host identity returned at creation")
    ),
    responses(
        (status = 200, description = "Question 0 is open", body = PhaseResponse),
        (status = 401, description = "Caller is not the host"),
        (status = 404, description = "Unknown or disposed session"),
        (status = 409, description = "Not in the lobby or no players")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    HostId(host_id): HostId,
    Path(pin): Path<String>,
) -> Result<Json<PhaseResponse>, AppError> {
    Ok(Json(session_service::start(&state, &pin, host_id).await?))
}

/// Host moves from the reveal to the standings, then to the next question or the podium.
#[utoipa::path(
    post,
    path = "/sessions/{pin}/advance",
    tag = "host",
    params(
        ("pin" = String, Path, description = "Six-digit session PIN"),
        ("X-Host-Id" = String, Header, description = "Host identity returned at creation")
    ),
    responses(
        (status = 200, description = "Phase reached", body = PhaseResponse),
        (status = 401, description = "Caller is not the host"),
        (status = 404, description = "Unknown or disposed session"),
        (status = 409, description = "Nothing to advance from the current phase")
    )
)]
pub async fn advance_session(
    State(state): State<SharedState>,
    HostId(host_id): HostId,
    Path(pin): Path<String>,
) -> Result<Json<PhaseResponse>, AppError> {
    Ok(Json(session_service::advance(&state, &pin, host_id).await?))
}

/// Submit an answer for the open question.
#[utoipa::path(
    post,
    path = "/sessions/{pin}/answers",
    tag = "players",
    params(("pin" = String, Path, description = "Six-digit session PIN")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer accepted and scored", body = AnswerResponse),
        (status = 400, description = "Invalid option"),
        (status = 404, description = "Unknown session or player"),
        (status = 409, description = "Already answered or question not open")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(pin): Path<String>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        session_service::submit_answer(&state, &pin, payload).await?,
    ))
}

/// Current standings over closed questions.
#[utoipa::path(
    get,
    path = "/sessions/{pin}/leaderboard",
    tag = "sessions",
    params(("pin" = String, Path, description = "Six-digit session PIN")),
    responses(
        (status = 200, description = "Ranked standings", body = [LeaderboardEntry]),
        (status = 404, description = "Unknown or disposed session")
    )
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Path(pin): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(session_service::leaderboard(&state, &pin).await?))
}

/// Answer distribution of a shown question.
#[utoipa::path(
    get,
    path = "/sessions/{pin}/questions/{index}/results",
    tag = "host",
    params(
        ("pin" = String, Path, description = "Six-digit session PIN"),
        ("index" = usize, Path, description = "Zero-based question index"),
        ("X-Host-Id" = String, Header, description = "Host identity returned at creation")
    ),
    responses(
        (status = 200, description = "Per-option distribution", body = QuestionResults),
        (status = 401, description = "Caller is not the host"),
        (status = 404, description = "Unknown session or question not shown yet")
    )
)]
pub async fn get_question_results(
    State(state): State<SharedState>,
    HostId(host_id): HostId,
    Path((pin, index)): Path<(String, usize)>,
) -> Result<Json<QuestionResults>, AppError> {
    Ok(Json(
        session_service::question_results(&state, &pin, host_id, index).await?,
    ))
}

/// Host ends the session from the final results.
#[utoipa::path(
    post,
    path = "/sessions/{pin}/end",
    tag = "host",
    params(
        ("pin" = String, Path, description = "Six-digit session PIN"),
        ("X-Host-Id" = String, Header, description = "Host identity returned at creation")
    ),
    responses(
        (status = 200, description = "Final standings, now immutable", body = [LeaderboardEntry]),
        (status = 401, description = "Caller is not the host"),
        (status = 404, description = "Unknown or disposed session"),
        (status = 409, description = "Final results not reached yet")
    )
)]
pub async fn end_session(
    State(state): State<SharedState>,
    HostId(host_id): HostId,
    Path(pin): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(session_service::end(&state, &pin, host_id).await?))
}
