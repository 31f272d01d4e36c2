use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for PinQuiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sessions::list_question_sets,
        crate::routes::sessions::create_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::list_players,
        crate::routes::sessions::join_session,
        crate::routes::sessions::leave_session,
        crate::routes::sessions::start_session,
        crate::routes::sessions::advance_session,
        crate::routes::sessions::submit_answer,
        crate::routes::sessions::get_leaderboard,
        crate::routes::sessions::get_question_results,
        crate::routes::sessions::end_session,
        crate::routes::sse::session_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisiblePhase,
            crate::dto::phase::PhaseResponse,
            crate::dto::question_set::QuestionSetSummaryDto,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::SessionCreatedResponse,
            crate::dto::session::SessionInfoDto,
            crate::dto::session::JoinRequest,
            crate::dto::session::RosterResponse,
            crate::dto::session::PlayerDto,
            crate::dto::session::SubmitAnswerRequest,
            crate::dto::session::AnswerResponse,
            crate::dto::sse::SnapshotEvent,
            crate::dto::ws::PlayerInboundMessage,
            crate::dto::ws::PlayerOutboundMessage,
            crate::state::leaderboard::LeaderboardEntry,
            crate::state::ledger::QuestionResults,
            crate::state::question::PublicQuestion,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sessions", description = "Session creation and read-only views"),
        (name = "players", description = "Roster and answer submission"),
        (name = "host", description = "Host-only session transitions"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
