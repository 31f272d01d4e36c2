use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sessions/{pin}/events",
    tag = "sse",
    params(("pin" = String, Path, description = "Six-digit session PIN")),
    responses(
        (status = 200, description = "Session event stream, starting with a `snapshot` event", content_type = "text/event-stream", body = String),
        (status = 400, description = "Malformed PIN"),
        (status = 404, description = "Unknown or disposed session")
    )
)]
/// Stream the ordered events of one session to a display or player client.
pub async fn session_stream(
    State(state): State<SharedState>,
    Path(pin): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (pin, subscription) = sse_service::subscribe_session(&state, &pin).await?;
    info!(%pin, subscriber = %subscription.id, seq = subscription.snapshot.seq, "new session SSE connection");
    Ok(sse_service::to_sse_stream(pin, subscription))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sessions/{pin}/events", get(session_stream))
}
