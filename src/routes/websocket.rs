use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::{
    error::AppError,
    services::{session_service, websocket_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sessions/{pin}/ws",
    tag = "players",
    params(("pin" = String, Path, description = "Six-digit session PIN")),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 404, description = "Unknown or disposed session")
    )
)]
/// Upgrade the HTTP connection into a player WebSocket bound to one session.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Path(pin): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let session = session_service::find_session(&state, &pin)?;
    Ok(ws.on_upgrade(move |socket| websocket_service::handle_socket(session, socket)))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sessions/{pin}/ws", get(ws_handler))
}
