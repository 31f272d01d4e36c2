use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a health payload carrying the live session count.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let sessions = state.registry().len();
    debug!(sessions, "health check");
    HealthResponse::ok(sessions)
}
