/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Session lifecycle operations behind the REST routes.
pub mod session_service;
/// Server-Sent Events streaming of session events.
pub mod sse_service;
/// Player WebSocket connection and message handling service.
pub mod websocket_service;
