//! Route definitions for the Voicebridge server.

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, incoming_call, media_stream_handler};
use crate::state::AppState;

/// Create the application router.
///
/// - `GET /` - health check
/// - `ANY /incoming-call` - call intake webhook (TwiML)
/// - `GET /media-stream` - telephony media WebSocket
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/incoming-call", any(incoming_call))
        .route("/media-stream", get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
