//! Call intake webhook and health endpoint.
//!
//! The telephony provider hits `/incoming-call` when a call arrives. The
//! response is a small TwiML document that greets the caller and connects
//! the call's audio to this server's `/media-stream` WebSocket. The stream
//! URL is derived from the request's own Host header, so the document works
//! unchanged behind tunnels and load balancers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{info, warn};

use crate::state::AppState;

/// Health check for load balancers and uptime probes.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "voicebridge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Respond to an incoming call with connection instructions.
///
/// Accepts any method; the provider POSTs in production while GET makes
/// manual checks easy.
pub async fn incoming_call(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            warn!("Incoming call request without Host header");
            state.config.address()
        });

    info!("Incoming call, connecting stream via {}", host);

    let twiml = connect_stream_twiml(&host);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        twiml,
    )
        .into_response()
}

/// TwiML that says a short greeting line and hands the call's audio to the
/// media-stream WebSocket.
fn connect_stream_twiml(host: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Say language="es-MX">Un momento, le conectamos con nuestro asistente.</Say>
    <Connect>
        <Stream url="wss://{host}/media-stream" />
    </Connect>
</Response>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twiml_points_stream_at_request_host() {
        let twiml = connect_stream_twiml("example.ngrok.app");
        assert!(twiml.contains(r#"<Stream url="wss://example.ngrok.app/media-stream" />"#));
        assert!(twiml.starts_with("<?xml"));
        assert!(twiml.contains("<Connect>"));
    }
}
