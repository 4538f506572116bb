//! Session relay between a telephony call and the AI backend.
//!
//! One relay runs per `/media-stream` WebSocket. It opens the backend
//! connection, then drives a single select loop that owns all per-call
//! state, so frames from the two legs are applied one at a time and no
//! locking is needed.
//!
//! Audio crosses in both directions as opaque base64 µ-law. Control flow:
//! inbound `start`/`media`/`mark` frames feed the [`CallSession`] clock and
//! mark queue; backend audio deltas go out paired with a playback mark; a
//! VAD speech-started event runs the barge-in procedure (truncate the
//! backend item at the heard offset, clear the caller's audio queue).
//!
//! When either leg ends, the relay tears the other one down: dropping the
//! backend handle closes its socket task, and a `Close` route shuts the
//! call-leg sender.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::messages::{CallFrame, CallMessage, CallMessageRoute};
use crate::config::ServerConfig;
use crate::core::realtime::{self, RealtimeHandle, ServerEvent};
use crate::core::session::CallSession;
use crate::core::tools::{
    LOOKUP_FAILED_PLACEHOLDER, ORDER_LOOKUP_TOOL, OrderLookupClient, ToolInvocation,
};
use crate::state::AppState;

/// Channel capacity for the call-leg sender task.
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Checkpoint token sent after every forwarded audio chunk.
const MARK_LABEL: &str = "responsePart";

/// Prompt used to make the assistant speak first on connect.
const GREETING_PROMPT: &str =
    "Saluda al usuario cordialmente y pregúntale en qué puedes ayudarle.";

/// WebSocket upgrade handler for `/media-stream`.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_media_stream(socket, state))
}

/// Run one call end to end.
async fn handle_media_stream(socket: WebSocket, state: Arc<AppState>) {
    let call_id = Uuid::new_v4().to_string();
    info!("Media stream connected: {}", call_id);

    let realtime_config = state.config.realtime_config();
    let (backend, mut backend_rx) = match realtime::connect(&realtime_config).await {
        Ok(pair) => pair,
        Err(e) => {
            error!("Backend connection failed for {}: {}", call_id, e);
            let mut socket = socket;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    if state.config.greet_first
        && let Err(e) = backend.request_greeting(GREETING_PROMPT.to_string()).await
    {
        warn!("Greeting request failed for {}: {}", call_id, e);
    }

    let (mut ws_sink, mut ws_stream) = socket.split();
    let (call_tx, mut call_rx) = mpsc::channel::<CallMessageRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task: the only writer on the call-leg socket
    let sender_call_id = call_id.clone();
    let sender = tokio::spawn(async move {
        while let Some(route) = call_rx.recv().await {
            match route {
                CallMessageRoute::Outgoing(message) => {
                    let json = match serde_json::to_string(&message) {
                        Ok(j) => j,
                        Err(e) => {
                            error!("Failed to serialize call frame: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                        error!("Failed to send call frame: {}", e);
                        break;
                    }
                }
                CallMessageRoute::Close => {
                    let _ = ws_sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
        debug!("Call sender task ended: {}", sender_call_id);
    });

    let lookup = state
        .config
        .lookup_service_url
        .as_ref()
        .map(|url| OrderLookupClient::new(state.http.clone(), url.clone()));

    let mut relay = SessionRelay::new(
        call_id.clone(),
        backend,
        call_tx.clone(),
        lookup,
        &state.config,
    );

    loop {
        tokio::select! {
            // Telephony leg
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<CallFrame>(&text) {
                            Ok(frame) => {
                                if !relay.on_call_frame(frame).await {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Unparseable call frame for {}: {}", call_id, e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Call WebSocket closed: {}", call_id);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Call WebSocket error for {}: {}", call_id, e);
                        break;
                    }
                }
            }

            // AI backend leg
            event = backend_rx.recv() => {
                match event {
                    Some(event) => {
                        if !relay.on_backend_event(event).await {
                            break;
                        }
                    }
                    None => {
                        info!("Backend connection ended: {}", call_id);
                        break;
                    }
                }
            }
        }
    }

    // Tear down both legs
    let _ = call_tx.send(CallMessageRoute::Close).await;
    drop(relay);
    drop(call_tx);
    let _ = sender.await;
    info!("Session relay ended: {}", call_id);
}

/// Per-call dispatch state. Owned by the relay loop; every method runs on
/// that single task.
struct SessionRelay {
    call_id: String,
    session: CallSession,
    backend: RealtimeHandle,
    call_tx: mpsc::Sender<CallMessageRoute>,
    /// Tool names by call_id, recorded from output-item announcements
    pending_tool_names: HashMap<String, String>,
    lookup: Option<OrderLookupClient>,
    enabled_tools: Vec<String>,
    log_event_types: Vec<String>,
}

impl SessionRelay {
    fn new(
        call_id: String,
        backend: RealtimeHandle,
        call_tx: mpsc::Sender<CallMessageRoute>,
        lookup: Option<OrderLookupClient>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            call_id,
            session: CallSession::new(),
            backend,
            call_tx,
            pending_tool_names: HashMap::new(),
            lookup,
            enabled_tools: config.enabled_tools.clone(),
            log_event_types: config.log_event_types.clone(),
        }
    }

    /// Apply one frame from the telephony leg. Returns `false` when the
    /// relay should tear down.
    async fn on_call_frame(&mut self, frame: CallFrame) -> bool {
        match frame {
            CallFrame::Connected => {
                debug!("Call handshake complete: {}", self.call_id);
                true
            }
            CallFrame::Start { start } => {
                info!(
                    "Stream started for {}: {} (call sid {:?})",
                    self.call_id, start.stream_sid, start.call_sid
                );
                self.session.start_stream(start.stream_sid);
                true
            }
            CallFrame::Media { media } => {
                self.session.observe_media_timestamp(media.timestamp);
                if let Err(e) = self.backend.append_audio(media.payload).await {
                    warn!("Backend rejected audio for {}: {}", self.call_id, e);
                    return false;
                }
                true
            }
            CallFrame::Mark { .. } => {
                self.session.ack_mark();
                true
            }
            CallFrame::Stop => {
                info!("Stream stopped: {}", self.call_id);
                true
            }
            CallFrame::Other => true,
        }
    }

    /// Apply one event from the AI backend. Returns `false` when the relay
    /// should tear down.
    async fn on_backend_event(&mut self, event: ServerEvent) -> bool {
        if self.log_event_types.iter().any(|t| t == event.kind()) {
            info!("Backend event for {}: {}", self.call_id, event.kind());
        }

        match event {
            ServerEvent::AudioDelta { item_id, delta, .. } => {
                self.on_audio_delta(item_id, delta).await
            }
            ServerEvent::SpeechStarted { .. } => self.on_speech_started().await,
            ServerEvent::OutputItemAdded { item, .. } => {
                if item.item_type == "function_call"
                    && let (Some(call_id), Some(name)) = (item.call_id, item.name)
                {
                    self.pending_tool_names.insert(call_id, name);
                }
                true
            }
            ServerEvent::FunctionCallArgumentsDone {
                call_id, arguments, ..
            } => {
                let name = self.pending_tool_names.remove(&call_id).unwrap_or_default();
                self.on_tool_call(ToolInvocation {
                    call_id,
                    name,
                    arguments,
                })
                .await
            }
            ServerEvent::TranscriptionCompleted { transcript, .. } => {
                info!("Caller transcript ({}): {}", self.call_id, transcript);
                true
            }
            ServerEvent::AudioTranscriptDone { transcript, .. } => {
                info!("Assistant transcript ({}): {}", self.call_id, transcript);
                true
            }
            ServerEvent::Error { error } => {
                error!(
                    "Backend error for {}: {} ({})",
                    self.call_id, error.message, error.error_type
                );
                true
            }
            _ => true,
        }
    }

    /// Forward one response audio chunk and queue its playback checkpoint.
    ///
    /// Audio arriving before the stream `start` frame has nowhere to go and
    /// is dropped without touching session state.
    async fn on_audio_delta(&mut self, item_id: String, delta: String) -> bool {
        let Some(stream_sid) = self.session.stream_sid().map(str::to_string) else {
            debug!("Dropping audio delta before stream start: {}", self.call_id);
            return true;
        };

        self.session.begin_response_chunk(item_id);
        if !self.send_call(CallMessage::media(&stream_sid, delta)).await {
            return false;
        }
        self.session.push_mark(MARK_LABEL);
        self.send_call(CallMessage::mark(stream_sid, MARK_LABEL)).await
    }

    /// Barge-in: the caller started talking over the assistant.
    ///
    /// Only acts when a response is actually being played (marks outstanding
    /// and a recorded start offset); a stale or repeated VAD event is a no-op.
    async fn on_speech_started(&mut self) -> bool {
        let Some(interruption) = self.session.interrupt() else {
            return true;
        };
        info!("Caller barge-in: {}", self.call_id);

        if let Some(truncation) = interruption.truncation {
            debug!(
                "Truncating {} at {}ms for {}",
                truncation.item_id, truncation.audio_end_ms, self.call_id
            );
            if let Err(e) = self
                .backend
                .truncate_item(truncation.item_id, truncation.audio_end_ms)
                .await
            {
                warn!("Truncation failed for {}: {}", self.call_id, e);
                return false;
            }
        }

        self.send_call(CallMessage::clear(interruption.stream_sid))
            .await
    }

    /// Answer one tool invocation.
    ///
    /// A recognized tool always gets an output back, placeholder included,
    /// so the backend can keep the conversation going. An unrecognized name
    /// is logged and dropped.
    async fn on_tool_call(&mut self, invocation: ToolInvocation) -> bool {
        if !self.enabled_tools.iter().any(|t| t == &invocation.name) {
            warn!(
                "Ignoring unrecognized tool call '{}' for {}",
                invocation.name, self.call_id
            );
            return true;
        }

        let output = match (&self.lookup, invocation.name.as_str()) {
            (Some(client), ORDER_LOOKUP_TOOL) => match invocation.parse_order_args() {
                Ok(args) => client.lookup(&args.id.to_string()).await,
                Err(e) => {
                    warn!(
                        "Bad arguments for {} ({}): {}",
                        ORDER_LOOKUP_TOOL, self.call_id, e
                    );
                    LOOKUP_FAILED_PLACEHOLDER.to_string()
                }
            },
            _ => LOOKUP_FAILED_PLACEHOLDER.to_string(),
        };

        if let Err(e) = self
            .backend
            .submit_tool_output(invocation.call_id, output)
            .await
        {
            warn!("Tool output submission failed for {}: {}", self.call_id, e);
            return false;
        }
        true
    }

    async fn send_call(&self, message: CallMessage) -> bool {
        if self
            .call_tx
            .send(CallMessageRoute::Outgoing(message))
            .await
            .is_err()
        {
            warn!("Call sender task gone: {}", self.call_id);
            return false;
        }
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
