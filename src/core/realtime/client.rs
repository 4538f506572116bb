//! OpenAI Realtime API connection.
//!
//! One outbound WebSocket session per telephony call. [`connect`] performs
//! the authenticated handshake, spawns the socket task, sends the session
//! configuration before anything else, and hands back a [`RealtimeHandle`]
//! for client events plus a receiver of parsed [`ServerEvent`]s.
//!
//! There is no reconnection: when the socket closes or errors, the event
//! channel closes and the session relay tears down the telephony leg.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};

use super::config::RealtimeConfig;
use super::messages::{ClientEvent, ConversationItem, ServerEvent};
use super::{RealtimeError, RealtimeResult};

/// Channel capacity for WebSocket message plumbing.
const WS_CHANNEL_CAPACITY: usize = 256;

/// Command handle for one AI backend connection.
///
/// Cheap to clone; all senders feed the same socket task. Sending after the
/// connection has closed yields [`RealtimeError::NotConnected`].
#[derive(Clone)]
pub struct RealtimeHandle {
    tx: mpsc::Sender<ClientEvent>,
}

impl RealtimeHandle {
    /// Create a handle plus the receiving end of its command channel.
    pub(crate) fn channel(capacity: usize) -> (Self, mpsc::Receiver<ClientEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Send a raw client event.
    pub async fn send(&self, event: ClientEvent) -> RealtimeResult<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| RealtimeError::NotConnected)
    }

    /// Forward one telephony audio frame, payload unmodified.
    pub async fn append_audio(&self, payload: String) -> RealtimeResult<()> {
        self.send(ClientEvent::InputAudioBufferAppend { audio: payload })
            .await
    }

    /// Truncate an interrupted response item at the offset actually heard.
    pub async fn truncate_item(&self, item_id: String, audio_end_ms: u64) -> RealtimeResult<()> {
        self.send(ClientEvent::ConversationItemTruncate {
            item_id,
            content_index: 0,
            audio_end_ms,
        })
        .await
    }

    /// Answer a tool invocation and ask the backend to keep generating.
    ///
    /// The continuation is sent even when the output is an error placeholder,
    /// so a failed tool never stalls the conversation.
    pub async fn submit_tool_output(&self, call_id: String, output: String) -> RealtimeResult<()> {
        self.send(ClientEvent::ConversationItemCreate {
            item: ConversationItem::function_output(call_id, output),
        })
        .await?;
        self.send(ClientEvent::ResponseCreate).await
    }

    /// Seed a conversation item and request a response ("AI speaks first").
    pub async fn request_greeting(&self, prompt: String) -> RealtimeResult<()> {
        self.send(ClientEvent::ConversationItemCreate {
            item: ConversationItem::user_text(prompt),
        })
        .await?;
        self.send(ClientEvent::ResponseCreate).await
    }
}

/// Open the WebSocket to the Realtime API for one call.
///
/// On success the session configuration event is already queued ahead of any
/// caller audio. The returned receiver yields server events in arrival order
/// and closes when the connection ends, however that happens.
pub async fn connect(
    config: &RealtimeConfig,
) -> RealtimeResult<(RealtimeHandle, mpsc::Receiver<ServerEvent>)> {
    if config.api_key.is_empty() {
        return Err(RealtimeError::AuthenticationFailed(
            "API key is required".to_string(),
        ));
    }

    let url = config.ws_url();
    let request = http::Request::builder()
        .uri(&url)
        .header("Authorization", format!("Bearer {}", config.api_key))
        .header("OpenAI-Beta", "realtime=v1")
        .header("Sec-WebSocket-Protocol", "realtime")
        .header(
            "Sec-WebSocket-Key",
            tungstenite::handshake::client::generate_key(),
        )
        .header("Sec-WebSocket-Version", "13")
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Host", "api.openai.com")
        .body(())
        .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

    tracing::info!("Connected to OpenAI Realtime API");

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    let (handle, mut cmd_rx) = RealtimeHandle::channel(WS_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel::<ServerEvent>(WS_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                // Outgoing client events
                cmd = cmd_rx.recv() => {
                    let Some(event) = cmd else {
                        // All handles dropped - the call is over
                        let _ = ws_sink.send(Message::Close(None)).await;
                        break;
                    };
                    let json = match serde_json::to_string(&event) {
                        Ok(j) => j,
                        Err(e) => {
                            tracing::error!("Failed to serialize client event: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                        tracing::error!("Failed to send WebSocket message: {}", e);
                        break;
                    }
                }

                // Incoming server events
                msg = ws_stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ServerEvent>(&text) {
                                Ok(event) => {
                                    if event_tx.send(event).await.is_err() {
                                        // Relay went away
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Failed to parse server event: {} - {}", e, text);
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!("Realtime WebSocket closed by server");
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                tracing::error!("Failed to send pong: {}", e);
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::error!("Realtime WebSocket error: {}", e);
                            break;
                        }
                    }
                }
            }
        }
        // Dropping event_tx closes the relay's receiver, which cascades the
        // teardown to the telephony leg.
        tracing::info!("Realtime connection task ended");
    });

    // Session configuration goes out before any audio is forwarded
    handle
        .send(ClientEvent::SessionUpdate {
            session: config.session_config(),
        })
        .await?;

    Ok((handle, event_rx))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realtime::DEFAULT_REALTIME_MODEL;

    fn test_config(api_key: &str) -> RealtimeConfig {
        RealtimeConfig {
            api_key: api_key.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            voice: "alloy".to_string(),
            instructions: "Be helpful".to_string(),
            temperature: 0.8,
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn connect_requires_api_key() {
        let result = connect(&test_config("")).await;
        assert!(matches!(result, Err(RealtimeError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn handle_send_fails_after_receiver_dropped() {
        let (handle, rx) = RealtimeHandle::channel(8);
        drop(rx);
        let result = handle.append_audio("AAA".to_string()).await;
        assert!(matches!(result, Err(RealtimeError::NotConnected)));
    }

    #[tokio::test]
    async fn submit_tool_output_sends_continuation() {
        let (handle, mut rx) = RealtimeHandle::channel(8);
        handle
            .submit_tool_output("call_1".to_string(), "result".to_string())
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            ClientEvent::ConversationItemCreate { item } => {
                assert_eq!(item.item_type, "function_call_output");
                assert_eq!(item.call_id.as_deref(), Some("call_1"));
                assert_eq!(item.output.as_deref(), Some("result"));
            }
            other => panic!("expected item create, got {other:?}"),
        }
        assert!(matches!(rx.recv().await.unwrap(), ClientEvent::ResponseCreate));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn request_greeting_seeds_item_then_response() {
        let (handle, mut rx) = RealtimeHandle::channel(8);
        handle
            .request_greeting("Saluda al usuario".to_string())
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            ClientEvent::ConversationItemCreate { item } => {
                assert_eq!(item.item_type, "message");
                assert_eq!(item.role.as_deref(), Some("user"));
            }
            other => panic!("expected item create, got {other:?}"),
        }
        assert!(matches!(rx.recv().await.unwrap(), ClientEvent::ResponseCreate));
    }
}
