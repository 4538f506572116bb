//! AI backend connection: the outbound WebSocket session to the OpenAI
//! Realtime API and its wire protocol.
//!
//! Layout follows one concern per file:
//! - [`config`] - connection configuration and the initial session payload
//! - [`messages`] - client/server event types (JSON over WebSocket)
//! - [`client`] - handshake, socket task, and the command handle

mod client;
mod config;
pub mod messages;

use thiserror::Error;

pub use client::{RealtimeHandle, connect};
pub use config::{
    DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL, RealtimeConfig, TELEPHONY_AUDIO_FORMAT,
};
pub use messages::{
    ApiError, ClientEvent, ContentPart, ConversationItem, ServerEvent, SessionConfig, ToolDef,
    TurnDetection,
};

/// Errors from the AI backend connection.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Missing or rejected credential
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// WebSocket handshake failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The connection has already closed
    #[error("not connected")]
    NotConnected,
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;
