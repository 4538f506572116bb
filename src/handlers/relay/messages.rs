//! Telephony media-stream wire format.
//!
//! The provider (Twilio media streams) sends JSON frames over the call's
//! WebSocket, keyed by an `event` discriminant:
//!
//! - `connected` - handshake notice, no payload we use
//! - `start` - stream began; carries the `streamSid` that addresses all
//!   outbound frames for this call
//! - `media` - base64 µ-law audio with a millisecond timestamp
//! - `mark` - a previously sent playback checkpoint finished playing
//! - `stop` and anything else - logged, otherwise ignored
//!
//! Outbound frames are `media` (audio to the caller), `mark` (playback
//! checkpoint), and `clear` (drop queued unplayed audio on barge-in).

use serde::{Deserialize, Deserializer, Serialize};

/// Inbound control/audio frame from the telephony provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum CallFrame {
    /// Initial handshake notice
    Connected,

    /// Stream started
    Start {
        /// Start payload
        start: StartPayload,
    },

    /// Inbound caller audio
    Media {
        /// Media payload
        media: MediaPayload,
    },

    /// Playback checkpoint acknowledgement
    Mark {
        /// Mark payload
        mark: MarkPayload,
    },

    /// Stream stopped
    Stop,

    /// Any other discriminant, ignored
    #[serde(other)]
    Other,
}

/// Payload of a `start` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct StartPayload {
    /// Stream identifier, unique per call
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
    /// Call identifier
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
}

/// Payload of a `media` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPayload {
    /// Base64 µ-law audio, passed through opaquely
    pub payload: String,
    /// Milliseconds since stream start; the provider sends this as a string
    #[serde(default, deserialize_with = "timestamp_ms")]
    pub timestamp: u64,
}

/// Payload of a `mark` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkPayload {
    /// Checkpoint token being acknowledged
    pub name: String,
}

/// Accept the timestamp as either a JSON number or the provider's string form.
fn timestamp_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
    }
}

/// Outbound frame to the telephony provider.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum CallMessage {
    /// Audio chunk for the caller
    Media {
        /// Stream to address
        #[serde(rename = "streamSid")]
        stream_sid: String,
        /// Media payload
        media: MediaOut,
    },

    /// Playback checkpoint
    Mark {
        /// Stream to address
        #[serde(rename = "streamSid")]
        stream_sid: String,
        /// Mark payload
        mark: MarkOut,
    },

    /// Discard queued unplayed audio
    Clear {
        /// Stream to address
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

/// Outbound media payload.
#[derive(Debug, Clone, Serialize)]
pub struct MediaOut {
    /// Base64 audio, passed through from the backend unmodified
    pub payload: String,
}

/// Outbound mark payload.
#[derive(Debug, Clone, Serialize)]
pub struct MarkOut {
    /// Checkpoint token
    pub name: String,
}

impl CallMessage {
    pub fn media(stream_sid: impl Into<String>, payload: impl Into<String>) -> Self {
        CallMessage::Media {
            stream_sid: stream_sid.into(),
            media: MediaOut {
                payload: payload.into(),
            },
        }
    }

    pub fn mark(stream_sid: impl Into<String>, name: impl Into<String>) -> Self {
        CallMessage::Mark {
            stream_sid: stream_sid.into(),
            mark: MarkOut { name: name.into() },
        }
    }

    pub fn clear(stream_sid: impl Into<String>) -> Self {
        CallMessage::Clear {
            stream_sid: stream_sid.into(),
        }
    }
}

/// Routing envelope for the call-leg sender task.
#[derive(Debug)]
pub enum CallMessageRoute {
    /// Serialize and send a frame
    Outgoing(CallMessage),
    /// Close the WebSocket
    Close,
}

// =============================================================================
// Tests
// =============================================================================
