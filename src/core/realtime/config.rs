//! Connection configuration for the OpenAI Realtime API.

use super::messages::{SessionConfig, ToolDef, TurnDetection};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default Realtime model.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview";

/// Narrowband telephony codec used on both legs of the bridge.
///
/// Twilio media streams carry base64 G.711 µ-law at 8kHz; the backend is
/// configured with the same format so audio payloads pass through opaquely
/// in both directions with no transcoding.
pub const TELEPHONY_AUDIO_FORMAT: &str = "g711_ulaw";

/// Configuration for one AI backend connection.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// OpenAI API key (bearer credential)
    pub api_key: String,
    /// Realtime model identifier
    pub model: String,
    /// Voice for audio output
    pub voice: String,
    /// System instructions for the assistant
    pub instructions: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Tool declarations advertised to the backend
    pub tools: Vec<ToolDef>,
}

impl RealtimeConfig {
    /// Build the WebSocket URL with the model parameter.
    pub fn ws_url(&self) -> String {
        format!("{}?model={}", OPENAI_REALTIME_URL, self.model)
    }

    /// Build the initial session configuration event payload.
    ///
    /// Sent exactly once, immediately after the handshake and before any
    /// audio is forwarded.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            modalities: Some(vec!["text".to_string(), "audio".to_string()]),
            instructions: Some(self.instructions.clone()),
            voice: Some(self.voice.clone()),
            input_audio_format: Some(TELEPHONY_AUDIO_FORMAT.to_string()),
            output_audio_format: Some(TELEPHONY_AUDIO_FORMAT.to_string()),
            turn_detection: Some(TurnDetection::ServerVad {
                threshold: None,
                prefix_padding_ms: None,
                silence_duration_ms: None,
            }),
            tools: if self.tools.is_empty() {
                None
            } else {
                Some(self.tools.clone())
            },
            tool_choice: if self.tools.is_empty() {
                None
            } else {
                Some("auto".to_string())
            },
            temperature: Some(self.temperature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RealtimeConfig {
        RealtimeConfig {
            api_key: "sk-test".to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            voice: "alloy".to_string(),
            instructions: "Be helpful".to_string(),
            temperature: 0.8,
            tools: Vec::new(),
        }
    }

    #[test]
    fn ws_url_carries_model() {
        let config = test_config();
        let url = config.ws_url();
        assert!(url.starts_with("wss://api.openai.com"));
        assert!(url.contains("gpt-4o-realtime-preview"));
    }

    #[test]
    fn session_config_matches_telephony_codec() {
        let session = test_config().session_config();
        assert_eq!(session.input_audio_format.as_deref(), Some("g711_ulaw"));
        assert_eq!(session.output_audio_format.as_deref(), Some("g711_ulaw"));
        assert_eq!(
            session.modalities,
            Some(vec!["text".to_string(), "audio".to_string()])
        );
        // No tools declared, so no tool choice either
        assert!(session.tools.is_none());
        assert!(session.tool_choice.is_none());
    }

    #[test]
    fn tool_choice_auto_when_tools_declared() {
        let mut config = test_config();
        config.tools = vec![crate::core::tools::order_lookup_tool()];
        let session = config.session_config();
        assert_eq!(session.tools.as_ref().map(|t| t.len()), Some(1));
        assert_eq!(session.tool_choice.as_deref(), Some("auto"));
    }
}
