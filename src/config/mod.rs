//! Configuration module for the Voicebridge server
//!
//! Configuration is environment-driven: values come from process environment
//! variables, with `.env` files loaded by the binary before this module runs.
//! Everything is read once at startup into an immutable [`ServerConfig`] that
//! is passed explicitly into each session relay - never held as ambient state.

use std::env;

use thiserror::Error;
use zeroize::Zeroize;

use crate::core::realtime::{DEFAULT_REALTIME_MODEL, RealtimeConfig};
use crate::core::tools::{ORDER_LOOKUP_TOOL, order_lookup_tool};

/// Default listening port
const DEFAULT_PORT: u16 = 5050;

/// Default voice for assistant audio output
const DEFAULT_VOICE: &str = "alloy";

/// Default sampling temperature for response generation
const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Default system instructions for the assistant
const DEFAULT_INSTRUCTIONS: &str = "Eres un asistente de voz amable y servicial. \
     Responde de manera breve, clara y natural, como en una conversación telefónica.";

/// Backend event types logged at info level when no allowlist is configured
const DEFAULT_LOG_EVENT_TYPES: &[&str] = &[
    "error",
    "session.created",
    "response.done",
    "input_audio_buffer.speech_started",
    "input_audio_buffer.speech_stopped",
    "rate_limits.updated",
];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Server configuration
///
/// Contains everything needed to run the Voicebridge server:
/// - Listening address
/// - OpenAI Realtime credentials and session settings (voice, instructions,
///   temperature, model)
/// - Domain lookup service base URL for tool invocations
/// - Relay behavior flags (`greet_first`, `enabled_tools`, `log_event_types`)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    /// OpenAI API key for the Realtime API (required)
    pub openai_api_key: String,
    /// Realtime model identifier
    pub model: String,
    /// Voice for assistant audio output
    pub voice: String,
    /// System instructions sent in the session configuration
    pub instructions: String,
    /// Sampling temperature for response generation
    pub temperature: f32,

    /// Base URL of the domain lookup service; when absent, tooling is disabled
    pub lookup_service_url: Option<String>,

    /// When set, the assistant greets the caller before any caller audio
    pub greet_first: bool,
    /// Tool names declared to the backend and recognized by the relay
    pub enabled_tools: Vec<String>,
    /// Backend event types logged at info level per call
    pub log_event_types: Vec<String>,
}

/// Zeroize the API key when the configuration is dropped so the credential
/// does not linger in memory.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        self.openai_api_key.zeroize();
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; its absence is a fatal startup error.
    /// `LOOKUP_SERVICE_URL` is optional - when unset, no tools are declared
    /// to the backend and tool calls are ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                message: e.to_string(),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let temperature = match env::var("TEMPERATURE") {
            Ok(raw) => {
                let value = raw.parse::<f32>().map_err(|e| ConfigError::Invalid {
                    var: "TEMPERATURE",
                    message: e.to_string(),
                })?;
                // The Realtime API rejects values outside this range
                if !(0.6..=1.2).contains(&value) {
                    return Err(ConfigError::Invalid {
                        var: "TEMPERATURE",
                        message: format!("{value} is outside the accepted range 0.6..=1.2"),
                    });
                }
                value
            }
            Err(_) => DEFAULT_TEMPERATURE,
        };

        let lookup_service_url = env::var("LOOKUP_SERVICE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let enabled_tools = match env::var("ENABLED_TOOLS") {
            Ok(raw) => parse_list(&raw),
            // The lookup tool is on by default whenever its service is configured
            Err(_) if lookup_service_url.is_some() => vec![ORDER_LOOKUP_TOOL.to_string()],
            Err(_) => Vec::new(),
        };

        let log_event_types = match env::var("LOG_EVENT_TYPES") {
            Ok(raw) => parse_list(&raw),
            Err(_) => DEFAULT_LOG_EVENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        Ok(Self {
            host,
            port,
            openai_api_key,
            model: env::var("OPENAI_REALTIME_MODEL")
                .unwrap_or_else(|_| DEFAULT_REALTIME_MODEL.to_string()),
            voice: env::var("VOICE").unwrap_or_else(|_| DEFAULT_VOICE.to_string()),
            instructions: env::var("SYSTEM_INSTRUCTIONS")
                .unwrap_or_else(|_| DEFAULT_INSTRUCTIONS.to_string()),
            temperature,
            lookup_service_url,
            greet_first: env::var("GREET_FIRST")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            enabled_tools,
            log_event_types,
        })
    }

    /// The listening address in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the AI backend connection configuration for one call.
    ///
    /// Tools are only declared when the lookup service is reachable and the
    /// tool is enabled; the backend then never asks for anything we cannot
    /// answer.
    pub fn realtime_config(&self) -> RealtimeConfig {
        let tools = if self.lookup_service_url.is_some()
            && self.enabled_tools.iter().any(|t| t == ORDER_LOOKUP_TOOL)
        {
            vec![order_lookup_tool()]
        } else {
            Vec::new()
        };

        RealtimeConfig {
            api_key: self.openai_api_key.clone(),
            model: self.model.clone(),
            voice: self.voice.clone(),
            instructions: self.instructions.clone(),
            temperature: self.temperature,
            tools,
        }
    }
}

/// Parse a comma-separated list, trimming whitespace and dropping empties.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Parse a boolean environment value ("1", "true", "yes" are truthy).
fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
