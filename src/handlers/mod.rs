//! HTTP and WebSocket request handlers.

pub mod intake;
pub mod relay;

pub use intake::{health_check, incoming_call};
pub use relay::media_stream_handler;
