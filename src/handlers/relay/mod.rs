//! Media-stream relay: the telephony-leg WebSocket and its session loop.

mod handler;
pub mod messages;

pub use handler::media_stream_handler;
pub use messages::{CallFrame, CallMessage, CallMessageRoute};
