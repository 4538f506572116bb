//! Core domain logic: AI backend protocol, per-call session state, and the
//! tool invocation client.

pub mod realtime;
pub mod session;
pub mod tools;

pub use realtime::{ClientEvent, RealtimeConfig, RealtimeError, RealtimeHandle, ServerEvent};
pub use session::CallSession;
pub use tools::{LOOKUP_FAILED_PLACEHOLDER, OrderLookupClient, ToolInvocation};
