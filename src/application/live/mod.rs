//! Live - WebSocket 实时会话编排

mod session;

pub use session::{LiveSession, LiveSessionConfig};
