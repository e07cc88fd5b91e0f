//! Live Context - WebSocket 实时协议

mod messages;

pub use messages::{
    ClientMessage, ConnectedPayload, ErrorPayload, LiveInlineData, LivePart, LivePayload,
    ModelTurn, ServerContent, ServerMessage,
};
