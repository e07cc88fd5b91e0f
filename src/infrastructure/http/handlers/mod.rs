//! HTTP Handlers

mod chat;
mod conversation;
mod ping;
mod websocket;

pub use chat::*;
pub use conversation::*;
pub use ping::*;
pub use websocket::*;
