//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod chat_command_handlers;
mod conversation_handlers;

pub use chat_command_handlers::*;
pub use conversation_handlers::*;
