//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod conversation_handlers;

pub use conversation_handlers::*;
