//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod chat_model;
mod conversation_store;

pub use chat_model::{ChatError, ChatModelPort, ChatReply, ChatRequest, ReplyModality};
pub use conversation_store::{ConversationStorePort, StoreStats};
