//! Conversation Context - 会话限界上下文
//!
//! 职责:
//! - 会话标识
//! - 轮次（user/model）与消息片段
//! - 历史长度限制与过期判断

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::Conversation;
pub use errors::ConversationError;
pub use value_objects::{ConversationId, Part, Role, Turn, MAX_CONVERSATION_ID_LEN};
