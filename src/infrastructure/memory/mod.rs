//! Memory Layer - In-Memory State Management
//!
//! 实现 ConversationStore，管理会话历史的内存状态

mod conversation_store;

pub use conversation_store::{InMemoryConversationStore, StoreConfig};
