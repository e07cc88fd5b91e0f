//! Conversation Queries

/// 获取会话历史查询
#[derive(Debug, Clone)]
pub struct GetConversation {
    pub conversation_id: String,
}
