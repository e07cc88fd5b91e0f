//! Conversation Commands - 会话管理命令

/// 关闭（移除）会话命令
#[derive(Debug, Clone)]
pub struct CloseConversationCommand {
    pub conversation_id: String,
}

/// 关闭会话响应
#[derive(Debug, Clone)]
pub struct CloseConversationResponse {
    pub conversation_id: String,
    /// 会话原先是否存在
    pub closed: bool,
}
