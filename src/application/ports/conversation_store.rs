//! Conversation Store Port - 会话历史存储
//!
//! 定义会话存储的抽象接口，具体实现在 infrastructure/memory 层

use crate::domain::conversation::{Conversation, ConversationId, Turn};

/// 存储统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub entries: usize,
    pub capacity: usize,
}

/// Conversation Store Port
///
/// 有容量上限与过期时间的会话存储，所有状态存储在内存中
pub trait ConversationStorePort: Send + Sync {
    /// 获取会话快照；已过期的会话视为不存在并被移除
    fn get(&self, id: &ConversationId) -> Option<Conversation>;

    /// 写入（插入或覆盖）会话，返回因容量淘汰的会话 ID
    fn put(&self, conversation: Conversation) -> Vec<ConversationId>;

    /// 原子地追加一次问答；会话不存在则新建
    fn append_exchange(&self, id: &ConversationId, user: Turn, model: Turn);

    /// 移除会话，返回是否存在
    fn evict(&self, id: &ConversationId) -> bool;

    /// 移除所有过期会话，返回移除数量
    fn evict_expired(&self) -> usize;

    /// 当前统计
    fn stats(&self) -> StoreStats;
}
