//! In-Memory Conversation Store Implementation

use chrono::Utc;
use dashmap::DashMap;
use std::time::Duration;

use crate::application::ports::{ConversationStorePort, StoreStats};
use crate::domain::conversation::{Conversation, ConversationId, Turn};

/// 存储限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// 最多保存的会话数，超出时淘汰最久未活动的
    pub max_entries: usize,
    /// 空闲超过该时长的会话视为过期
    pub ttl: Duration,
    /// 每个会话最多保留的轮次
    pub max_turns: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl: Duration::from_secs(3600),
            max_turns: 40,
        }
    }
}

/// 内存会话存储
pub struct InMemoryConversationStore {
    conversations: DashMap<ConversationId, Conversation>,
    config: StoreConfig,
}

impl InMemoryConversationStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            conversations: DashMap::new(),
            config,
        }
    }

    fn ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.ttl)
            .unwrap_or_else(|_| chrono::Duration::days(365 * 100))
    }

    /// 超出容量时按最后活动时间淘汰，`keep` 不参与淘汰
    fn evict_over_capacity(&self, keep: &ConversationId) -> Vec<ConversationId> {
        let mut evicted = Vec::new();

        while self.conversations.len() > self.config.max_entries {
            // 先收集候选再删除，迭代期间不能持有写锁
            let oldest = self
                .conversations
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.last_activity)
                .map(|entry| entry.key().clone());

            match oldest {
                Some(id) => {
                    if self.conversations.remove(&id).is_some() {
                        tracing::debug!(conversation_id = %id, "Conversation evicted (capacity)");
                        evicted.push(id);
                    }
                }
                None => break,
            }
        }

        evicted
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl ConversationStorePort for InMemoryConversationStore {
    fn get(&self, id: &ConversationId) -> Option<Conversation> {
        let conversation = self.conversations.get(id).map(|c| c.clone())?;

        if conversation.is_expired(self.ttl(), Utc::now()) {
            let ttl = self.ttl();
            self.conversations
                .remove_if(id, |_, c| c.is_expired(ttl, Utc::now()));
            tracing::debug!(conversation_id = %id, "Conversation expired");
            return None;
        }

        Some(conversation)
    }

    fn put(&self, conversation: Conversation) -> Vec<ConversationId> {
        let id = conversation.id.clone();
        self.conversations.insert(id.clone(), conversation);
        self.evict_over_capacity(&id)
    }

    fn append_exchange(&self, id: &ConversationId, user: Turn, model: Turn) {
        let ttl = self.ttl();
        let created = {
            let mut created = false;
            let mut entry = self.conversations.entry(id.clone()).or_insert_with(|| {
                created = true;
                Conversation::new(id.clone())
            });

            // 过期但尚未被清理的会话从空历史重新开始
            if !created && entry.is_expired(ttl, Utc::now()) {
                *entry = Conversation::new(id.clone());
            }

            entry.record_exchange(user, model, self.config.max_turns);
            created
        };

        if created {
            tracing::info!(conversation_id = %id, "Conversation created");
            self.evict_over_capacity(id);
        }
    }

    fn evict(&self, id: &ConversationId) -> bool {
        let removed = self.conversations.remove(id).is_some();
        if removed {
            tracing::info!(conversation_id = %id, "Conversation removed");
        }
        removed
    }

    fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let ttl = self.ttl();

        let expired: Vec<ConversationId> = self
            .conversations
            .iter()
            .filter(|entry| entry.is_expired(ttl, now))
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .iter()
            .filter(|id| {
                self.conversations
                    .remove_if(*id, |_, c| c.is_expired(ttl, now))
                    .is_some()
            })
            .count()
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.conversations.len(),
            capacity: self.config.max_entries,
        }
    }
}
