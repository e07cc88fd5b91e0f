//! Conversation Context - Aggregate Root

use chrono::{DateTime, Duration, Utc};

use super::{ConversationId, Turn};

/// 会话聚合根
///
/// 历史只保存真实的 user/model 轮次，系统提示词在每次请求时另行前置
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: ConversationId,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: ConversationId) -> Self {
        let now = Utc::now();
        Self {
            id,
            turns: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// 追加一次问答，超过 `max_turns` 时从最早的一对开始丢弃
    pub fn record_exchange(&mut self, user: Turn, model: Turn, max_turns: usize) {
        self.turns.push(user);
        self.turns.push(model);

        // 保持偶数，避免裁掉半对后历史以 model 开头
        let limit = max_turns.max(2) & !1;
        if self.turns.len() > limit {
            let excess = self.turns.len() - limit;
            self.turns.drain(..excess);
        }

        self.touch();
    }

    /// 更新最后活动时间
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// 空闲时间是否超过 ttl
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_activity > ttl
    }

    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Role;

    #[test]
    fn test_record_exchange_appends_in_order() {
        let mut conversation = Conversation::new(ConversationId::generate());
        conversation.record_exchange(Turn::user_text("hi"), Turn::model_text("hello"), 10);

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turns[0].role, Role::User);
        assert_eq!(conversation.turns[1].text(), "hello");
    }

    #[test]
    fn test_history_is_capped_by_pairs() {
        let mut conversation = Conversation::new(ConversationId::generate());
        for i in 0..5 {
            conversation.record_exchange(
                Turn::user_text(format!("q{}", i)),
                Turn::model_text(format!("a{}", i)),
                5,
            );
        }

        // 5 被向下取偶为 4
        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.turns[0].role, Role::User);
        assert_eq!(conversation.turns[0].text(), "q3");
        assert_eq!(conversation.turns[3].text(), "a4");
    }

    #[test]
    fn test_expiry() {
        let mut conversation = Conversation::new(ConversationId::generate());
        let now = Utc::now();
        conversation.last_activity = now - Duration::seconds(120);

        assert!(conversation.is_expired(Duration::seconds(60), now));
        assert!(!conversation.is_expired(Duration::seconds(300), now));
    }
}
