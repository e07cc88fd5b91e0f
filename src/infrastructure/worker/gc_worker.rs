//! Conversation GC Worker - Background Expired Conversation Sweeper

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::ports::ConversationStorePort;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct GcWorkerConfig {
    /// 清理间隔
    pub interval: Duration,
}

impl Default for GcWorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// 会话清理 Worker
///
/// 定期移除空闲超过 ttl 的会话
pub struct ConversationGcWorker {
    config: GcWorkerConfig,
    store: Arc<dyn ConversationStorePort>,
    shutdown: CancellationToken,
}

impl ConversationGcWorker {
    pub fn new(
        config: GcWorkerConfig,
        store: Arc<dyn ConversationStorePort>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            store,
            shutdown,
        }
    }

    /// 执行一次清理
    pub fn sweep(&self) -> usize {
        let removed = self.store.evict_expired();
        if removed > 0 {
            let stats = self.store.stats();
            tracing::info!(
                removed = removed,
                remaining = stats.entries,
                capacity = stats.capacity,
                "Expired conversations removed"
            );
        }
        removed
    }

    /// 启动 Worker，直到 shutdown 被取消
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "ConversationGcWorker started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        // 第一次 tick 立即返回
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }

        tracing::info!("ConversationGcWorker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{Conversation, ConversationId};
    use crate::infrastructure::memory::{InMemoryConversationStore, StoreConfig};

    fn stale_store() -> Arc<InMemoryConversationStore> {
        let store = Arc::new(InMemoryConversationStore::new(StoreConfig {
            ttl: Duration::from_secs(60),
            ..Default::default()
        }));
        let mut stale = Conversation::new(ConversationId::parse("stale").unwrap());
        stale.last_activity = chrono::Utc::now() - chrono::Duration::seconds(120);
        store.put(stale);
        store.put(Conversation::new(ConversationId::parse("fresh").unwrap()));
        store
    }

    #[test]
    fn test_sweep_removes_expired() {
        let store = stale_store();
        let worker = ConversationGcWorker::new(
            GcWorkerConfig::default(),
            store.clone(),
            CancellationToken::new(),
        );

        assert_eq!(worker.sweep(), 1);
        assert_eq!(worker.sweep(), 0);
        assert_eq!(store.stats().entries, 1);
    }

    #[tokio::test]
    async fn test_run_sweeps_until_cancelled() {
        let store = stale_store();
        let shutdown = CancellationToken::new();
        let worker = ConversationGcWorker::new(
            GcWorkerConfig {
                interval: Duration::from_millis(20),
            },
            store.clone(),
            shutdown.clone(),
        );

        let handle = tokio::spawn(worker.run());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.stats().entries, 1);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
