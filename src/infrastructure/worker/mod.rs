//! Worker Layer - Background Task Processing
//!
//! 实现 ConversationGcWorker，定期清理过期会话

mod gc_worker;

pub use gc_worker::{ConversationGcWorker, GcWorkerConfig};
