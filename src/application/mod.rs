//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（ChatModel、ConversationStore）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - live: WebSocket 实时会话
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod live;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Chat commands
    Reply,
    SendMessageCommand,
    SendMessageResponse,
    UserInput,
    DEFAULT_AUDIO_MIME,
    // Conversation commands
    CloseConversationCommand,
    CloseConversationResponse,
    // Handlers
    handlers::{CloseConversationHandler, SendMessageHandler},
};

pub use error::ApplicationError;

pub use live::{LiveSession, LiveSessionConfig};

pub use ports::{
    // Chat model
    ChatError,
    ChatModelPort,
    ChatReply,
    ChatRequest,
    ReplyModality,
    // Conversation store
    ConversationStorePort,
    StoreStats,
};

pub use queries::{
    // Conversation queries
    GetConversation,
    // Handlers
    handlers::{ConversationResponse, GetConversationHandler, PartView, TurnView},
};
