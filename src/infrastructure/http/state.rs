//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CloseConversationHandler, SendMessageHandler,
    // Query handlers
    GetConversationHandler,
    // Live
    LiveSessionConfig,
    // Ports
    ChatModelPort, ConversationStorePort, ReplyModality,
};
use crate::domain::SystemPrompt;

/// 回复相关设置
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub prompt: SystemPrompt,
    /// HTTP 接口的回复形式
    pub reply_mode: ReplyModality,
    /// WebSocket 实时会话设置
    pub live: LiveSessionConfig,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            prompt: SystemPrompt::default(),
            reply_mode: ReplyModality::Text,
            live: LiveSessionConfig::default(),
        }
    }
}

/// 应用状态
pub struct AppState {
    // ========== Settings ==========
    pub reply_mode: ReplyModality,
    pub live: LiveSessionConfig,

    // ========== Ports ==========
    /// 健康检查读取统计
    pub store: Arc<dyn ConversationStorePort>,

    // ========== Command Handlers ==========
    /// 实时会话的生成任务也持有它
    pub send_message_handler: Arc<SendMessageHandler>,
    pub close_conversation_handler: CloseConversationHandler,

    // ========== Query Handlers ==========
    pub get_conversation_handler: GetConversationHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        store: Arc<dyn ConversationStorePort>,
        chat_model: Arc<dyn ChatModelPort>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            // Settings
            reply_mode: settings.reply_mode,
            live: settings.live,

            // Command handlers
            send_message_handler: Arc::new(SendMessageHandler::new(
                store.clone(),
                chat_model,
                settings.prompt,
            )),
            close_conversation_handler: CloseConversationHandler::new(store.clone()),

            // Query handlers
            get_conversation_handler: GetConversationHandler::new(store.clone()),

            // Ports
            store,
        }
    }
}
