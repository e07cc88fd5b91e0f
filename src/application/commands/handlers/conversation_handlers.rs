//! Conversation Command Handlers

use std::sync::Arc;

use crate::application::commands::conversation_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::ConversationStorePort;
use crate::domain::conversation::ConversationId;

/// CloseConversation Handler - 显式结束会话并释放历史
pub struct CloseConversationHandler {
    store: Arc<dyn ConversationStorePort>,
}

impl CloseConversationHandler {
    pub fn new(store: Arc<dyn ConversationStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: CloseConversationCommand,
    ) -> Result<CloseConversationResponse, ApplicationError> {
        let id = ConversationId::parse(cmd.conversation_id)?;
        let closed = self.store.evict(&id);

        tracing::info!(conversation_id = %id, closed = closed, "Conversation closed");

        Ok(CloseConversationResponse {
            conversation_id: id.to_string(),
            closed,
        })
    }
}
