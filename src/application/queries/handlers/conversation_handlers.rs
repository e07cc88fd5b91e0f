//! Conversation Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::ConversationStorePort;
use crate::application::queries::GetConversation;
use crate::domain::conversation::{Conversation, ConversationId, Part, Role, Turn};

// ============================================================================
// Response DTOs
// ============================================================================

/// 片段视图：音频只给出类型与大小
#[derive(Debug, Clone, PartialEq)]
pub enum PartView {
    Text(String),
    InlineData { mime_type: String, size: usize },
}

impl From<&Part> for PartView {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => PartView::Text(text.clone()),
            Part::InlineData { mime_type, data } => PartView::InlineData {
                mime_type: mime_type.clone(),
                size: decoded_len(data),
            },
        }
    }
}

/// base64 解码后的字节数
fn decoded_len(data: &str) -> usize {
    let padding = data.bytes().rev().take_while(|b| *b == b'=').count();
    (data.len() / 4 * 3).saturating_sub(padding)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnView {
    pub role: Role,
    pub parts: Vec<PartView>,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            parts: turn.parts.iter().map(PartView::from).collect(),
        }
    }
}

/// 会话详情响应
#[derive(Debug, Clone)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub turns: Vec<TurnView>,
    pub created_at: String,
    pub last_activity: String,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            conversation_id: conversation.id.to_string(),
            turns: conversation.history().iter().map(TurnView::from).collect(),
            created_at: conversation.created_at.to_rfc3339(),
            last_activity: conversation.last_activity.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GetConversation Handler
pub struct GetConversationHandler {
    store: Arc<dyn ConversationStorePort>,
}

impl GetConversationHandler {
    pub fn new(store: Arc<dyn ConversationStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetConversation,
    ) -> Result<ConversationResponse, ApplicationError> {
        let id = ConversationId::parse(query.conversation_id)?;
        let conversation = self
            .store
            .get(&id)
            .ok_or_else(|| ApplicationError::not_found("Conversation", id.as_str()))?;

        Ok(ConversationResponse::from(conversation))
    }
}
