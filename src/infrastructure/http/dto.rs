//! Data Transfer Objects
//!
//! 请求/响应字段使用 camelCase，与浏览器前端保持一致

use serde::{Deserialize, Serialize};

use crate::application::{
    CloseConversationResponse, ConversationResponse, PartView, Reply, SendMessageResponse,
    TurnView,
};
use crate::domain::conversation::Role;

// ============================================================================
// Chat DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// 文本或音频回复
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChatReplyDto {
    Text(TextReplyDto),
    Audio(AudioReplyDto),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextReplyDto {
    pub conversation_id: String,
    pub text: String,
    pub language: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioReplyDto {
    pub conversation_id: String,
    /// base64 PCM
    pub audio: String,
    pub mime_type: String,
    /// 模型调用耗时（毫秒）
    pub response_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<SendMessageResponse> for ChatReplyDto {
    fn from(response: SendMessageResponse) -> Self {
        let conversation_id = response.conversation_id.to_string();
        match response.reply {
            Reply::Text { text, language } => ChatReplyDto::Text(TextReplyDto {
                conversation_id,
                text,
                language,
            }),
            Reply::Audio {
                mime_type,
                data,
                transcript,
            } => ChatReplyDto::Audio(AudioReplyDto {
                conversation_id,
                audio: data,
                mime_type,
                response_time: response.response_time_ms,
                text: transcript,
            }),
        }
    }
}

// ============================================================================
// Conversation DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationIdRequest {
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub conversation_id: String,
    pub turns: Vec<TurnDto>,
    pub created_at: String,
    pub last_activity: String,
}

#[derive(Debug, Serialize)]
pub struct TurnDto {
    pub role: Role,
    pub parts: Vec<PartDto>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PartDto {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataDto,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineDataDto {
    pub mime_type: String,
    pub size: usize,
}

impl From<PartView> for PartDto {
    fn from(part: PartView) -> Self {
        match part {
            PartView::Text(text) => PartDto::Text { text },
            PartView::InlineData { mime_type, size } => PartDto::InlineData {
                inline_data: InlineDataDto { mime_type, size },
            },
        }
    }
}

impl From<TurnView> for TurnDto {
    fn from(turn: TurnView) -> Self {
        Self {
            role: turn.role,
            parts: turn.parts.into_iter().map(PartDto::from).collect(),
        }
    }
}

impl From<ConversationResponse> for ConversationDto {
    fn from(response: ConversationResponse) -> Self {
        Self {
            conversation_id: response.conversation_id,
            turns: response.turns.into_iter().map(TurnDto::from).collect(),
            created_at: response.created_at,
            last_activity: response.last_activity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseConversationDto {
    pub conversation_id: String,
    pub closed: bool,
}

impl From<CloseConversationResponse> for CloseConversationDto {
    fn from(response: CloseConversationResponse) -> Self {
        Self {
            conversation_id: response.conversation_id,
            closed: response.closed,
        }
    }
}
