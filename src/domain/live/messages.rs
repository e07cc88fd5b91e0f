//! Live WebSocket 消息
//!
//! 客户端 -> 服务端: `{"type": "audio_chunk" | "text" | "interrupt" | "commit", ...}`
//! 服务端 -> 客户端: `{"type": "connected" | "live_message" | "error", "payload": {...}}`
//!
//! `live_message.payload` 沿用 Live API 的形状：
//! `serverContent.model_turn.parts[].inline_data.{mime_type,data}`

use serde::{Deserialize, Serialize};

use crate::domain::conversation::Part;

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// base64 PCM16 @16 kHz
    AudioChunk { data: String },
    Text { text: String },
    /// 打断：清空缓存音频并取消进行中的生成
    Interrupt,
    /// 立即结束当前这句话
    Commit,
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected { payload: ConnectedPayload },
    LiveMessage { payload: LivePayload },
    Error { payload: ErrorPayload },
}

impl ServerMessage {
    pub fn connected(conversation_id: impl Into<String>) -> Self {
        ServerMessage::Connected {
            payload: ConnectedPayload {
                conversation_id: conversation_id.into(),
            },
        }
    }

    /// 模型回复（一整轮，turn_complete = true）
    pub fn model_turn(parts: Vec<LivePart>) -> Self {
        ServerMessage::LiveMessage {
            payload: LivePayload {
                server_content: ServerContent {
                    model_turn: Some(ModelTurn { parts }),
                    turn_complete: true,
                    interrupted: false,
                },
            },
        }
    }

    /// 打断确认
    pub fn interrupted() -> Self {
        ServerMessage::LiveMessage {
            payload: LivePayload {
                server_content: ServerContent {
                    model_turn: None,
                    turn_complete: false,
                    interrupted: true,
                },
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            payload: ErrorPayload {
                message: message.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub conversation_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePayload {
    #[serde(rename = "serverContent")]
    pub server_content: ServerContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_turn: Option<ModelTurn>,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default)]
    pub interrupted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTurn {
    pub parts: Vec<LivePart>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LivePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<LiveInlineData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveInlineData {
    pub mime_type: String,
    pub data: String,
}

impl From<&Part> for LivePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => LivePart {
                text: Some(text.clone()),
                inline_data: None,
            },
            Part::InlineData { mime_type, data } => LivePart {
                text: None,
                inline_data: Some(LiveInlineData {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}
