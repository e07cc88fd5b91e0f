//! Chat Commands - 发送消息命令

use base64::Engine;

use crate::application::error::ApplicationError;
use crate::application::ports::ReplyModality;
use crate::domain::conversation::{ConversationId, Turn};

/// 默认的上传音频类型（MediaRecorder 产物）
pub const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// 用户输入
#[derive(Debug, Clone)]
pub enum UserInput {
    Text(String),
    Audio { mime_type: String, data: Vec<u8> },
}

impl UserInput {
    /// 转成用户轮次；空输入视为缺少输入
    pub fn into_turn(self) -> Result<Turn, ApplicationError> {
        match self {
            UserInput::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(ApplicationError::validation("No text provided"));
                }
                Ok(Turn::user_text(text))
            }
            UserInput::Audio { mime_type, data } => {
                if data.is_empty() {
                    return Err(ApplicationError::validation("No audio file provided"));
                }
                let mime_type = if mime_type.trim().is_empty() {
                    DEFAULT_AUDIO_MIME.to_string()
                } else {
                    mime_type
                };
                let encoded = base64::engine::general_purpose::STANDARD.encode(&data);
                Ok(Turn::user_audio(mime_type, encoded))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UserInput::Text(_) => "text",
            UserInput::Audio { .. } => "audio",
        }
    }
}

/// 发送消息命令 - 解析或创建会话，调用一次模型并更新历史
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    /// 客户端传回的会话 ID，为空则新建
    pub conversation_id: Option<String>,
    pub input: UserInput,
    pub modality: ReplyModality,
}

/// 模型回复
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text {
        text: String,
        language: &'static str,
    },
    Audio {
        mime_type: String,
        /// base64 PCM
        data: String,
        /// 模型同时返回的文本（如果有）
        transcript: Option<String>,
    },
}

/// 发送消息响应
#[derive(Debug, Clone)]
pub struct SendMessageResponse {
    pub conversation_id: ConversationId,
    pub reply: Reply,
    /// 模型调用耗时（毫秒）
    pub response_time_ms: u64,
}
