//! Chat Model Port - 托管生成式模型抽象
//!
//! 定义对话模型的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::conversation::{Part, Turn};

/// 模型调用错误
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: HTTP {status}: {message}")]
    ServiceError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Prompt blocked: {0}")]
    Blocked(String),

    #[error("Model returned an empty reply")]
    EmptyReply,
}

/// 回复形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyModality {
    /// 文本回复，由客户端语音合成
    #[default]
    Text,
    /// 原生音频回复（base64 PCM）
    Audio,
}

impl ReplyModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyModality::Text => "text",
            ReplyModality::Audio => "audio",
        }
    }
}

/// 模型请求：完整的轮次序列（前置提示词 + 历史 + 新的用户轮次）
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub contents: Vec<Turn>,
    pub modality: ReplyModality,
}

/// 模型回复
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub parts: Vec<Part>,
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
        }
    }

    /// 拼接所有文本片段，去掉首尾空白
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// 音频内容
    ///
    /// 按第一个音频片段的 MIME 类型，把同类型的 PCM 片段按顺序拼接；
    /// 无法解码的片段记录日志后跳过
    pub fn audio(&self) -> Option<(String, String)> {
        let mut blobs = self.parts.iter().filter_map(|part| match part {
            Part::InlineData { mime_type, data } => Some((mime_type.as_str(), data.as_str())),
            Part::Text(_) => None,
        });
        let (mime_type, first) = blobs.next()?;
        let rest: Vec<&str> = blobs
            .filter(|(mime, _)| *mime == mime_type)
            .map(|(_, data)| data)
            .collect();

        if rest.is_empty() {
            return Some((mime_type.to_string(), first.to_string()));
        }

        let engine = base64::engine::general_purpose::STANDARD;
        let mut pcm = Vec::new();
        for data in std::iter::once(first).chain(rest) {
            match engine.decode(data) {
                Ok(bytes) => pcm.extend_from_slice(&bytes),
                Err(e) => tracing::warn!(error = %e, "Skipping undecodable audio part"),
            }
        }

        Some((mime_type.to_string(), engine.encode(pcm)))
    }
}

/// Chat Model Port
///
/// 外部生成式模型服务的抽象接口
#[async_trait]
pub trait ChatModelPort: Send + Sync {
    /// 一次生成调用
    async fn generate(&self, request: ChatRequest) -> Result<ChatReply, ChatError>;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_accessors() {
        let reply = ChatReply {
            parts: vec![
                Part::text(" The RV400 "),
                Part::inline_data("audio/pcm;rate=24000", "AAAA"),
                Part::text("goes 150 km. "),
            ],
        };
        assert_eq!(reply.joined_text(), "The RV400 goes 150 km.");
        assert_eq!(
            reply.audio(),
            Some(("audio/pcm;rate=24000".to_string(), "AAAA".to_string()))
        );
        assert_eq!(ChatReply::text("hi").audio(), None);
    }

    #[test]
    fn test_split_audio_parts_are_joined() {
        let engine = base64::engine::general_purpose::STANDARD;
        let reply = ChatReply {
            parts: vec![
                Part::inline_data("audio/pcm;rate=24000", engine.encode([1u8, 2, 3, 4])),
                Part::text("transcript"),
                Part::inline_data("audio/wav", engine.encode([9u8, 9])),
                Part::inline_data("audio/pcm;rate=24000", engine.encode([5u8, 6])),
            ],
        };

        let (mime_type, data) = reply.audio().unwrap();
        assert_eq!(mime_type, "audio/pcm;rate=24000");
        assert_eq!(engine.decode(data).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }
}
