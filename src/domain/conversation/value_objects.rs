//! Conversation Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ConversationError;

/// 客户端传入 ID 的最大长度
pub const MAX_CONVERSATION_ID_LEN: usize = 128;

/// 会话唯一标识（不透明随机 token）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    /// 生成新的随机 ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// 解析客户端传入的 ID
    pub fn parse(raw: impl Into<String>) -> Result<Self, ConversationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConversationError::InvalidId("empty".to_string()));
        }
        if trimmed.len() > MAX_CONVERSATION_ID_LEN {
            return Err(ConversationError::InvalidId(format!(
                "longer than {} characters",
                MAX_CONVERSATION_ID_LEN
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConversationError::InvalidId(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 有 ID 则解析，没有则生成
    pub fn parse_or_generate(raw: Option<&str>) -> Result<Self, ConversationError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => Self::parse(id),
            None => Ok(Self::generate()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 轮次角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// 消息片段：文本或 inline audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    InlineData {
        mime_type: String,
        /// base64 编码
        data: String,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::InlineData { .. } => None,
        }
    }
}

/// 对话中的一轮
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    pub fn user_audio(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::inline_data(mime_type, data)])
    }

    /// 拼接所有文本片段
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_valid() {
        let a = ConversationId::generate();
        let b = ConversationId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(ConversationId::parse(a.as_str()).is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_ids() {
        assert!(ConversationId::parse("").is_err());
        assert!(ConversationId::parse("has space").is_err());
        assert!(ConversationId::parse("../etc").is_err());
        assert!(ConversationId::parse("x".repeat(129)).is_err());
        assert!(ConversationId::parse("k3j2h1_abc-9").is_ok());
    }

    #[test]
    fn test_parse_or_generate() {
        let parsed = ConversationId::parse_or_generate(Some(" abc123 ")).unwrap();
        assert_eq!(parsed.as_str(), "abc123");

        let generated = ConversationId::parse_or_generate(Some("  ")).unwrap();
        assert_eq!(generated.as_str().len(), 32);
        assert!(ConversationId::parse_or_generate(None).is_ok());
    }

    #[test]
    fn test_turn_text_skips_audio_parts() {
        let turn = Turn::new(
            Role::Model,
            vec![
                Part::text("Hello "),
                Part::inline_data("audio/wav", "AAAA"),
                Part::text("RV400"),
            ],
        );
        assert_eq!(turn.text(), "Hello RV400");
    }
}
