//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::ChatError;
use crate::domain::conversation::ConversationError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 缺少输入或输入无效
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<ChatError> for ApplicationError {
    fn from(err: ChatError) -> Self {
        Self::ExternalServiceError(err.to_string())
    }
}

impl From<ConversationError> for ApplicationError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::InvalidId(_) => Self::ValidationError(err.to_string()),
            ConversationError::NotFound(id) => Self::not_found("Conversation", id),
        }
    }
}
