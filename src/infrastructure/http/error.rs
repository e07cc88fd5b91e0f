//! HTTP Error Handling
//!
//! 错误响应统一为 `{"error": "..."}`，状态码使用真实的 HTTP 状态

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// `public` 返回给客户端，`detail` 只写日志
    Internal {
        public: &'static str,
        detail: String,
    },
}

impl ApiError {
    /// 应用层错误 -> API 错误；上游/内部错误对外只给出 `public`
    pub fn from_application(e: ApplicationError, public: &'static str) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::ExternalServiceError(_) | ApplicationError::InternalError(_) => {
                ApiError::Internal {
                    public,
                    detail: e.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, response) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, ErrorResponse::new(msg))
            }
            ApiError::NotFound(msg) => {
                tracing::warn!(error = %msg, "Resource not found");
                (StatusCode::NOT_FOUND, ErrorResponse::new(msg))
            }
            ApiError::Internal { public, detail } => {
                tracing::error!(error = %detail, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(public))
            }
        };

        (status, Json(response)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        ApiError::from_application(e, "Internal server error")
    }
}
