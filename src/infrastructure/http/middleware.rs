//! HTTP Middleware
//!
//! HTTP 状态码错误日志中间件

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// HTTP 状态码错误日志中间件
///
/// 4xx 记 warn，5xx 记 error；错误原因在 ApiError::into_response() 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms = elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms = elapsed_ms,
            "HTTP client error"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;

    use crate::infrastructure::http::ApiError;

    async fn ok_handler() -> &'static str {
        "OK"
    }

    async fn bad_request_handler() -> Result<&'static str, ApiError> {
        Err(ApiError::BadRequest("No text provided".to_string()))
    }

    async fn upstream_handler() -> Result<&'static str, ApiError> {
        Err(ApiError::Internal {
            public: "Error processing text",
            detail: "HTTP 503 from model".to_string(),
        })
    }

    fn create_test_router() -> Router {
        Router::new()
            .route("/ok", get(ok_handler))
            .route("/bad", get(bad_request_handler))
            .route("/upstream", get(upstream_handler))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        create_test_router()
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_ok_response_passes_through() {
        assert_eq!(status_of("/ok").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_client_error_passes_through() {
        assert_eq!(status_of("/bad").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of("/missing").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_error_passes_through() {
        assert_eq!(status_of("/upstream").await, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
