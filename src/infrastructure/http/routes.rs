//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/audio                POST  上传一段录音（multipart），返回模型回复
//! - /api/text                 POST  发送文本，返回模型回复
//! - /api/conversation/get     POST  获取会话历史
//! - /api/conversation/close   POST  关闭会话
//! - /ws                       WS    实时语音会话

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws", get(handlers::live_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/audio", post(handlers::audio_message))
        .route("/text", post(handlers::text_message))
        .nest("/conversation", conversation_routes())
}

/// Conversation 路由
fn conversation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get", post(handlers::get_conversation))
        .route("/close", post(handlers::close_conversation))
}
