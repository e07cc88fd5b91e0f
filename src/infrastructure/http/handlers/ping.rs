//! Ping Handler

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// 当前保存的会话数
    pub conversations: usize,
    /// 会话存储容量
    pub capacity: usize,
}

/// Ping endpoint - 健康检查，附带会话存储占用
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    let stats = state.store.stats();
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        conversations: stats.entries,
        capacity: stats.capacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::application::ConversationStorePort;
    use crate::domain::conversation::{ConversationId, Turn};
    use crate::infrastructure::adapters::FakeChatClient;
    use crate::infrastructure::http::{HttpServer, RelaySettings, ServerConfig};
    use crate::infrastructure::memory::{InMemoryConversationStore, StoreConfig};

    #[tokio::test]
    async fn test_ping_reports_store_usage() {
        let store = Arc::new(InMemoryConversationStore::new(StoreConfig {
            max_entries: 10,
            ..Default::default()
        }));
        store.append_exchange(
            &ConversationId::generate(),
            Turn::user_text("hi"),
            Turn::model_text("hello"),
        );
        let state = AppState::new(
            store,
            Arc::new(FakeChatClient::with_defaults()),
            RelaySettings::default(),
        );
        let app = HttpServer::new(ServerConfig::default(), state).build_router();

        let response = app
            .oneshot(Request::get("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["conversations"], 1);
        assert_eq!(body["capacity"], 10);
    }
}
