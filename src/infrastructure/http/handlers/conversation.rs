//! Conversation HTTP Handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::application::{CloseConversationCommand, GetConversation};
use crate::infrastructure::http::dto::{
    CloseConversationDto, ConversationDto, ConversationIdRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 获取会话历史
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConversationIdRequest>, JsonRejection>,
) -> Result<Json<ConversationDto>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let response = state
        .get_conversation_handler
        .handle(GetConversation {
            conversation_id: req.conversation_id,
        })
        .await?;

    Ok(Json(ConversationDto::from(response)))
}

/// 关闭会话
pub async fn close_conversation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConversationIdRequest>, JsonRejection>,
) -> Result<Json<CloseConversationDto>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let response = state
        .close_conversation_handler
        .handle(CloseConversationCommand {
            conversation_id: req.conversation_id,
        })
        .await?;

    Ok(Json(CloseConversationDto::from(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::application::ConversationStorePort;
    use crate::domain::conversation::{ConversationId, Turn};
    use crate::infrastructure::adapters::FakeChatClient;
    use crate::infrastructure::http::{HttpServer, RelaySettings, ServerConfig};
    use crate::infrastructure::memory::InMemoryConversationStore;

    fn test_app() -> (Router, Arc<InMemoryConversationStore>) {
        let store = Arc::new(InMemoryConversationStore::default());
        let state = AppState::new(
            store.clone(),
            Arc::new(FakeChatClient::with_defaults()),
            RelaySettings::default(),
        );
        (
            HttpServer::new(ServerConfig::default(), state).build_router(),
            store,
        )
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_unknown_conversation_is_not_found() {
        let (app, _store) = test_app();
        let response = app
            .oneshot(post("/api/conversation/get", json!({"conversationId": "nope"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_close_conversation() {
        let (app, store) = test_app();
        let id = ConversationId::parse("conv-http").unwrap();
        store.append_exchange(&id, Turn::user_text("hi"), Turn::model_text("hello"));

        let response = app
            .clone()
            .oneshot(post("/api/conversation/close", json!({"conversationId": "conv-http"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"conversationId": "conv-http", "closed": true})
        );
        assert!(store.get(&id).is_none());

        let response = app
            .oneshot(post("/api/conversation/close", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
