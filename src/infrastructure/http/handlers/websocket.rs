//! WebSocket Handler - 实时语音会话
//!
//! 每个连接一个 LiveSession：接收端把客户端消息交给会话，
//! 转发端把会话产生的服务端消息写回连接

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::LiveSession;
use crate::domain::live::{ClientMessage, ServerMessage};
use crate::infrastructure::http::state::AppState;

/// 出站消息队列容量
const OUTBOUND_CAPACITY: usize = 64;

/// 实时会话 WebSocket 连接处理
pub async fn live_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_live_socket(socket, state))
}

async fn handle_live_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_CAPACITY);

    let mut session = LiveSession::new(
        state.send_message_handler.clone(),
        state.live,
        tx.clone(),
    );
    let conversation_id = session.conversation_id().clone();
    let conversation_id_for_forward = conversation_id.clone();

    tracing::info!(conversation_id = %conversation_id, "Live WebSocket connected");
    session.announce().await;

    // 出站转发任务
    let forward_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let msg = match serde_json::to_string(&message) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize live message");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(
                    conversation_id = %conversation_id_for_forward,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }
        }
    });

    // 接收客户端消息
    let conversation_id_for_receive = conversation_id.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => session.handle(message).await,
                    Err(e) => {
                        tracing::warn!(
                            conversation_id = %conversation_id_for_receive,
                            error = %e,
                            "Invalid live message"
                        );
                        let _ = tx
                            .send(ServerMessage::error(format!("Invalid message: {}", e)))
                            .await;
                    }
                },
                Ok(Message::Close(_)) => {
                    tracing::info!(
                        conversation_id = %conversation_id_for_receive,
                        "WebSocket closed by client"
                    );
                    break;
                }
                Err(e) => {
                    tracing::debug!(
                        conversation_id = %conversation_id_for_receive,
                        error = %e,
                        "WebSocket error"
                    );
                    break;
                }
                _ => {
                    // Ping/Pong 由 axum 处理，二进制帧忽略
                }
            }
        }
        session.close();
    });

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!(conversation_id = %conversation_id, "Live WebSocket disconnected");
}
