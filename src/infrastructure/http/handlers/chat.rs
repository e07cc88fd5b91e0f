//! Chat HTTP Handlers
//!
//! /api/audio 与 /api/text：解析输入，调用一次模型，返回回复

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::application::{SendMessageCommand, UserInput, DEFAULT_AUDIO_MIME};
use crate::infrastructure::http::dto::{ChatReplyDto, TextMessageRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

const AUDIO_FAILURE: &str = "Error processing audio";
const TEXT_FAILURE: &str = "Error processing text";

/// 上传录音
///
/// multipart 字段：`audio`（必填，二进制）、`conversationId`（可选）
pub async fn audio_message(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ChatReplyDto>, ApiError> {
    let mut multipart =
        multipart.map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?;

    let mut conversation_id: Option<String> = None;
    let mut audio: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "audio" => {
                let mime_type = field
                    .content_type()
                    .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
                    .unwrap_or(DEFAULT_AUDIO_MIME)
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read audio: {}", e)))?
                    .to_vec();
                audio = Some((mime_type, data));
            }
            "conversationId" => {
                conversation_id = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read conversationId: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let (mime_type, data) =
        audio.ok_or_else(|| ApiError::BadRequest("No audio file provided".to_string()))?;

    tracing::debug!(
        mime_type = %mime_type,
        audio_size = data.len(),
        "Audio message received"
    );

    let response = state
        .send_message_handler
        .handle(SendMessageCommand {
            conversation_id,
            input: UserInput::Audio { mime_type, data },
            modality: state.reply_mode,
        })
        .await
        .map_err(|e| ApiError::from_application(e, AUDIO_FAILURE))?;

    Ok(Json(ChatReplyDto::from(response)))
}

/// 发送文本
pub async fn text_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TextMessageRequest>, JsonRejection>,
) -> Result<Json<ChatReplyDto>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let response = state
        .send_message_handler
        .handle(SendMessageCommand {
            conversation_id: req.conversation_id,
            input: UserInput::Text(req.text.unwrap_or_default()),
            modality: state.reply_mode,
        })
        .await
        .map_err(|e| ApiError::from_application(e, TEXT_FAILURE))?;

    Ok(Json(ChatReplyDto::from(response)))
}
