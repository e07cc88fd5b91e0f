//! Chat Command Handlers

use std::sync::Arc;
use std::time::Instant;

use crate::application::commands::chat_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChatModelPort, ChatReply, ChatRequest, ConversationStorePort, ReplyModality,
};
use crate::domain::conversation::{ConversationId, Part, Role, Turn};
use crate::domain::{detect_language, SystemPrompt};

/// SendMessage Handler - 一次中继：解析会话 -> 调用模型 -> 更新历史
pub struct SendMessageHandler {
    store: Arc<dyn ConversationStorePort>,
    chat_model: Arc<dyn ChatModelPort>,
    prompt: SystemPrompt,
}

impl SendMessageHandler {
    pub fn new(
        store: Arc<dyn ConversationStorePort>,
        chat_model: Arc<dyn ChatModelPort>,
        prompt: SystemPrompt,
    ) -> Self {
        Self {
            store,
            chat_model,
            prompt,
        }
    }

    pub async fn handle(
        &self,
        cmd: SendMessageCommand,
    ) -> Result<SendMessageResponse, ApplicationError> {
        let conversation_id = ConversationId::parse_or_generate(cmd.conversation_id.as_deref())?;
        let input_kind = cmd.input.kind();
        let user_turn = cmd.input.into_turn()?;

        // 未知 ID（从未出现或已被淘汰）从空历史开始
        let history = self
            .store
            .get(&conversation_id)
            .map(|c| c.turns)
            .unwrap_or_default();

        let mut contents = Vec::with_capacity(history.len() + 3);
        contents.extend(self.prompt.priming_turns());
        contents.extend(history.iter().cloned());
        contents.push(user_turn.clone());

        tracing::debug!(
            conversation_id = %conversation_id,
            input = input_kind,
            history_turns = history.len(),
            modality = cmd.modality.as_str(),
            "Sending message to chat model"
        );

        let started = Instant::now();
        let reply = self
            .chat_model
            .generate(ChatRequest {
                contents,
                modality: cmd.modality,
            })
            .await?;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let (reply, model_turn) = build_reply(cmd.modality, reply)?;
        self.store
            .append_exchange(&conversation_id, user_turn, model_turn);

        tracing::info!(
            conversation_id = %conversation_id,
            input = input_kind,
            modality = cmd.modality.as_str(),
            response_time_ms = response_time_ms,
            "Chat reply generated"
        );

        Ok(SendMessageResponse {
            conversation_id,
            reply,
            response_time_ms,
        })
    }
}

/// 把模型回复转成对外的 Reply 和存入历史的 model 轮次
fn build_reply(
    modality: ReplyModality,
    reply: ChatReply,
) -> Result<(Reply, Turn), ApplicationError> {
    let text = reply.joined_text();

    match modality {
        ReplyModality::Text => {
            if text.is_empty() {
                return Err(ApplicationError::ExternalServiceError(
                    "Model returned no text".to_string(),
                ));
            }
            let language = detect_language(&text);
            Ok((
                Reply::Text {
                    text: text.clone(),
                    language,
                },
                Turn::model_text(text),
            ))
        }
        ReplyModality::Audio => {
            let (mime_type, data) = reply.audio().ok_or_else(|| {
                ApplicationError::ExternalServiceError("Model returned no audio".to_string())
            })?;
            let reply_out = Reply::Audio {
                mime_type: mime_type.clone(),
                data: data.clone(),
                transcript: (!text.is_empty()).then(|| text.clone()),
            };
            // 有文本时历史只存文本，避免把大段音频回放给模型
            let model_turn = if text.is_empty() {
                Turn::new(Role::Model, vec![Part::inline_data(mime_type, data)])
            } else {
                Turn::model_text(text)
            };
            Ok((reply_out, model_turn))
        }
    }
}
