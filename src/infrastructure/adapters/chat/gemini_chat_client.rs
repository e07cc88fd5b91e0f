//! Gemini Chat Client - 调用托管的 Gemini generateContent 接口
//!
//! 实现 ChatModelPort trait
//!
//! 音频回复分两步：先用对话模型生成文本，再交给 TTS 模型朗读。
//! TTS 模型只接受文本输入，不能直接回答问题。
//!
//! POST {base_url}/{api_version}/models/{model}:generateContent
//! Header: x-goog-api-key
//! Request:  {"contents": [{"role", "parts": [{"text"} | {"inlineData": {"mimeType", "data"}}]}],
//!            "generationConfig": {...}}
//! Response: {"candidates": [{"content": {"parts": [...]}}], "promptFeedback": {...}}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{ChatError, ChatModelPort, ChatReply, ChatRequest, ReplyModality};
use crate::domain::conversation::{Part, Turn};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(
        default,
        alias = "inline_data",
        skip_serializing_if = "Option::is_none"
    )]
    inline_data: Option<WireBlob>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    response_modalities: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<WireSpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSpeechConfig {
    voice_config: WireVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireVoiceConfig {
    prebuilt_voice_config: WirePrebuiltVoice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePrebuiltVoice {
    voice_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireCandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => WirePart {
                text: Some(text.clone()),
                inline_data: None,
            },
            Part::InlineData { mime_type, data } => WirePart {
                text: None,
                inline_data: Some(WireBlob {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                }),
            },
        }
    }
}

impl From<&Turn> for WireContent {
    fn from(turn: &Turn) -> Self {
        WireContent {
            role: turn.role.as_str(),
            parts: turn.parts.iter().map(WirePart::from).collect(),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Gemini 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiChatClientConfig {
    pub api_key: String,
    /// 服务基础 URL
    pub base_url: String,
    pub api_version: String,
    /// 对话模型，文本与音频回复都由它生成内容
    pub text_model: String,
    /// TTS 模型，把回复文本读出来
    pub audio_model: String,
    /// 音频回复的预置发音人
    pub voice_name: String,
    /// 只限制对话模型的输出
    pub max_output_tokens: u32,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for GeminiChatClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_version: "v1beta".to_string(),
            text_model: "gemini-1.5-flash-latest".to_string(),
            audio_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice_name: "Kore".to_string(),
            max_output_tokens: 150,
            timeout_secs: 30,
        }
    }
}

impl GeminiChatClientConfig {
    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            model
        )
    }
}

/// Gemini 客户端
pub struct GeminiChatClient {
    client: Client,
    config: GeminiChatClientConfig,
}

impl GeminiChatClient {
    pub fn new(config: GeminiChatClientConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn models_url(&self) -> String {
        format!(
            "{}/{}/models",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version
        )
    }
}

/// 对话请求：完整轮次序列，只要文本
fn build_request(request: &ChatRequest, config: &GeminiChatClientConfig) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request.contents.iter().map(WireContent::from).collect(),
        generation_config: WireGenerationConfig {
            max_output_tokens: Some(config.max_output_tokens),
            response_modalities: Vec::new(),
            speech_config: None,
        },
    }
}

/// TTS 请求：单个用户轮次，内容是要朗读的文本
fn build_speech_request(text: &str, config: &GeminiChatClientConfig) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![WireContent {
            role: "user",
            parts: vec![WirePart {
                text: Some(text.to_string()),
                inline_data: None,
            }],
        }],
        generation_config: WireGenerationConfig {
            max_output_tokens: None,
            response_modalities: vec!["AUDIO"],
            speech_config: Some(WireSpeechConfig {
                voice_config: WireVoiceConfig {
                    prebuilt_voice_config: WirePrebuiltVoice {
                        voice_name: config.voice_name.clone(),
                    },
                },
            }),
        },
    }
}

fn parse_response(response: GenerateContentResponse) -> Result<ChatReply, ChatError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ChatError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ChatError::EmptyReply)?;

    let parts: Vec<Part> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| match (part.text, part.inline_data) {
            (_, Some(blob)) => Some(Part::inline_data(blob.mime_type, blob.data)),
            (Some(text), None) => Some(Part::text(text)),
            (None, None) => None,
        })
        .collect();

    if parts.is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if reason != "STOP" => {
                ChatError::InvalidResponse(format!("no content, finish reason {}", reason))
            }
            _ => ChatError::EmptyReply,
        });
    }

    Ok(ChatReply { parts })
}

impl GeminiChatClient {
    async fn post_generate(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<ChatReply, ChatError> {
        let url = self.config.generate_url(model);

        tracing::debug!(
            url = %url,
            turns = body.contents.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else if e.is_connect() {
                    ChatError::NetworkError(format!("Cannot connect to model service: {}", e))
                } else {
                    ChatError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChatError::ServiceError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        let reply = parse_response(parsed)?;

        tracing::info!(model = model, parts = reply.parts.len(), "Model reply received");

        Ok(reply)
    }
}

/// 文本回复 + TTS 结果 -> 音频回复（音频在前，文本作为转写）
fn speech_reply(text: String, speech: ChatReply) -> Result<ChatReply, ChatError> {
    let mut parts: Vec<Part> = speech
        .parts
        .into_iter()
        .filter(|part| matches!(part, Part::InlineData { .. }))
        .collect();
    if parts.is_empty() {
        return Err(ChatError::InvalidResponse(
            "speech model returned no audio".to_string(),
        ));
    }
    parts.push(Part::text(text));
    Ok(ChatReply { parts })
}

#[async_trait]
impl ChatModelPort for GeminiChatClient {
    async fn generate(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let body = build_request(&request, &self.config);
        let reply = self.post_generate(&self.config.text_model, &body).await?;

        match request.modality {
            ReplyModality::Text => Ok(reply),
            ReplyModality::Audio => {
                let text = reply.joined_text();
                if text.is_empty() {
                    return Err(ChatError::EmptyReply);
                }
                let speech_body = build_speech_request(&text, &self.config);
                let speech = self
                    .post_generate(&self.config.audio_model, &speech_body)
                    .await?;
                speech_reply(text, speech)
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.models_url())
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
