//! Fake Chat Client - 用于测试和离线演示的模型客户端
//!
//! 返回固定回复，不实际调用模型服务

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{ChatError, ChatModelPort, ChatReply, ChatRequest, ReplyModality};
use crate::domain::audio::{
    encode_base64_pcm16, float_to_pcm16, PCM16_PLAYBACK_MIME, PLAYBACK_SAMPLE_RATE,
};
use crate::domain::conversation::Part;

/// 最多保留的请求记录数，超出后丢弃最旧的
pub const MAX_RECORDED_REQUESTS: usize = 32;

/// Fake Chat Client 配置
#[derive(Debug, Clone)]
pub struct FakeChatClientConfig {
    /// 固定返回的文本
    pub reply_text: String,
    /// 模拟模型延迟
    pub delay: Duration,
    /// 设置后每次调用都以该信息失败
    pub fail_with: Option<String>,
}

impl Default for FakeChatClientConfig {
    fn default() -> Self {
        Self {
            reply_text: "The Revolt RV400 offers a range of up to 150 km on a single charge."
                .to_string(),
            delay: Duration::ZERO,
            fail_with: None,
        }
    }
}

/// Fake Chat Client
///
/// 音频模式下返回一段 24 kHz PCM16 提示音加上文本
pub struct FakeChatClient {
    config: FakeChatClientConfig,
    requests: Mutex<VecDeque<ChatRequest>>,
}

impl FakeChatClient {
    pub fn new(config: FakeChatClientConfig) -> Self {
        tracing::info!(delay_ms = config.delay.as_millis() as u64, "FakeChatClient initialized");
        Self {
            config,
            requests: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeChatClientConfig::default())
    }

    /// 最近收到的请求（从旧到新）
    pub fn requests(&self) -> Vec<ChatRequest> {
        let requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        requests.iter().cloned().collect()
    }

    fn record(&self, request: ChatRequest) {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if requests.len() == MAX_RECORDED_REQUESTS {
            requests.pop_front();
        }
        requests.push_back(request);
    }
}

/// 200ms 440Hz 提示音
fn tone() -> String {
    let len = PLAYBACK_SAMPLE_RATE as usize / 5;
    let samples: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            0.2 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();
    encode_base64_pcm16(&float_to_pcm16(&samples))
}

#[async_trait]
impl ChatModelPort for FakeChatClient {
    async fn generate(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let modality = request.modality;
        tracing::debug!(
            turns = request.contents.len(),
            modality = modality.as_str(),
            "FakeChatClient: returning fixed reply"
        );
        self.record(request);

        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }

        if let Some(message) = &self.config.fail_with {
            return Err(ChatError::ServiceError {
                status: 500,
                message: message.clone(),
            });
        }

        let mut parts = Vec::with_capacity(2);
        if modality == ReplyModality::Audio {
            parts.push(Part::inline_data(PCM16_PLAYBACK_MIME, tone()));
        }
        parts.push(Part::text(self.config.reply_text.clone()));

        Ok(ChatReply { parts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::decode_base64_pcm16;
    use crate::domain::conversation::Turn;

    #[tokio::test]
    async fn test_records_requests_and_replies() {
        let fake = FakeChatClient::with_defaults();
        let reply = fake
            .generate(ChatRequest {
                contents: vec![Turn::user_text("hi")],
                modality: ReplyModality::Audio,
            })
            .await
            .unwrap();

        let (mime, data) = reply.audio().unwrap();
        assert_eq!(mime, PCM16_PLAYBACK_MIME);
        assert_eq!(decode_base64_pcm16(&data).unwrap().len(), 4800);
        assert!(!reply.joined_text().is_empty());
        assert_eq!(fake.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_request_log_is_bounded() {
        let fake = FakeChatClient::with_defaults();
        for i in 0..MAX_RECORDED_REQUESTS + 5 {
            fake.generate(ChatRequest {
                contents: vec![Turn::user_text(format!("question {}", i))],
                modality: ReplyModality::Text,
            })
            .await
            .unwrap();
        }

        let requests = fake.requests();
        assert_eq!(requests.len(), MAX_RECORDED_REQUESTS);
        assert_eq!(requests[0].contents[0].text(), "question 5");
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let fake = FakeChatClient::new(FakeChatClientConfig {
            fail_with: Some("boom".to_string()),
            ..Default::default()
        });
        let result = fake
            .generate(ChatRequest {
                contents: vec![Turn::user_text("hi")],
                modality: ReplyModality::Text,
            })
            .await;
        assert!(matches!(result, Err(ChatError::ServiceError { status: 500, .. })));
    }
}
