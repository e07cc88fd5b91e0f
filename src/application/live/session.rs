//! Live Session - 一个 WebSocket 连接对应的实时会话
//!
//! 输入：客户端消息（音频块 / 文本 / 打断 / 提交）
//! 输出：通过 mpsc 发往连接的服务端消息
//!
//! 每个会话同一时间最多一个进行中的生成；新的一轮会取消旧的一轮

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::commands::handlers::SendMessageHandler;
use crate::application::commands::{Reply, SendMessageCommand, UserInput};
use crate::application::ports::ReplyModality;
use crate::domain::audio::{decode_base64_pcm16, encode_wav_mono16, WAV_MIME_TYPE};
use crate::domain::conversation::{ConversationId, Part};
use crate::domain::live::{ClientMessage, LivePart, ServerMessage};
use crate::domain::voice::{SegmenterConfig, SpeechSegmenter};

/// 实时会话配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSessionConfig {
    pub segmenter: SegmenterConfig,
    pub modality: ReplyModality,
}

impl Default for LiveSessionConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            modality: ReplyModality::Audio,
        }
    }
}

/// 进行中的生成
struct InFlight {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct LiveSession {
    conversation_id: ConversationId,
    handler: Arc<SendMessageHandler>,
    config: LiveSessionConfig,
    segmenter: SpeechSegmenter,
    outbound: mpsc::Sender<ServerMessage>,
    in_flight: Option<InFlight>,
}

impl LiveSession {
    pub fn new(
        handler: Arc<SendMessageHandler>,
        config: LiveSessionConfig,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Self {
        Self {
            conversation_id: ConversationId::generate(),
            handler,
            config,
            segmenter: SpeechSegmenter::new(config.segmenter),
            outbound,
            in_flight: None,
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// 发送 connected 消息
    pub async fn announce(&self) {
        self.send(ServerMessage::connected(self.conversation_id.as_str()))
            .await;
    }

    pub async fn handle(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::AudioChunk { data } => self.on_audio_chunk(&data).await,
            ClientMessage::Commit => {
                if let Some(utterance) = self.segmenter.flush() {
                    self.start_audio_turn(utterance);
                }
            }
            ClientMessage::Text { text } => {
                if text.trim().is_empty() {
                    self.send(ServerMessage::error("No text provided")).await;
                    return;
                }
                self.start_turn(UserInput::Text(text));
            }
            ClientMessage::Interrupt => self.interrupt().await,
        }
    }

    /// 是否有进行中的生成
    pub fn is_generating(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| !f.handle.is_finished())
    }

    /// 连接关闭：取消进行中的生成
    pub fn close(&mut self) {
        self.cancel_in_flight();
        self.segmenter.clear();
    }

    async fn on_audio_chunk(&mut self, data: &str) {
        let samples = match decode_base64_pcm16(data) {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %self.conversation_id,
                    error = %e,
                    "Skipping undecodable audio chunk"
                );
                self.send(ServerMessage::error(format!("Invalid audio chunk: {}", e)))
                    .await;
                return;
            }
        };

        if let Some(utterance) = self.segmenter.push(&samples) {
            self.start_audio_turn(utterance);
        }
    }

    async fn interrupt(&mut self) {
        let dropped = self.segmenter.clear();
        let cancelled = self.cancel_in_flight();

        tracing::info!(
            conversation_id = %self.conversation_id,
            dropped_samples = dropped,
            cancelled = cancelled,
            "Live session interrupted"
        );

        self.send(ServerMessage::interrupted()).await;
    }

    fn start_audio_turn(&mut self, utterance: Vec<i16>) {
        let wav = encode_wav_mono16(&utterance, self.config.segmenter.sample_rate);
        tracing::debug!(
            conversation_id = %self.conversation_id,
            samples = utterance.len(),
            "Utterance complete"
        );
        self.start_turn(UserInput::Audio {
            mime_type: WAV_MIME_TYPE.to_string(),
            data: wav,
        });
    }

    fn start_turn(&mut self, input: UserInput) {
        if self.cancel_in_flight() {
            tracing::debug!(
                conversation_id = %self.conversation_id,
                "New turn supersedes in-flight generation"
            );
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let handler = self.handler.clone();
        let outbound = self.outbound.clone();
        let conversation_id = self.conversation_id.clone();
        let failure_message = match &input {
            UserInput::Text(_) => "Error processing text",
            UserInput::Audio { .. } => "Error processing audio",
        };
        let cmd = SendMessageCommand {
            conversation_id: Some(conversation_id.to_string()),
            input,
            modality: self.config.modality,
        };

        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = task_cancel.cancelled() => {
                    tracing::debug!(conversation_id = %conversation_id, "Generation cancelled");
                    return;
                }
                result = handler.handle(cmd) => result,
            };

            // 结果返回后才被打断的也不再发送
            if task_cancel.is_cancelled() {
                return;
            }

            let message = match result {
                Ok(response) => ServerMessage::model_turn(reply_parts(&response.reply)),
                Err(e) => {
                    tracing::error!(
                        conversation_id = %conversation_id,
                        error = %e,
                        "Live generation failed"
                    );
                    ServerMessage::error(failure_message)
                }
            };

            // 出站队列满时可能在发送处等待，期间被打断同样丢弃
            tokio::select! {
                biased;
                _ = task_cancel.cancelled() => {
                    tracing::debug!(
                        conversation_id = %conversation_id,
                        "Reply dropped after cancel"
                    );
                }
                sent = outbound.send(message) => {
                    if sent.is_err() {
                        tracing::debug!(conversation_id = %conversation_id, "Live connection gone");
                    }
                }
            }
        });

        self.in_flight = Some(InFlight { cancel, handle });
    }

    /// 取消进行中的生成，返回是否确实取消了
    fn cancel_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) if !in_flight.handle.is_finished() => {
                in_flight.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    async fn send(&self, message: ServerMessage) {
        if self.outbound.send(message).await.is_err() {
            tracing::debug!(conversation_id = %self.conversation_id, "Live connection gone");
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
    }
}

/// 回复 -> live 片段
fn reply_parts(reply: &Reply) -> Vec<LivePart> {
    match reply {
        Reply::Text { text, .. } => vec![LivePart::from(&Part::text(text.as_str()))],
        Reply::Audio {
            mime_type,
            data,
            transcript,
        } => {
            let mut parts = vec![LivePart::from(&Part::inline_data(
                mime_type.as_str(),
                data.as_str(),
            ))];
            if let Some(text) = transcript {
                parts.push(LivePart::from(&Part::text(text.as_str())));
            }
            parts
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::application::ports::ConversationStorePort;
    use crate::domain::audio::encode_base64_pcm16;
    use crate::domain::conversation::Role;
    use crate::domain::SystemPrompt;
    use crate::infrastructure::adapters::{FakeChatClient, FakeChatClientConfig};
    use crate::infrastructure::memory::{InMemoryConversationStore, StoreConfig};

    struct Harness {
        session: LiveSession,
        rx: mpsc::Receiver<ServerMessage>,
        fake: Arc<FakeChatClient>,
        store: Arc<InMemoryConversationStore>,
    }

    fn harness(fake_config: FakeChatClientConfig, config: LiveSessionConfig) -> Harness {
        harness_with_capacity(fake_config, config, 16)
    }

    fn harness_with_capacity(
        fake_config: FakeChatClientConfig,
        config: LiveSessionConfig,
        capacity: usize,
    ) -> Harness {
        let store = Arc::new(InMemoryConversationStore::new(StoreConfig::default()));
        let fake = Arc::new(FakeChatClient::new(fake_config));
        let handler = Arc::new(SendMessageHandler::new(
            store.clone(),
            fake.clone(),
            SystemPrompt::default(),
        ));
        let (tx, rx) = mpsc::channel(capacity);
        Harness {
            session: LiveSession::new(handler, config, tx),
            rx,
            fake,
            store,
        }
    }

    fn text_config() -> LiveSessionConfig {
        LiveSessionConfig {
            modality: ReplyModality::Text,
            ..Default::default()
        }
    }

    async fn next_message(rx: &mut mpsc::Receiver<ServerMessage>) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("channel closed")
    }

    fn model_text(message: &ServerMessage) -> Option<String> {
        match message {
            ServerMessage::LiveMessage { payload } => payload
                .server_content
                .model_turn
                .as_ref()
                .and_then(|turn| turn.parts.iter().find_map(|p| p.text.clone())),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_announce_sends_conversation_id() {
        let mut h = harness(FakeChatClientConfig::default(), text_config());
        h.session.announce().await;

        let expected = ServerMessage::connected(h.session.conversation_id().as_str());
        assert_eq!(next_message(&mut h.rx).await, expected);
    }

    #[tokio::test]
    async fn test_text_turn_gets_model_reply() {
        let mut h = harness(FakeChatClientConfig::default(), text_config());
        h.session
            .handle(ClientMessage::Text {
                text: "What is the RV400?".to_string(),
            })
            .await;

        let message = next_message(&mut h.rx).await;
        assert_eq!(
            model_text(&message).as_deref(),
            Some(FakeChatClientConfig::default().reply_text.as_str())
        );

        let stored = h.store.get(h.session.conversation_id()).unwrap();
        assert_eq!(stored.turns.len(), 2);
        assert_eq!(stored.turns[1].role, Role::Model);
    }

    #[tokio::test]
    async fn test_interrupt_cancels_in_flight_generation() {
        let mut h = harness(
            FakeChatClientConfig {
                delay: Duration::from_millis(300),
                ..Default::default()
            },
            text_config(),
        );

        h.session
            .handle(ClientMessage::Text {
                text: "Tell me everything".to_string(),
            })
            .await;
        assert!(h.session.is_generating());

        h.session.handle(ClientMessage::Interrupt).await;
        assert_eq!(next_message(&mut h.rx).await, ServerMessage::interrupted());

        // 被取消的生成既不发送也不写历史
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(h.rx.try_recv().is_err());
        assert!(h.store.get(h.session.conversation_id()).is_none());
    }

    #[tokio::test]
    async fn test_interrupt_drops_reply_waiting_on_full_channel() {
        let mut h = harness_with_capacity(
            FakeChatClientConfig {
                delay: Duration::from_millis(20),
                ..Default::default()
            },
            text_config(),
            1,
        );

        // connected 占满容量为 1 的出站队列
        h.session.announce().await;
        h.session
            .handle(ClientMessage::Text {
                text: "What is the RV400?".to_string(),
            })
            .await;

        // 生成已完成，任务停在发送处
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(h.session.is_generating());

        let rx = &mut h.rx;
        let (_, received) = tokio::join!(h.session.handle(ClientMessage::Interrupt), async {
            let first = next_message(rx).await;
            let second = next_message(rx).await;
            (first, second)
        });

        assert!(matches!(received.0, ServerMessage::Connected { .. }));
        assert_eq!(received.1, ServerMessage::interrupted());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_interrupt_clears_buffered_audio() {
        let mut h = harness(FakeChatClientConfig::default(), text_config());

        h.session
            .handle(ClientMessage::AudioChunk {
                data: encode_base64_pcm16(&[8000i16; 1600]),
            })
            .await;
        h.session.handle(ClientMessage::Interrupt).await;
        assert_eq!(next_message(&mut h.rx).await, ServerMessage::interrupted());

        // 缓存已清空，commit 不会发起请求
        h.session.handle(ClientMessage::Commit).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.fake.requests().is_empty());
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_new_turn_supersedes_previous() {
        let mut h = harness(
            FakeChatClientConfig {
                delay: Duration::from_millis(200),
                ..Default::default()
            },
            text_config(),
        );

        h.session
            .handle(ClientMessage::Text {
                text: "first".to_string(),
            })
            .await;
        h.session
            .handle(ClientMessage::Text {
                text: "second".to_string(),
            })
            .await;

        let message = next_message(&mut h.rx).await;
        assert!(model_text(&message).is_some());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(h.rx.try_recv().is_err());

        let stored = h.store.get(h.session.conversation_id()).unwrap();
        assert_eq!(stored.turns.len(), 2);
        assert_eq!(stored.turns[0].text(), "second");
    }

    #[tokio::test]
    async fn test_speech_then_commit_sends_wav_turn() {
        let mut h = harness(FakeChatClientConfig::default(), LiveSessionConfig::default());

        // 开头的安静帧被丢弃
        let quiet = encode_base64_pcm16(&[0i16; 1600]);
        h.session
            .handle(ClientMessage::AudioChunk { data: quiet })
            .await;
        h.session.handle(ClientMessage::Commit).await;
        assert!(h.fake.requests().is_empty());

        let loud = encode_base64_pcm16(&[8000i16; 1600]);
        h.session
            .handle(ClientMessage::AudioChunk { data: loud })
            .await;
        h.session.handle(ClientMessage::Commit).await;

        let message = next_message(&mut h.rx).await;
        match message {
            ServerMessage::LiveMessage { payload } => {
                let parts = payload.server_content.model_turn.unwrap().parts;
                assert!(parts[0].inline_data.is_some());
                assert!(payload.server_content.turn_complete);
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let requests = h.fake.requests();
        assert_eq!(requests.len(), 1);
        match &requests[0].contents.last().unwrap().parts[0] {
            Part::InlineData { mime_type, .. } => assert_eq!(mime_type, WAV_MIME_TYPE),
            other => panic!("unexpected part: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_silence_completes_utterance() {
        let mut h = harness(
            FakeChatClientConfig::default(),
            LiveSessionConfig {
                segmenter: SegmenterConfig {
                    silence_ms: 100,
                    ..Default::default()
                },
                modality: ReplyModality::Text,
            },
        );

        h.session
            .handle(ClientMessage::AudioChunk {
                data: encode_base64_pcm16(&[8000i16; 800]),
            })
            .await;
        h.session
            .handle(ClientMessage::AudioChunk {
                data: encode_base64_pcm16(&[0i16; 1600]),
            })
            .await;

        let message = next_message(&mut h.rx).await;
        assert!(model_text(&message).is_some());
    }

    #[tokio::test]
    async fn test_bad_chunk_reports_error() {
        let mut h = harness(FakeChatClientConfig::default(), text_config());
        h.session
            .handle(ClientMessage::AudioChunk {
                data: "***".to_string(),
            })
            .await;

        assert!(matches!(
            next_message(&mut h.rx).await,
            ServerMessage::Error { .. }
        ));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_generic_error() {
        let mut h = harness(
            FakeChatClientConfig {
                fail_with: Some("HTTP 429: quota exceeded for key abc".to_string()),
                ..Default::default()
            },
            text_config(),
        );
        h.session
            .handle(ClientMessage::Text {
                text: "hi".to_string(),
            })
            .await;

        assert_eq!(
            next_message(&mut h.rx).await,
            ServerMessage::error("Error processing text")
        );
    }
}
