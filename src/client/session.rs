//! VoiceClient - 录音、打断与播放的组合驱动

use std::time::Instant;

use thiserror::Error;

use crate::domain::audio::{
    encode_base64_pcm16, float_to_pcm16, mean_abs_level, to_target_rate, ResampleError,
};
use crate::domain::live::{ClientMessage, ServerMessage};
use crate::domain::voice::{
    Activity, ActivityConfig, ActivityDetector, PlaybackBuffer, PlaybackQueue, TransitionError,
    VoiceEvent, VoiceState, VoiceStateMachine,
};

/// 宿主需要执行的动作
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// 通过 WebSocket 发送消息
    Send(ClientMessage),
    /// 开始播放这一段
    StartPlayback(PlaybackBuffer),
    /// 立即停止当前播放
    StopPlayback,
    /// 结束录音并上传（MediaRecorder 模式）
    SubmitRecording,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Resample(#[from] ResampleError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientConfig {
    /// 麦克风原生采样率
    pub native_rate: u32,
    /// 静音超时后自动结束录音并上传，而不是持续推流
    pub auto_stop: bool,
    pub activity: ActivityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            native_rate: 48_000,
            auto_stop: false,
            activity: ActivityConfig::default(),
        }
    }
}

/// 客户端会话
pub struct VoiceClient {
    config: ClientConfig,
    fsm: VoiceStateMachine,
    queue: PlaybackQueue,
    detector: ActivityDetector,
}

impl VoiceClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            fsm: VoiceStateMachine::new(),
            queue: PlaybackQueue::new(),
            detector: ActivityDetector::new(config.activity),
        }
    }

    pub fn state(&self) -> VoiceState {
        self.fsm.state()
    }

    pub fn pending_playback(&self) -> usize {
        self.queue.pending_len()
    }

    /// 打开麦克风
    pub fn start_recording(&mut self) -> Result<(), ClientError> {
        self.fsm.apply(VoiceEvent::StartListening)?;
        self.detector.reset();
        Ok(())
    }

    /// 打开麦克风失败（设备/权限错误），只复位录音状态，正在播放的回复继续
    pub fn recording_failed(&mut self) {
        self.detector.reset();
        match self.fsm.state() {
            VoiceState::Speaking { mic_open: true } => {
                // Speaking{true} + StopListening 总是合法
                let _ = self.fsm.apply(VoiceEvent::StopListening);
            }
            VoiceState::Speaking { mic_open: false } => {}
            VoiceState::Idle | VoiceState::Listening | VoiceState::Interrupting => self.fsm.reset(),
        }
    }

    /// 关闭麦克风
    ///
    /// 推流模式下提交当前这句话，MediaRecorder 模式下上传录音
    pub fn stop_recording(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        self.fsm.apply(VoiceEvent::StopListening)?;
        self.detector.reset();

        Ok(vec![if self.config.auto_stop {
            ClientAction::SubmitRecording
        } else {
            ClientAction::Send(ClientMessage::Commit)
        }])
    }

    /// 处理一帧麦克风采样（原生采样率，[-1, 1]）
    pub fn on_mic_frame(
        &mut self,
        samples: &[f32],
        now: Instant,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let state = self.fsm.state();
        if !state.is_mic_open() {
            return Ok(Vec::new());
        }

        let mut actions = Vec::new();
        let level = mean_abs_level(samples);

        match self.detector.observe(level, state.is_speaking(), now) {
            Activity::BargeIn => {
                let dropped = self.queue.interrupt();
                self.fsm.apply(VoiceEvent::BargeIn)?;
                actions.push(ClientAction::StopPlayback);
                actions.push(ClientAction::Send(ClientMessage::Interrupt));
                self.fsm.apply(VoiceEvent::InterruptSent)?;
                tracing::debug!(level = level, dropped = dropped, "Barge-in, playback interrupted");
            }
            Activity::SilenceTimeout
                if self.config.auto_stop && self.fsm.state() == VoiceState::Listening =>
            {
                self.fsm.apply(VoiceEvent::StopListening)?;
                return Ok(vec![ClientAction::SubmitRecording]);
            }
            _ => {}
        }

        if !self.config.auto_stop {
            let resampled = to_target_rate(samples, self.config.native_rate)?;
            if !resampled.is_empty() {
                let data = encode_base64_pcm16(&float_to_pcm16(&resampled));
                actions.push(ClientAction::Send(ClientMessage::AudioChunk { data }));
            }
        }

        Ok(actions)
    }

    /// 处理服务端消息
    pub fn on_server_message(
        &mut self,
        message: ServerMessage,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let content = match message {
            ServerMessage::LiveMessage { payload } => payload.server_content,
            ServerMessage::Connected { payload } => {
                tracing::debug!(conversation_id = %payload.conversation_id, "Server connected");
                return Ok(Vec::new());
            }
            ServerMessage::Error { payload } => {
                tracing::warn!(message = %payload.message, "Server error");
                return Ok(Vec::new());
            }
        };

        if content.interrupted {
            return self.stop_playback(VoiceEvent::Cancel);
        }

        if let Some(turn) = content.model_turn {
            for part in turn.parts {
                if let Some(inline) = part.inline_data {
                    self.queue.enqueue_inline(&inline.mime_type, &inline.data);
                }
            }
        }

        self.drain()
    }

    /// 当前缓冲区播放完成
    pub fn on_playback_finished(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        self.queue.finish_current();
        let actions = self.drain()?;
        if actions.is_empty() && self.fsm.state().is_speaking() {
            self.fsm.apply(VoiceEvent::PlaybackFinished)?;
        }
        Ok(actions)
    }

    /// 用户手动暂停播放
    pub fn pause(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        self.stop_playback(VoiceEvent::Cancel)
    }

    fn stop_playback(&mut self, event: VoiceEvent) -> Result<Vec<ClientAction>, ClientError> {
        self.queue.interrupt();
        if !self.fsm.state().is_speaking() {
            return Ok(Vec::new());
        }
        self.fsm.apply(event)?;
        Ok(vec![ClientAction::StopPlayback])
    }

    /// 空闲时开始播放下一段
    fn drain(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if self.fsm.state() == VoiceState::Interrupting {
            return Ok(Vec::new());
        }
        match self.queue.start_next() {
            Some(buffer) => {
                self.fsm.apply(VoiceEvent::PlaybackStarted)?;
                Ok(vec![ClientAction::StartPlayback(buffer)])
            }
            None => Ok(Vec::new()),
        }
    }
}

impl Default for VoiceClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::audio::PCM16_PLAYBACK_MIME;
    use crate::domain::live::{LiveInlineData, LivePart};

    fn audio_turn(samples: usize) -> ServerMessage {
        ServerMessage::model_turn(vec![LivePart {
            text: None,
            inline_data: Some(LiveInlineData {
                mime_type: PCM16_PLAYBACK_MIME.to_string(),
                data: encode_base64_pcm16(&vec![1000i16; samples]),
            }),
        }])
    }

    fn frame(amplitude: f32) -> Vec<f32> {
        vec![amplitude; 480]
    }

    #[test]
    fn test_mic_frames_are_resampled_and_streamed() {
        let mut client = VoiceClient::default();
        assert!(client.on_mic_frame(&frame(0.5), Instant::now()).unwrap().is_empty());

        client.start_recording().unwrap();
        let actions = client.on_mic_frame(&frame(0.5), Instant::now()).unwrap();
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            ClientAction::Send(ClientMessage::AudioChunk { data }) => {
                let samples = crate::domain::audio::decode_base64_pcm16(data).unwrap();
                // 48 kHz 480 帧 -> 16 kHz 160 帧
                assert_eq!(samples.len(), 160);
                assert_eq!(samples[0], float_to_pcm16(&[0.5])[0]);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_playback_is_sequential() {
        let mut client = VoiceClient::default();

        let first = client.on_server_message(audio_turn(2400)).unwrap();
        assert!(matches!(
            first.as_slice(),
            [ClientAction::StartPlayback(b)] if b.sample_rate == 24_000
        ));
        assert_eq!(client.state(), VoiceState::Speaking { mic_open: false });

        // 第二段排队，不与第一段重叠
        assert!(client.on_server_message(audio_turn(1200)).unwrap().is_empty());
        assert_eq!(client.pending_playback(), 1);

        let next = client.on_playback_finished().unwrap();
        assert!(matches!(
            next.as_slice(),
            [ClientAction::StartPlayback(b)] if b.samples.len() == 1200
        ));

        assert!(client.on_playback_finished().unwrap().is_empty());
        assert_eq!(client.state(), VoiceState::Idle);
    }

    #[test]
    fn test_barge_in_interrupts_playback() {
        let mut client = VoiceClient::default();
        client.start_recording().unwrap();
        client.on_server_message(audio_turn(2400)).unwrap();
        client.on_server_message(audio_turn(2400)).unwrap();
        assert_eq!(client.state(), VoiceState::Speaking { mic_open: true });

        // 低于打断阈值：继续播放
        let actions = client.on_mic_frame(&frame(0.05), Instant::now()).unwrap();
        assert!(!actions.contains(&ClientAction::StopPlayback));
        assert!(client.state().is_speaking());

        let actions = client.on_mic_frame(&frame(0.5), Instant::now()).unwrap();
        assert_eq!(actions[0], ClientAction::StopPlayback);
        assert_eq!(actions[1], ClientAction::Send(ClientMessage::Interrupt));
        assert!(matches!(actions[2], ClientAction::Send(ClientMessage::AudioChunk { .. })));
        assert_eq!(client.state(), VoiceState::Listening);
        assert_eq!(client.pending_playback(), 0);
    }

    #[test]
    fn test_auto_stop_submits_after_silence() {
        let mut client = VoiceClient::new(ClientConfig {
            auto_stop: true,
            ..Default::default()
        });
        client.start_recording().unwrap();

        let t0 = Instant::now();
        assert!(client.on_mic_frame(&frame(0.05), t0).unwrap().is_empty());
        assert!(client
            .on_mic_frame(&frame(0.0), t0 + Duration::from_millis(500))
            .unwrap()
            .is_empty());

        let actions = client
            .on_mic_frame(&frame(0.0), t0 + Duration::from_millis(1600))
            .unwrap();
        assert_eq!(actions, vec![ClientAction::SubmitRecording]);
        assert_eq!(client.state(), VoiceState::Idle);
    }

    #[test]
    fn test_stop_recording_commits_when_streaming() {
        let mut client = VoiceClient::default();
        client.start_recording().unwrap();
        assert_eq!(
            client.stop_recording().unwrap(),
            vec![ClientAction::Send(ClientMessage::Commit)]
        );
        assert!(client.stop_recording().is_err());
        assert_eq!(client.state(), VoiceState::Idle);
    }

    #[test]
    fn test_pause_and_server_interrupt_stop_playback() {
        let mut client = VoiceClient::default();
        client.on_server_message(audio_turn(2400)).unwrap();
        assert_eq!(client.pause().unwrap(), vec![ClientAction::StopPlayback]);
        assert_eq!(client.state(), VoiceState::Idle);
        assert!(client.pause().unwrap().is_empty());

        client.start_recording().unwrap();
        client.on_server_message(audio_turn(2400)).unwrap();
        let actions = client.on_server_message(ServerMessage::interrupted()).unwrap();
        assert_eq!(actions, vec![ClientAction::StopPlayback]);
        assert_eq!(client.state(), VoiceState::Listening);
    }

    #[test]
    fn test_recording_failure_resets_state() {
        let mut client = VoiceClient::default();
        client.start_recording().unwrap();
        client.recording_failed();
        assert_eq!(client.state(), VoiceState::Idle);

        client.start_recording().unwrap();
        assert_eq!(client.state(), VoiceState::Listening);
    }

    #[test]
    fn test_recording_failure_keeps_playback() {
        let mut client = VoiceClient::default();
        client.on_server_message(audio_turn(2400)).unwrap();
        client.on_server_message(audio_turn(1200)).unwrap();
        client.start_recording().unwrap();

        client.recording_failed();
        assert_eq!(client.state(), VoiceState::Speaking { mic_open: false });
        assert_eq!(client.pending_playback(), 1);

        // 剩余的回复照常播放
        let next = client.on_playback_finished().unwrap();
        assert!(matches!(next.as_slice(), [ClientAction::StartPlayback(_)]));
    }

    #[test]
    fn test_text_parts_and_errors_do_not_start_playback() {
        let mut client = VoiceClient::default();
        let text_only = ServerMessage::model_turn(vec![LivePart {
            text: Some("hello".to_string()),
            inline_data: None,
        }]);
        assert!(client.on_server_message(text_only).unwrap().is_empty());
        assert!(client
            .on_server_message(ServerMessage::error("Error processing audio"))
            .unwrap()
            .is_empty());
        assert_eq!(client.state(), VoiceState::Idle);
    }
}
