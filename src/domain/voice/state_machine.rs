//! 客户端录音/播放状态机
//!
//! 取代 isSpeaking / isRecording / shouldInterrupt 三个独立布尔量。
//! 所有状态迁移集中在 `apply`，非法迁移返回错误且状态不变。

use thiserror::Error;

/// 语音交互状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    /// 麦克风关闭，没有播放
    #[default]
    Idle,
    /// 麦克风打开，没有播放
    Listening,
    /// 正在播放模型回复；`mic_open` 表示麦克风是否同时打开（可打断）
    Speaking { mic_open: bool },
    /// 打断进行中：已清空播放队列，等待打断信号发出
    Interrupting,
}

impl VoiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceState::Idle => "idle",
            VoiceState::Listening => "listening",
            VoiceState::Speaking { .. } => "speaking",
            VoiceState::Interrupting => "interrupting",
        }
    }

    pub fn is_mic_open(&self) -> bool {
        matches!(
            self,
            VoiceState::Listening
                | VoiceState::Speaking { mic_open: true }
                | VoiceState::Interrupting
        )
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, VoiceState::Speaking { .. })
    }
}

/// 状态机事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceEvent {
    StartListening,
    StopListening,
    PlaybackStarted,
    PlaybackFinished,
    /// 播放期间检测到用户说话
    BargeIn,
    /// 用户手动暂停播放
    Cancel,
    /// 打断信号已发出
    InterruptSent,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid transition: {event:?} in state {from:?}")]
pub struct TransitionError {
    pub from: VoiceState,
    pub event: VoiceEvent,
}

/// 状态机
#[derive(Debug, Clone, Default)]
pub struct VoiceStateMachine {
    state: VoiceState,
}

impl VoiceStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// 计算迁移目标，不修改状态
    pub fn next(state: VoiceState, event: VoiceEvent) -> Result<VoiceState, TransitionError> {
        use VoiceEvent::*;
        use VoiceState::*;

        let to = match (state, event) {
            (Idle, StartListening) => Listening,
            (Idle, PlaybackStarted) => Speaking { mic_open: false },

            (Listening, StopListening) => Idle,
            (Listening, PlaybackStarted) => Speaking { mic_open: true },

            (Speaking { mic_open }, PlaybackStarted) => Speaking { mic_open },
            (Speaking { mic_open: false }, StartListening) => Speaking { mic_open: true },
            (Speaking { mic_open: true }, StopListening) => Speaking { mic_open: false },
            (Speaking { mic_open }, PlaybackFinished) | (Speaking { mic_open }, Cancel) => {
                if mic_open {
                    Listening
                } else {
                    Idle
                }
            }
            (Speaking { mic_open: true }, BargeIn) => Interrupting,

            (Interrupting, InterruptSent) => Listening,

            (from, event) => return Err(TransitionError { from, event }),
        };

        Ok(to)
    }

    /// 应用事件
    pub fn apply(&mut self, event: VoiceEvent) -> Result<VoiceState, TransitionError> {
        let to = Self::next(self.state, event)?;
        if to != self.state {
            tracing::debug!(
                from = self.state.as_str(),
                to = to.as_str(),
                event = ?event,
                "Voice state changed"
            );
        }
        self.state = to;
        Ok(to)
    }

    /// 录音失败等情况下回到初始状态
    pub fn reset(&mut self) {
        self.state = VoiceState::Idle;
    }
}
