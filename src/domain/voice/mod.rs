//! Voice Context - 语音交互
//!
//! 职责:
//! - 录音/播放状态机
//! - 有序播放队列
//! - 能量阈值活动检测（客户端打断）
//! - 服务端语音分段

mod activity;
mod playback;
mod segmenter;
mod state_machine;

pub use activity::{
    Activity, ActivityConfig, ActivityDetector, INTERRUPTION_THRESHOLD, SILENCE_TIMEOUT,
    SPEECH_THRESHOLD,
};
pub use playback::{sample_rate_from_mime, PlaybackBuffer, PlaybackQueue};
pub use segmenter::{SegmenterConfig, SpeechSegmenter};
pub use state_machine::{TransitionError, VoiceEvent, VoiceState, VoiceStateMachine};
