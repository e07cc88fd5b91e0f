//! Domain Layer - 领域层
//!
//! 包含:
//! - Conversation Context: 会话与历史
//! - Voice Context: 录音/播放状态机、播放队列、活动检测、分段
//! - Live Context: WebSocket 实时协议
//! - audio: PCM 编解码与重采样
//! - language / prompt: 回复语言检测与系统提示词

pub mod audio;
pub mod conversation;
pub mod live;
pub mod voice;

mod language;
mod prompt;

pub use language::{detect_language, DEFAULT_LANGUAGE};
pub use prompt::{SystemPrompt, DEFAULT_ACKNOWLEDGEMENT, DEFAULT_INSTRUCTIONS};
