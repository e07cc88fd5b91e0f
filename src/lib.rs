//! VoxRelay - 语音对话中继
//!
//! 浏览器录音 -> 服务端 -> Gemini -> 文本/音频回复
//!
//! 领域层 (domain/):
//! - Conversation Context: 会话与历史
//! - Voice Context: 录音/播放状态机、播放队列、活动检测、分段
//! - Live Context: WebSocket 实时协议
//! - audio: PCM 编解码、重采样、WAV 封装
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ChatModel, ConversationStore）
//! - Commands: 发送消息、关闭会话
//! - Queries: 查询会话
//! - Live: WebSocket 实时会话
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: REST API + WebSocket + 静态页面
//! - Memory: 会话存储内存实现
//! - Worker: 过期会话清理
//! - Adapters: Gemini Client, Fake Client
//!
//! 客户端 (client/):
//! - VoiceClient: 浏览器端录音/打断/播放驱动

pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
