//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::ReplyModality;
use crate::domain::{DEFAULT_ACKNOWLEDGEMENT, DEFAULT_INSTRUCTIONS};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 托管模型配置
    #[serde(default)]
    pub model: ModelConfig,

    /// 助手行为配置
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// 会话存储配置
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// GC 配置
    #[serde(default)]
    pub gc: GcConfig,

    /// 实时会话配置
    #[serde(default)]
    pub live: LiveConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 上传大小上限（字节），默认 10MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,
}

fn default_static_enabled() -> bool {
    true
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_size: default_max_upload_size(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 模型提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// Gemini generateContent
    #[default]
    Gemini,
    /// 固定回复，离线演示用
    Fake,
}

impl ModelProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::Gemini => "gemini",
            ModelProvider::Fake => "fake",
        }
    }
}

/// 托管模型配置
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: ModelProvider,

    /// API key，也可以通过 GEMINI_API_KEY 设置
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// 对话模型，两种回复方式都先由它生成文字
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// 语音合成模型，音频回复时朗读对话模型的文字
    #[serde(default = "default_audio_model")]
    pub audio_model: String,

    /// 音频回复的预置发音人
    #[serde(default = "default_voice_name")]
    pub voice_name: String,

    /// 只限制对话模型
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// 请求超时时间（秒）
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

fn default_model_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_version() -> String {
    "v1beta".to_string()
}

fn default_text_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_audio_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_voice_name() -> String {
    "Kore".to_string()
}

fn default_max_output_tokens() -> u32 {
    150
}

fn default_model_timeout() -> u64 {
    30
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            api_key: String::new(),
            base_url: default_model_base_url(),
            api_version: default_api_version(),
            text_model: default_text_model(),
            audio_model: default_audio_model(),
            voice_name: default_voice_name(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_model_timeout(),
        }
    }
}

/// 助手行为配置
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// HTTP 接口的回复形式: text | audio
    #[serde(default)]
    pub reply_mode: ReplyModality,

    /// 系统提示词
    #[serde(default = "default_system_instructions")]
    pub system_instructions: String,

    /// 模型对系统提示词的确认
    #[serde(default = "default_acknowledgement")]
    pub acknowledgement: String,
}

fn default_system_instructions() -> String {
    DEFAULT_INSTRUCTIONS.to_string()
}

fn default_acknowledgement() -> String {
    DEFAULT_ACKNOWLEDGEMENT.to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            reply_mode: ReplyModality::Text,
            system_instructions: default_system_instructions(),
            acknowledgement: default_acknowledgement(),
        }
    }
}

/// 会话存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// 最多保存的会话数
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// 空闲过期时间（秒）
    #[serde(default = "default_conversation_ttl")]
    pub ttl_secs: u64,

    /// 每个会话最多保留的轮次
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_max_entries() -> usize {
    1000
}

fn default_conversation_ttl() -> u64 {
    3600 // 1 小时
}

fn default_max_turns() -> usize {
    40
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_conversation_ttl(),
            max_turns: default_max_turns(),
        }
    }
}

/// GC（垃圾回收）配置
#[derive(Debug, Clone, Deserialize)]
pub struct GcConfig {
    /// 是否启用自动 GC
    #[serde(default = "default_gc_enabled")]
    pub enabled: bool,

    /// GC 间隔时间（秒）
    #[serde(default = "default_gc_interval")]
    pub interval_secs: u64,
}

fn default_gc_enabled() -> bool {
    true
}

fn default_gc_interval() -> u64 {
    60
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: default_gc_enabled(),
            interval_secs: default_gc_interval(),
        }
    }
}

/// 实时会话配置
#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    /// 说话判定阈值（平均绝对幅度，0..1）
    #[serde(default = "default_speech_threshold")]
    pub speech_threshold: f32,

    /// 一句话结束前的静音时长（毫秒）
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u64,

    /// 单句最长时长（秒）
    #[serde(default = "default_max_utterance")]
    pub max_utterance_secs: u64,

    /// 回复形式: text | audio
    #[serde(default = "default_live_reply_mode")]
    pub reply_mode: ReplyModality,
}

fn default_speech_threshold() -> f32 {
    0.02
}

fn default_silence_ms() -> u64 {
    1500
}

fn default_max_utterance() -> u64 {
    30
}

fn default_live_reply_mode() -> ReplyModality {
    ReplyModality::Audio
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            speech_threshold: default_speech_threshold(),
            silence_ms: default_silence_ms(),
            max_utterance_secs: default_max_utterance(),
            reply_mode: default_live_reply_mode(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
