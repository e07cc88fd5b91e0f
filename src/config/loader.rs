//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 部署平台变量（GEMINI_API_KEY、HOST、PORT）
//! 2. 环境变量（VOXRELAY_ 前缀）
//! 3. 配置文件（config.toml / config.local.toml）
//! 4. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, ModelProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "VOXRELAY";

/// 加载应用配置
///
/// # 环境变量示例
/// - `VOXRELAY_SERVER__PORT=8080`
/// - `VOXRELAY_MODEL__PROVIDER=fake`
/// - `VOXRELAY_ASSISTANT__REPLY_MODE=audio`
/// - `GEMINI_API_KEY=...`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    build_config(config_path, &platform_overrides()?)
}

/// 读取部署平台约定的环境变量
fn platform_overrides() -> Result<Vec<(&'static str, String)>, ConfigError> {
    let mut overrides = Vec::new();

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            overrides.push(("model.api_key", key));
        }
    }
    if let Ok(host) = std::env::var("HOST") {
        overrides.push(("server.host", host));
    }
    if let Ok(port) = std::env::var("PORT") {
        port.parse::<u16>()
            .map_err(|e| ConfigError::ParseError(format!("Invalid PORT '{}': {}", port, e)))?;
        overrides.push(("server.port", port));
    }

    Ok(overrides)
}

fn build_config(
    config_path: Option<&Path>,
    overrides: &[(&'static str, String)],
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("server.max_upload_size", 10 * 1024 * 1024)?
        .set_default("server.static_files.enabled", true)?
        .set_default("server.static_files.dir", "public")?
        .set_default("model.provider", "gemini")?
        .set_default("model.api_key", "")?
        .set_default("model.base_url", "https://generativelanguage.googleapis.com")?
        .set_default("model.api_version", "v1beta")?
        .set_default("model.text_model", "gemini-1.5-flash-latest")?
        .set_default("model.audio_model", "gemini-2.5-flash-preview-tts")?
        .set_default("model.voice_name", "Kore")?
        .set_default("model.max_output_tokens", 150)?
        .set_default("model.timeout_secs", 30)?
        .set_default("assistant.reply_mode", "text")?
        .set_default("conversation.max_entries", 1000)?
        .set_default("conversation.ttl_secs", 3600)?
        .set_default("conversation.max_turns", 40)?
        .set_default("gc.enabled", true)?
        .set_default("gc.interval_secs", 60)?
        .set_default("live.speech_threshold", 0.02)?
        .set_default("live.silence_ms", 1500)?
        .set_default("live.max_utterance_secs", 30)?
        .set_default("live.reply_mode", "audio")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量
    // 层级分隔符: __ (双下划线)，例如 VOXRELAY_LIVE__SILENCE_MS=1200
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 部署平台变量（最高优先级）
    for (key, value) in overrides {
        builder = builder.set_override(*key, value.as_str())?;
    }

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("Server port cannot be 0"));
    }

    let model = &config.model;
    if model.base_url.trim().is_empty() {
        return Err(invalid("Model base URL cannot be empty"));
    }
    if model.text_model.trim().is_empty() || model.audio_model.trim().is_empty() {
        return Err(invalid("Model names cannot be empty"));
    }
    if model.provider == ModelProvider::Gemini && model.api_key.trim().is_empty() {
        return Err(invalid(
            "Model API key is required (set GEMINI_API_KEY or model.api_key)",
        ));
    }

    let conversation = &config.conversation;
    if conversation.max_entries == 0 {
        return Err(invalid("conversation.max_entries must be greater than 0"));
    }
    if conversation.ttl_secs == 0 {
        return Err(invalid("conversation.ttl_secs must be greater than 0"));
    }
    if conversation.max_turns < 2 {
        return Err(invalid("conversation.max_turns must be at least 2"));
    }

    if config.gc.enabled && config.gc.interval_secs == 0 {
        return Err(invalid("GC interval cannot be 0 when GC is enabled"));
    }

    let threshold = config.live.speech_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(invalid("live.speech_threshold must be in (0, 1]"));
    }
    if config.live.max_utterance_secs == 0 {
        return Err(invalid("live.max_utterance_secs must be greater than 0"));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.server.static_files.enabled {
        tracing::info!("Static Files: {:?}", config.server.static_files.dir);
    }
    tracing::info!("Model Provider: {}", config.model.provider.as_str());
    tracing::info!("Model Base URL: {}", config.model.base_url);
    tracing::info!(
        "Models: text={} audio={}",
        config.model.text_model,
        config.model.audio_model
    );
    tracing::info!("Model Timeout: {}s", config.model.timeout_secs);
    tracing::info!("Reply Mode: {}", config.assistant.reply_mode.as_str());
    tracing::info!(
        "Conversations: max_entries={} ttl={}s max_turns={}",
        config.conversation.max_entries,
        config.conversation.ttl_secs,
        config.conversation.max_turns
    );
    tracing::info!("GC Enabled: {}", config.gc.enabled);
    if config.gc.enabled {
        tracing::info!("GC Interval: {}s", config.gc.interval_secs);
    }
    tracing::info!(
        "Live: reply_mode={} silence={}ms",
        config.live.reply_mode.as_str(),
        config.live.silence_ms
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
