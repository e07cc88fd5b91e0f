//! VoxRelay - 语音对话中继
//!
//! 启动流程: 配置 -> 日志 -> 模型客户端 -> 会话存储 + GC Worker -> HTTP 服务

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use voxrelay::application::{ChatModelPort, LiveSessionConfig};
use voxrelay::config::{load_config, print_config, AppConfig, ModelProvider};
use voxrelay::domain::audio::TARGET_SAMPLE_RATE;
use voxrelay::domain::voice::SegmenterConfig;
use voxrelay::domain::SystemPrompt;
use voxrelay::infrastructure::adapters::{
    FakeChatClient, GeminiChatClient, GeminiChatClientConfig,
};
use voxrelay::infrastructure::http::{AppState, HttpServer, RelaySettings, ServerConfig};
use voxrelay::infrastructure::memory::{InMemoryConversationStore, StoreConfig};
use voxrelay::infrastructure::worker::{ConversationGcWorker, GcWorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 本地开发时从 .env 读取 GEMINI_API_KEY 等变量
    dotenv::dotenv().ok();

    // 加载配置（优先级：平台变量 > 环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("VoxRelay - 语音对话中继");
    print_config(&config);

    // 创建模型客户端
    let chat_model: Arc<dyn ChatModelPort> = match config.model.provider {
        ModelProvider::Gemini => {
            let model_config = GeminiChatClientConfig {
                api_key: config.model.api_key.clone(),
                base_url: config.model.base_url.clone(),
                api_version: config.model.api_version.clone(),
                text_model: config.model.text_model.clone(),
                audio_model: config.model.audio_model.clone(),
                voice_name: config.model.voice_name.clone(),
                max_output_tokens: config.model.max_output_tokens,
                timeout_secs: config.model.timeout_secs,
            };
            Arc::new(GeminiChatClient::new(model_config)?)
        }
        // 固定回复，不访问网络
        ModelProvider::Fake => Arc::new(FakeChatClient::with_defaults()),
    };
    if !chat_model.health_check().await {
        tracing::warn!(
            provider = config.model.provider.as_str(),
            "Chat model is not reachable, requests will fail until it recovers"
        );
    }

    // 创建会话存储
    let store = Arc::new(InMemoryConversationStore::new(StoreConfig {
        max_entries: config.conversation.max_entries,
        ttl: Duration::from_secs(config.conversation.ttl_secs),
        max_turns: config.conversation.max_turns,
    }));

    // 启动 GC Worker
    let shutdown = CancellationToken::new();
    if config.gc.enabled {
        let worker = ConversationGcWorker::new(
            GcWorkerConfig {
                interval: Duration::from_secs(config.gc.interval_secs),
            },
            store.clone(),
            shutdown.clone(),
        );
        tokio::spawn(worker.run());
    }

    // 创建 HTTP 服务器
    let settings = RelaySettings {
        prompt: SystemPrompt::new(
            config.assistant.system_instructions.clone(),
            config.assistant.acknowledgement.clone(),
        ),
        reply_mode: config.assistant.reply_mode,
        live: LiveSessionConfig {
            segmenter: SegmenterConfig {
                sample_rate: TARGET_SAMPLE_RATE,
                speech_threshold: config.live.speech_threshold,
                silence_ms: config.live.silence_ms,
                max_utterance_secs: config.live.max_utterance_secs,
            },
            modality: config.live.reply_mode,
        },
    };
    let state = AppState::new(store, chat_model, settings);

    let mut server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_upload_size(config.server.max_upload_size as usize);
    if config.server.static_files.enabled {
        server_config = server_config.with_static_dir(config.server.static_files.dir.clone());
    }

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    shutdown.cancel();
    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},voxrelay={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
