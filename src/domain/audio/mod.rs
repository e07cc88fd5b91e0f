//! Audio - 音频处理
//!
//! 纯函数：PCM16 编解码、最近邻重采样、WAV 封装、音量估计

pub mod level;
pub mod pcm;
pub mod resample;
pub mod wav;

pub use level::{mean_abs_level, mean_abs_level_pcm16};
pub use pcm::{
    decode_base64_float, decode_base64_pcm16, encode_base64_float, encode_base64_pcm16,
    float_to_pcm16, pcm16_to_float, PcmError,
};
pub use resample::{resample_nearest, to_target_rate, ResampleError, TARGET_SAMPLE_RATE};
pub use wav::{encode_wav_mono16, WAV_MIME_TYPE};

/// 模型音频输出的采样率（Gemini 原生音频为 24 kHz）
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// 模型音频输出的 MIME 类型
pub const PCM16_PLAYBACK_MIME: &str = "audio/pcm;rate=24000";
