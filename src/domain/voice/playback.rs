//! 播放队列
//!
//! 有序、无损、一次只播放一个缓冲区：上一个播放完成后才开始下一个。
//! 不是抖动缓冲。

use std::collections::VecDeque;

use crate::domain::audio::{decode_base64_float, PLAYBACK_SAMPLE_RATE};

/// 一段待播放的音频
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl PlaybackBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }
}

/// 播放队列
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    pending: VecDeque<PlaybackBuffer>,
    current: Option<PlaybackBuffer>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, buffer: PlaybackBuffer) {
        self.pending.push_back(buffer);
    }

    /// 解码 base64 PCM16 后入队
    ///
    /// 解码失败只记录日志并跳过该块，返回是否入队成功
    pub fn enqueue_inline(&mut self, mime_type: &str, data: &str) -> bool {
        match decode_base64_float(data) {
            Ok(samples) => {
                let sample_rate = sample_rate_from_mime(mime_type).unwrap_or(PLAYBACK_SAMPLE_RATE);
                self.enqueue(PlaybackBuffer::new(samples, sample_rate));
                true
            }
            Err(e) => {
                tracing::warn!(
                    mime_type = %mime_type,
                    error = %e,
                    "Playback decode error, chunk skipped"
                );
                false
            }
        }
    }

    /// 空闲时取出下一个缓冲区开始播放；正在播放时返回 None
    pub fn start_next(&mut self) -> Option<PlaybackBuffer> {
        if self.current.is_some() {
            return None;
        }
        let next = self.pending.pop_front()?;
        self.current = Some(next.clone());
        Some(next)
    }

    /// 当前缓冲区播放完成
    pub fn finish_current(&mut self) -> Option<PlaybackBuffer> {
        self.current.take()
    }

    /// 打断：停止当前播放并清空队列，返回丢弃的缓冲区数量
    pub fn interrupt(&mut self) -> usize {
        let dropped = self.pending.len() + usize::from(self.current.is_some());
        self.pending.clear();
        self.current = None;
        dropped
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// 待播放数量（不含正在播放的）
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.current.is_none()
    }
}

/// 从 `audio/pcm;rate=24000` 或 `audio/L16;codec=pcm;rate=24000` 中取出采样率
pub fn sample_rate_from_mime(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("rate"))
        .and_then(|(_, value)| value.trim().parse().ok())
}
