//! 语音活动检测
//!
//! 固定能量阈值 + 静音计时器，没有其它去抖

use std::time::{Duration, Instant};

/// 视为说话的最低音量
pub const SPEECH_THRESHOLD: f32 = 0.02;
/// 播放期间视为打断的音量（更高，避免扬声器回授误触发）
pub const INTERRUPTION_THRESHOLD: f32 = 0.1;
/// 最后一次有声之后多久视为说完
pub const SILENCE_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityConfig {
    pub speech_threshold: f32,
    pub interruption_threshold: f32,
    pub silence_timeout: Duration,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            speech_threshold: SPEECH_THRESHOLD,
            interruption_threshold: INTERRUPTION_THRESHOLD,
            silence_timeout: SILENCE_TIMEOUT,
        }
    }
}

/// 单帧检测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// 低于阈值，计时器未到
    Quiet,
    /// 检测到说话，静音计时器重新开始
    Speech,
    /// 播放期间检测到说话
    BargeIn,
    /// 说话后静音超过超时时间（每段只报告一次）
    SilenceTimeout,
}

/// 活动检测器
#[derive(Debug, Clone)]
pub struct ActivityDetector {
    config: ActivityConfig,
    last_sound: Option<Instant>,
}

impl ActivityDetector {
    pub fn new(config: ActivityConfig) -> Self {
        Self {
            config,
            last_sound: None,
        }
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }

    /// 输入一帧音量
    ///
    /// `speaking` 为真时使用打断阈值
    pub fn observe(&mut self, level: f32, speaking: bool, now: Instant) -> Activity {
        let threshold = if speaking {
            self.config.interruption_threshold
        } else {
            self.config.speech_threshold
        };

        if level > threshold {
            if speaking {
                // 打断后由新的说话重新计时
                self.last_sound = None;
                return Activity::BargeIn;
            }
            self.last_sound = Some(now);
            return Activity::Speech;
        }

        match self.last_sound {
            Some(last) if now.saturating_duration_since(last) >= self.config.silence_timeout => {
                self.last_sound = None;
                Activity::SilenceTimeout
            }
            _ => Activity::Quiet,
        }
    }

    pub fn reset(&mut self) {
        self.last_sound = None;
    }
}

impl Default for ActivityDetector {
    fn default() -> Self {
        Self::new(ActivityConfig::default())
    }
}
