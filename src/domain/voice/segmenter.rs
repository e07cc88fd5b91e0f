//! 语音分段
//!
//! 服务端把持续到达的 PCM16 块切成一句一句的话：
//! 说话开始前的安静帧丢弃；开始后全部缓存；连续静音达到阈值或达到最大时长即结束一句。
//! 时间按样本数计算。

use crate::domain::audio::mean_abs_level_pcm16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmenterConfig {
    pub sample_rate: u32,
    pub speech_threshold: f32,
    pub silence_ms: u64,
    pub max_utterance_secs: u64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            speech_threshold: super::activity::SPEECH_THRESHOLD,
            silence_ms: 1500,
            max_utterance_secs: 30,
        }
    }
}

impl SegmenterConfig {
    fn silence_samples(&self) -> usize {
        (self.sample_rate as u64 * self.silence_ms / 1000) as usize
    }

    fn max_samples(&self) -> usize {
        (self.sample_rate as u64 * self.max_utterance_secs) as usize
    }
}

/// 分段器
#[derive(Debug, Clone)]
pub struct SpeechSegmenter {
    config: SegmenterConfig,
    buffer: Vec<i16>,
    in_speech: bool,
    trailing_silence: usize,
}

impl SpeechSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            in_speech: false,
            trailing_silence: 0,
        }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// 输入一帧，如果一句话结束则返回整句样本
    pub fn push(&mut self, frame: &[i16]) -> Option<Vec<i16>> {
        if frame.is_empty() {
            return None;
        }

        let loud = mean_abs_level_pcm16(frame) > self.config.speech_threshold;

        if !self.in_speech {
            if !loud {
                return None;
            }
            self.in_speech = true;
        }

        self.buffer.extend_from_slice(frame);
        if loud {
            self.trailing_silence = 0;
        } else {
            self.trailing_silence += frame.len();
        }

        if self.trailing_silence >= self.config.silence_samples()
            || self.buffer.len() >= self.config.max_samples()
        {
            return self.flush();
        }

        None
    }

    /// 立即结束当前这句（没有说话内容则返回 None）
    pub fn flush(&mut self) -> Option<Vec<i16>> {
        if !self.in_speech {
            return None;
        }
        let utterance = std::mem::take(&mut self.buffer);
        self.in_speech = false;
        self.trailing_silence = 0;
        Some(utterance)
    }

    /// 丢弃已缓存的音频
    pub fn clear(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        self.in_speech = false;
        self.trailing_silence = 0;
        dropped
    }

    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    pub fn in_speech(&self) -> bool {
        self.in_speech
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SegmenterConfig {
        SegmenterConfig {
            sample_rate: 1000,
            speech_threshold: 0.02,
            silence_ms: 300,
            max_utterance_secs: 2,
        }
    }

    fn loud(len: usize) -> Vec<i16> {
        vec![8000; len]
    }

    fn quiet(len: usize) -> Vec<i16> {
        vec![0; len]
    }

    #[test]
    fn test_leading_silence_is_dropped() {
        let mut segmenter = SpeechSegmenter::new(config());
        assert_eq!(segmenter.push(&quiet(500)), None);
        assert_eq!(segmenter.buffered_samples(), 0);
        assert!(!segmenter.in_speech());
    }

    #[test]
    fn test_utterance_ends_after_silence() {
        let mut segmenter = SpeechSegmenter::new(config());
        assert_eq!(segmenter.push(&loud(100)), None);
        assert_eq!(segmenter.push(&quiet(200)), None);
        let utterance = segmenter.push(&quiet(100)).unwrap();

        assert_eq!(utterance.len(), 400);
        assert_eq!(segmenter.buffered_samples(), 0);
        assert!(!segmenter.in_speech());
    }

    #[test]
    fn test_speech_resets_silence_counter() {
        let mut segmenter = SpeechSegmenter::new(config());
        segmenter.push(&loud(100));
        segmenter.push(&quiet(200));
        segmenter.push(&loud(100));
        assert_eq!(segmenter.push(&quiet(200)), None);
        assert_eq!(segmenter.buffered_samples(), 600);
    }

    #[test]
    fn test_max_duration_forces_cut() {
        let mut segmenter = SpeechSegmenter::new(config());
        assert_eq!(segmenter.push(&loud(1500)), None);
        let utterance = segmenter.push(&loud(600)).unwrap();
        assert_eq!(utterance.len(), 2100);
    }

    #[test]
    fn test_flush_and_clear() {
        let mut segmenter = SpeechSegmenter::new(config());
        assert_eq!(segmenter.flush(), None);

        segmenter.push(&loud(50));
        assert_eq!(segmenter.flush().map(|u| u.len()), Some(50));

        segmenter.push(&loud(50));
        assert_eq!(segmenter.clear(), 50);
        assert_eq!(segmenter.flush(), None);
    }
}
