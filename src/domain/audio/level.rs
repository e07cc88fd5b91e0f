//! 音量估计

/// 帧能量：平均绝对幅值
pub fn mean_abs_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
}

/// PCM16 帧能量，归一化到 [0, 1]
pub fn mean_abs_level_pcm16(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64).abs()).sum();
    (sum / samples.len() as f64 / super::pcm::FULL_SCALE as f64) as f32
}
