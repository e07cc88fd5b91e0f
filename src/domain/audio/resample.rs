//! 最近邻重采样
//!
//! 麦克风原生采样率 -> 16 kHz。输出样本 i 取输入样本 round(i × from/to)。
//!
//! 注意：没有抗混叠滤波，下采样时高于新奈奎斯特频率的成分会折叠回可听频段。
//! 这是有损的、非带限的降采样，保留原样。

use thiserror::Error;

/// 上游 API 期望的输入采样率
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResampleError {
    #[error("Sample rate must be greater than 0 (from: {from}, to: {to})")]
    ZeroRate { from: u32, to: u32 },
}

/// 最近邻重采样
pub fn resample_nearest<T: Copy>(
    samples: &[T],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<T>, ResampleError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(ResampleError::ZeroRate {
            from: from_rate,
            to: to_rate,
        });
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (samples.len() as f64 / ratio).floor() as usize;
    let last = samples.len() - 1;

    Ok((0..out_len)
        .map(|i| {
            let index = ((i as f64) * ratio).round() as usize;
            samples[index.min(last)]
        })
        .collect())
}

/// 转换到 16 kHz
pub fn to_target_rate<T: Copy>(samples: &[T], native_rate: u32) -> Result<Vec<T>, ResampleError> {
    resample_nearest(samples, native_rate, TARGET_SAMPLE_RATE)
}
