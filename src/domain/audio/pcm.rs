//! PCM16 编解码
//!
//! 浮点样本 <-> 16 位小端 PCM <-> base64，用于 WebSocket 传输和播放解码

use base64::Engine;
use thiserror::Error;

/// 满量程（归一化除数）
pub const FULL_SCALE: f32 = 32768.0;

/// PCM 编解码错误
#[derive(Debug, Error)]
pub enum PcmError {
    #[error("Invalid base64 audio payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Empty audio payload")]
    Empty,
}

/// 浮点样本转 16 位整数
///
/// 先截断到 [-1, 1]，按 32768 缩放后四舍五入，正向饱和到 `i16::MAX`
pub fn float_to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            let s = if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) };
            (s * FULL_SCALE)
                .round()
                .clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect()
}

/// 16 位整数转归一化浮点样本，范围 [-1, 1)
pub fn pcm16_to_float(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / FULL_SCALE).collect()
}

/// 编码为小端字节序
pub fn pcm16_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// 从小端字节序解码，末尾的奇数字节被忽略
pub fn le_bytes_to_pcm16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// PCM16 -> base64
pub fn encode_base64_pcm16(samples: &[i16]) -> String {
    base64::engine::general_purpose::STANDARD.encode(pcm16_to_le_bytes(samples))
}

/// base64 -> PCM16
pub fn decode_base64_pcm16(data: &str) -> Result<Vec<i16>, PcmError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
    if bytes.len() < 2 {
        return Err(PcmError::Empty);
    }
    Ok(le_bytes_to_pcm16(&bytes))
}

/// 浮点样本直接编码为 base64 PCM16
pub fn encode_base64_float(samples: &[f32]) -> String {
    encode_base64_pcm16(&float_to_pcm16(samples))
}

/// base64 PCM16 直接解码为浮点样本（播放用）
pub fn decode_base64_float(data: &str) -> Result<Vec<f32>, PcmError> {
    decode_base64_pcm16(data).map(|samples| pcm16_to_float(&samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_within_quantization_error() {
        let input: Vec<f32> = (0..2000)
            .map(|i| ((i as f32) * 0.013).sin() * 0.999)
            .chain([1.0, -1.0, 0.0, 0.5, -0.5, 0.123_456])
            .collect();

        let encoded = encode_base64_float(&input);
        let decoded = decode_base64_float(&encoded).unwrap();

        assert_eq!(decoded.len(), input.len());
        for (original, restored) in input.iter().zip(decoded.iter()) {
            assert!(
                (original - restored).abs() <= 1.0 / FULL_SCALE,
                "{} vs {}",
                original,
                restored
            );
        }
    }

    #[test]
    fn test_clamps_out_of_range_samples() {
        let pcm = float_to_pcm16(&[2.0, -3.0, f32::NAN]);
        assert_eq!(pcm, vec![i16::MAX, i16::MIN, 0]);
    }

    #[test]
    fn test_little_endian_layout() {
        let bytes = pcm16_to_le_bytes(&[0x0102, -2]);
        assert_eq!(bytes, vec![0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn test_odd_trailing_byte_is_ignored() {
        let samples = le_bytes_to_pcm16(&[0x00, 0x80, 0x7F]);
        assert_eq!(samples, vec![i16::MIN]);
        assert_eq!(pcm16_to_float(&samples), vec![-1.0]);
    }

    #[test]
    fn test_invalid_base64_is_an_error() {
        assert!(matches!(
            decode_base64_pcm16("not*base64!"),
            Err(PcmError::InvalidBase64(_))
        ));
        assert!(matches!(decode_base64_pcm16(""), Err(PcmError::Empty)));
    }
}
