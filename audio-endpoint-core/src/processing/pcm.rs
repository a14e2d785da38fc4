//! Signed 16-bit PCM <-> little-endian byte conversion.
//!
//! Devices deliver and consume little-endian bytes regardless of the host
//! byte order, so every conversion here is explicit.

/// Reinterpret little-endian bytes as 16-bit samples.
///
/// A trailing odd byte is ignored.
pub fn le_bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Serialize 16-bit samples as little-endian bytes.
///
/// Output length = `samples.len() * 2`.
pub fn samples_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        data.extend_from_slice(&sample.to_le_bytes());
    }
    data
}

/// Convert f32 samples `[-1.0, 1.0]` to 16-bit PCM, clamping out-of-range values.
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}
