use std::net::SocketAddr;

use super::audio_models::AudioFormat;

/// One encoded capture buffer, ready for a transport to packetise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudioFrame {
    /// Placeholder; the transport assigns the real media timestamp.
    pub timestamp: u32,
    pub format: AudioFormat,
    pub duration_ms: u32,
    pub payload: Vec<u8>,
}

impl EncodedAudioFrame {
    pub fn new(format: AudioFormat, duration_ms: u32, payload: Vec<u8>) -> Self {
        Self {
            timestamp: 0,
            format,
            duration_ms,
            payload,
        }
    }
}

/// Payload of the legacy encoded-sample signal: `(length, bytes)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSample {
    pub length: u32,
    pub bytes: Vec<u8>,
}

impl EncodedSample {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            length: bytes.len() as u32,
            bytes,
        }
    }
}

/// Inbound audio as handed over by an RTP transport on the legacy path.
///
/// Decoded with the sink's selected format, not a per-packet one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRtpAudio {
    pub remote: SocketAddr,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub payload_id: u8,
    pub marker: bool,
    pub payload: Vec<u8>,
}

/// Duration in whole milliseconds of `total_samples` interleaved PCM samples.
///
/// `round(total_samples / channels / clock_rate * 1000)`. Returns 0 for a
/// zero clock rate or channel count.
pub fn frame_duration_ms(total_samples: usize, clock_rate: u32, channel_count: u16) -> u32 {
    if clock_rate == 0 || channel_count == 0 {
        return 0;
    }
    let frames_per_channel = total_samples as f64 / channel_count as f64;
    (frames_per_channel / clock_rate as f64 * 1000.0).round() as u32
}
