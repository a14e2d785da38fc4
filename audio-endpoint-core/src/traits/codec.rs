use crate::models::audio_models::AudioFormat;
use crate::models::error::EndpointError;

/// Encoder/decoder capability used by both pipelines.
///
/// Called from device threads as well as the caller's thread, so
/// implementations take `&self` and synchronise internally if they keep
/// per-stream state.
pub trait AudioCodec: Send + Sync {
    /// Formats this codec can produce, in preference order.
    fn supported_formats(&self) -> Vec<AudioFormat>;

    /// Encode signed 16-bit PCM into `format`.
    fn encode(&self, pcm: &[i16], format: &AudioFormat) -> Result<Vec<u8>, EndpointError>;

    /// Decode a payload in `format` into signed 16-bit PCM.
    fn decode(&self, encoded: &[u8], format: &AudioFormat) -> Result<Vec<i16>, EndpointError>;
}
