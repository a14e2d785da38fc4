use crate::models::audio_models::{AudioCodecKind, AudioFormat};
use crate::models::error::EndpointError;
use crate::traits::codec::AudioCodec;

use super::g711;

/// Dynamic payload ids the built-in L16 formats are advertised under.
pub const L16_8K_FORMAT_ID: u8 = 118;
pub const L16_16K_FORMAT_ID: u8 = 119;

/// Built-in codec covering G.711 (PCMU, PCMA) and linear L16.
///
/// Stateless; safe to share between the capture thread and the decode path.
#[derive(Debug, Clone)]
pub struct StandardAudioCodec {
    formats: Vec<AudioFormat>,
}

impl StandardAudioCodec {
    /// PCMU, PCMA, L16/8000 and L16/16000, in that order of preference.
    pub fn new() -> Self {
        Self {
            formats: vec![
                AudioFormat::pcmu(),
                AudioFormat::pcma(),
                AudioFormat::l16(L16_8K_FORMAT_ID, 8000),
                AudioFormat::l16(L16_16K_FORMAT_ID, 16000),
            ],
        }
    }

    /// Advertise only `formats`.
    ///
    /// Fails if a format uses a codec this implementation cannot process.
    pub fn with_formats(formats: Vec<AudioFormat>) -> Result<Self, EndpointError> {
        if let Some(unsupported) = formats.iter().find(|f| !Self::handles(f.codec)) {
            return Err(EndpointError::UnsupportedFormat(unsupported.to_string()));
        }
        Ok(Self { formats })
    }

    fn handles(codec: AudioCodecKind) -> bool {
        matches!(
            codec,
            AudioCodecKind::Pcmu | AudioCodecKind::Pcma | AudioCodecKind::L16
        )
    }
}

impl Default for StandardAudioCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCodec for StandardAudioCodec {
    fn supported_formats(&self) -> Vec<AudioFormat> {
        self.formats.clone()
    }

    fn encode(&self, pcm: &[i16], format: &AudioFormat) -> Result<Vec<u8>, EndpointError> {
        match format.codec {
            AudioCodecKind::Pcmu => Ok(g711::encode_ulaw(pcm)),
            AudioCodecKind::Pcma => Ok(g711::encode_alaw(pcm)),
            // L16 travels in network byte order.
            AudioCodecKind::L16 => Ok(pcm.iter().flat_map(|s| s.to_be_bytes()).collect()),
            _ => Err(EndpointError::EncodingFailed(format!(
                "no encoder for {}",
                format
            ))),
        }
    }

    fn decode(&self, encoded: &[u8], format: &AudioFormat) -> Result<Vec<i16>, EndpointError> {
        match format.codec {
            AudioCodecKind::Pcmu => Ok(g711::decode_ulaw(encoded)),
            AudioCodecKind::Pcma => Ok(g711::decode_alaw(encoded)),
            AudioCodecKind::L16 => {
                if encoded.len() % 2 != 0 {
                    return Err(EndpointError::DecodingFailed(format!(
                        "odd L16 payload length {}",
                        encoded.len()
                    )));
                }
                Ok(encoded
                    .chunks_exact(2)
                    .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
                    .collect())
            }
            _ => Err(EndpointError::DecodingFailed(format!(
                "no decoder for {}",
                format
            ))),
        }
    }
}
