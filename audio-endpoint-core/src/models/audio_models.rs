use serde::{Deserialize, Serialize};

/// Bit depth every device is opened with.
pub const DEVICE_BITS_PER_SAMPLE: u16 = 16;

/// Codec identity of a negotiated audio format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioCodecKind {
    /// G.711 µ-law.
    Pcmu,
    /// G.711 A-law.
    Pcma,
    /// Linear 16-bit PCM, network byte order on the wire.
    L16,
    G722,
    Opus,
    #[default]
    Unknown,
}

impl AudioCodecKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pcmu => "PCMU",
            Self::Pcma => "PCMA",
            Self::L16 => "L16",
            Self::G722 => "G722",
            Self::Opus => "OPUS",
            Self::Unknown => "unknown",
        }
    }
}

/// A negotiated codec format.
///
/// `AudioFormat::default()` is the empty format: no codec and a zero clock
/// rate. Nothing can be encoded or decoded with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AudioFormat {
    pub codec: AudioCodecKind,
    /// RTP payload type the format is advertised under.
    pub format_id: u8,
    /// Native sample rate of the codec in Hz.
    pub clock_rate: u32,
    pub channel_count: u16,
    /// Optional fmtp-style parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

impl AudioFormat {
    pub fn new(codec: AudioCodecKind, format_id: u8, clock_rate: u32, channel_count: u16) -> Self {
        Self {
            codec,
            format_id,
            clock_rate,
            channel_count,
            parameters: None,
        }
    }

    pub fn pcmu() -> Self {
        Self::new(AudioCodecKind::Pcmu, 0, 8000, 1)
    }

    pub fn pcma() -> Self {
        Self::new(AudioCodecKind::Pcma, 8, 8000, 1)
    }

    /// Linear PCM at `clock_rate`, mono, on a dynamic payload id.
    pub fn l16(format_id: u8, clock_rate: u32) -> Self {
        Self::new(AudioCodecKind::L16, format_id, clock_rate, 1)
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clock_rate == 0
    }

    pub fn name(&self) -> &'static str {
        self.codec.name()
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{} (pt {})",
            self.name(),
            self.clock_rate,
            self.channel_count,
            self.format_id
        )
    }
}

/// The physical format a device is opened with. Always 16-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl DeviceFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Device format tracking a codec format's clock rate and channel count.
    pub fn for_audio_format(format: &AudioFormat) -> Self {
        Self::new(format.clock_rate, format.channel_count)
    }

    pub fn bits_per_sample(&self) -> u16 {
        DEVICE_BITS_PER_SAMPLE
    }

    /// Bytes in one frame (one sample for every channel).
    pub fn block_align(&self) -> usize {
        self.channels as usize * DEVICE_BITS_PER_SAMPLE as usize / 8
    }

    pub fn bytes_per_second(&self) -> usize {
        self.sample_rate as usize * self.block_align()
    }

    /// Whole frames worth of bytes covering `millis` of audio.
    pub fn bytes_for_millis(&self, millis: u32) -> usize {
        let frames = self.sample_rate as u64 * millis as u64 / 1000;
        frames as usize * self.block_align()
    }
}

impl std::fmt::Display for DeviceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Hz, {}-bit, {} ch",
            self.sample_rate, DEVICE_BITS_PER_SAMPLE, self.channels
        )
    }
}

/// Index of a physical device as handed to a device host.
///
/// `None` in configuration means the system default device.
pub type DeviceIndex = Option<usize>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_empty() {
        assert!(AudioFormat::default().is_empty());
        assert!(!AudioFormat::pcmu().is_empty());
    }

    #[test]
    fn device_format_sizes() {
        let fmt = DeviceFormat::new(8000, 1);
        assert_eq!(fmt.block_align(), 2);
        assert_eq!(fmt.bytes_per_second(), 16000);
        assert_eq!(fmt.bytes_for_millis(20), 320);

        let stereo = DeviceFormat::new(48000, 2);
        assert_eq!(stereo.bytes_for_millis(5000), 48000 * 5 * 4);
    }

    #[test]
    fn device_format_tracks_codec_format() {
        let fmt = DeviceFormat::for_audio_format(&AudioFormat::l16(118, 16000));
        assert_eq!(fmt, DeviceFormat::new(16000, 1));
        assert_eq!(fmt.bits_per_sample(), 16);
    }

    #[test]
    fn format_serializes_codec_uppercase() {
        let json = serde_json::to_string(&AudioFormat::pcma()).unwrap();
        assert!(json.contains("\"codec\":\"PCMA\""));
        assert!(!json.contains("parameters"));

        let parsed: AudioFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, AudioFormat::pcma());
    }
}
