use serde::Deserialize;

use super::audio_models::DeviceIndex;
use super::error::EndpointError;

/// Configuration for an audio endpoint.
///
/// Loadable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointConfiguration {
    /// Skip the capture pipeline entirely.
    pub disable_source: bool,

    /// Skip the playback pipeline entirely.
    pub disable_sink: bool,

    /// Capture device, or `None` for the system default.
    pub capture_device_index: DeviceIndex,

    /// Render device, or `None` for the system default.
    pub render_device_index: DeviceIndex,

    /// Capture buffering interval (default: 20 ms, one codec frame).
    pub capture_buffer_millis: u32,

    /// Number of capture buffers queued at the device (default: 2).
    pub capture_buffer_count: u32,

    /// Playback buffer length in milliseconds of audio (default: 5000).
    pub playback_buffer_millis: u32,

    /// Rate devices open at before a format is negotiated (default: 8000).
    pub default_sample_rate: u32,

    /// Channels devices open with before a format is negotiated (default: 1).
    pub default_channels: u16,
}

impl EndpointConfiguration {
    pub fn from_json_str(json: &str) -> Result<Self, EndpointError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EndpointError::ConfigurationFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EndpointError> {
        if self.default_sample_rate == 0 {
            return Err(EndpointError::ConfigurationFailed(
                "default sample rate must be positive".into(),
            ));
        }
        if ![1, 2].contains(&self.default_channels) {
            return Err(EndpointError::ConfigurationFailed(format!(
                "unsupported channel count: {}",
                self.default_channels
            )));
        }
        if self.capture_buffer_millis == 0 || self.capture_buffer_count == 0 {
            return Err(EndpointError::ConfigurationFailed(
                "capture buffering must be non-zero".into(),
            ));
        }
        if self.playback_buffer_millis == 0 {
            return Err(EndpointError::ConfigurationFailed(
                "playback buffer must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EndpointConfiguration {
    fn default() -> Self {
        Self {
            disable_source: false,
            disable_sink: false,
            capture_device_index: None,
            render_device_index: None,
            capture_buffer_millis: 20,
            capture_buffer_count: 2,
            playback_buffer_millis: 5000,
            default_sample_rate: 8000,
            default_channels: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(EndpointConfiguration::default().validate().is_ok());
    }

    #[test]
    fn json_fills_missing_fields() {
        let config =
            EndpointConfiguration::from_json_str(r#"{ "disable_sink": true, "capture_device_index": 1 }"#)
                .unwrap();
        assert!(config.disable_sink);
        assert!(!config.disable_source);
        assert_eq!(config.capture_device_index, Some(1));
        assert_eq!(config.render_device_index, None);
        assert_eq!(config.capture_buffer_millis, 20);
        assert_eq!(config.default_sample_rate, 8000);
    }

    #[test]
    fn rejects_bad_channels() {
        let config = EndpointConfiguration {
            default_channels: 6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EndpointError::ConfigurationFailed(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(EndpointConfiguration::from_json_str("{ not json").is_err());
        assert!(EndpointConfiguration::from_json_str(r#"{ "default_sample_rate": 0 }"#).is_err());
    }
}
