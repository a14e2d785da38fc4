use thiserror::Error;

/// Errors that can occur inside the audio endpoint.
///
/// Device and initialisation failures are normally swallowed at the pipeline
/// boundary and surfaced through the error signals; the variants still travel
/// as values between the capability traits and the pipelines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    #[error("device error: {0}")]
    DeviceError(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("decoding failed: {0}")]
    DecodingFailed(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_detail() {
        let err = EndpointError::DeviceNotAvailable("index 3".into());
        assert_eq!(err.to_string(), "device not available: index 3");

        let err = EndpointError::Unsupported("external raw samples".into());
        assert_eq!(err.to_string(), "unsupported operation: external raw samples");
    }
}
