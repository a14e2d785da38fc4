use audio_endpoint_core::models::error::EndpointError;
use thiserror::Error;

/// Failures inside the virtual device set.
#[derive(Debug, Error)]
pub enum VirtualDeviceError {
    #[error("no virtual device at index {index} ({available} present)")]
    NoSuchDevice { index: usize, available: usize },

    #[error("invalid device format: {0}")]
    InvalidFormat(String),

    #[error("failed to spawn device thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("device thread '{0}' panicked")]
    ThreadPanicked(String),
}

impl From<VirtualDeviceError> for EndpointError {
    fn from(e: VirtualDeviceError) -> Self {
        match e {
            VirtualDeviceError::NoSuchDevice { .. } => EndpointError::DeviceNotAvailable(e.to_string()),
            VirtualDeviceError::InvalidFormat(_) | VirtualDeviceError::Spawn(_) => {
                EndpointError::InitializationFailed(e.to_string())
            }
            VirtualDeviceError::ThreadPanicked(_) => EndpointError::DeviceError(e.to_string()),
        }
    }
}
