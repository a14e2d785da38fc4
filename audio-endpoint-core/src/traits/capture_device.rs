use std::sync::Arc;

use crate::models::audio_models::DeviceFormat;
use crate::models::error::EndpointError;

/// Handler invoked when a capture buffer is ready.
///
/// Parameters:
/// - `raw`: The device's buffer. May be longer than the valid data.
/// - `byte_count`: Number of valid bytes at the start of `raw`.
///
/// Fires on the device's own thread; keep processing bounded.
pub type DataAvailableCallback = Arc<dyn Fn(&[u8], usize) + Send + Sync + 'static>;

/// Parameters for opening a capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDeviceParams {
    /// Always 16-bit; rate and channel count follow the negotiated format.
    pub format: DeviceFormat,
    /// Length of each device buffer in milliseconds.
    pub buffer_millis: u32,
    /// Number of buffers queued at the device.
    pub buffer_count: u32,
}

/// Source of capture devices (a sound card driver, a virtual device set).
pub trait CaptureDeviceHost: Send + Sync {
    /// Number of capture devices currently present.
    fn device_count(&self) -> usize;

    /// Open device `index` (`None` = system default) with `params`.
    fn open(
        &self,
        index: Option<usize>,
        params: &CaptureDeviceParams,
    ) -> Result<Box<dyn CaptureDevice>, EndpointError>;
}

/// An opened microphone-like device.
pub trait CaptureDevice: Send {
    /// Subscribe `Some(handler)` or unsubscribe with `None`.
    ///
    /// At most one handler is attached; a device must not call a handler after
    /// it has been replaced or removed.
    fn set_data_handler(&mut self, handler: Option<DataAvailableCallback>);

    /// Begin delivering buffers to the handler.
    fn start(&mut self) -> Result<(), EndpointError>;

    /// Stop delivering buffers.
    fn stop(&mut self) -> Result<(), EndpointError>;

    /// The format the device was opened with.
    fn format(&self) -> DeviceFormat;
}
