use std::sync::Arc;

use crate::models::audio_models::DeviceFormat;
use crate::models::error::EndpointError;
use crate::processing::sample_buffer::BoundedSampleBuffer;

/// Source of render devices.
pub trait RenderDeviceHost: Send + Sync {
    /// Number of render devices currently present.
    fn device_count(&self) -> usize;

    /// Open device `index` (`None` = system default), draining `buffer`.
    ///
    /// The device reads PCM in `format` from `buffer` on its own output
    /// thread while playing, and renders silence when the buffer runs dry.
    fn open(
        &self,
        index: Option<usize>,
        format: DeviceFormat,
        buffer: Arc<BoundedSampleBuffer>,
    ) -> Result<Box<dyn RenderDevice>, EndpointError>;
}

/// An opened speaker-like device.
pub trait RenderDevice: Send {
    /// Start or resume draining the buffer.
    fn play(&mut self) -> Result<(), EndpointError>;

    /// Stop draining; buffered audio is kept.
    fn pause(&mut self) -> Result<(), EndpointError>;

    /// Stop for good and release the device.
    fn stop(&mut self) -> Result<(), EndpointError>;
}
