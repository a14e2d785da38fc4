use crate::models::frame::{EncodedAudioFrame, EncodedSample};

use super::signal::Signal;

/// Every notification an endpoint emits.
///
/// Shared between the endpoint and its pipelines; the capture signals fire on
/// the capture device's thread.
#[derive(Debug, Default)]
pub struct EndpointSignals {
    /// Legacy raw encoded-sample notification, `(length, bytes)`.
    pub encoded_sample: Signal<EncodedSample>,
    /// One encoded capture buffer with its format and duration.
    pub frame_ready: Signal<EncodedAudioFrame>,
    pub source_error: Signal<String>,
    pub sink_error: Signal<String>,
}

impl EndpointSignals {
    pub fn has_encoded_audio_subscribers(&self) -> bool {
        self.encoded_sample.has_subscribers() || self.frame_ready.has_subscribers()
    }

    pub(crate) fn source_error(&self, message: String) {
        log::warn!("audio source error: {}", message);
        self.source_error.emit(&message);
    }

    pub(crate) fn sink_error(&self, message: String) {
        log::warn!("audio sink error: {}", message);
        self.sink_error.emit(&message);
    }
}
