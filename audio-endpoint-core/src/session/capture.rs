use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioFormat, DeviceFormat, DeviceIndex};
use crate::models::diagnostics::DiagnosticsCounters;
use crate::models::frame::{frame_duration_ms, EncodedAudioFrame, EncodedSample};
use crate::models::state::PipelineState;
use crate::processing::pcm;
use crate::traits::capture_device::{
    CaptureDevice, CaptureDeviceHost, CaptureDeviceParams, DataAvailableCallback,
};
use crate::traits::codec::AudioCodec;

use super::signals::EndpointSignals;

/// Static settings a capture pipeline opens devices with.
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub device_index: DeviceIndex,
    pub buffer_millis: u32,
    pub buffer_count: u32,
}

/// State the data-available handler reads on the device thread.
struct EncodeContext {
    codec: Arc<dyn AudioCodec>,
    /// Format captured buffers are encoded with; swapped under the lock.
    format: Mutex<Option<AudioFormat>>,
    signals: Arc<EndpointSignals>,
    counters: Arc<DiagnosticsCounters>,
}

impl EncodeContext {
    fn on_data_available(&self, raw: &[u8], byte_count: usize) {
        DiagnosticsCounters::bump(&self.counters.capture_callbacks);

        let Some(format) = self.format.lock().clone() else {
            log::debug!("capture buffer dropped, no source format selected");
            return;
        };

        let valid = &raw[..byte_count.min(raw.len())];
        let samples = pcm::le_bytes_to_samples(valid);

        let mut encoded = match self.codec.encode(&samples, &format) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.signals
                    .source_error(format!("failed to encode capture buffer: {}", e));
                return;
            }
        };

        DiagnosticsCounters::bump(&self.counters.encoded_frames);
        DiagnosticsCounters::add(&self.counters.encoded_bytes, encoded.len());

        let wants_frame = self.signals.frame_ready.has_subscribers();
        if self.signals.encoded_sample.has_subscribers() {
            let bytes = if wants_frame {
                encoded.clone()
            } else {
                std::mem::take(&mut encoded)
            };
            self.signals.encoded_sample.emit(&EncodedSample::new(bytes));
        }

        if wants_frame {
            let duration_ms =
                frame_duration_ms(samples.len(), format.clock_rate, format.channel_count);
            let frame = EncodedAudioFrame::new(format, duration_ms, encoded);
            self.signals.frame_ready.emit(&frame);
        }
    }
}

/// What callers may observe about a capture pipeline.
///
/// Kept apart from the device slot and never locked across a device call or
/// a signal, so state queries never wait on a device thread.
#[derive(Debug, Clone, Copy)]
struct CaptureStatus {
    state: PipelineState,
    /// Format the current device was opened with (or the startup default);
    /// rate changes are detected against it.
    device_format: DeviceFormat,
    has_device: bool,
}

type DeviceSlot = Option<Box<dyn CaptureDevice>>;

/// Microphone → encoder half of an endpoint.
///
/// Device replacement and format swaps happen with the device slot locked;
/// the data-available handler only touches [`EncodeContext`], so it sees
/// either the whole old configuration or the whole new one. Error signals
/// are emitted after the slot is released.
///
/// Lock order: device slot, then status or encoding format. Handlers must not
/// call lifecycle methods from the device thread, since stopping a device
/// joins that thread while the slot is held.
pub struct CapturePipeline {
    host: Arc<dyn CaptureDeviceHost>,
    settings: CaptureSettings,
    device: Mutex<DeviceSlot>,
    status: Mutex<CaptureStatus>,
    context: Arc<EncodeContext>,
}

impl CapturePipeline {
    pub(crate) fn new(
        host: Arc<dyn CaptureDeviceHost>,
        settings: CaptureSettings,
        codec: Arc<dyn AudioCodec>,
        initial_format: DeviceFormat,
        selected: Option<AudioFormat>,
        signals: Arc<EndpointSignals>,
        counters: Arc<DiagnosticsCounters>,
    ) -> Self {
        Self {
            host,
            settings,
            device: Mutex::new(None),
            status: Mutex::new(CaptureStatus {
                state: PipelineState::default(),
                device_format: initial_format,
                has_device: false,
            }),
            context: Arc::new(EncodeContext {
                codec,
                format: Mutex::new(selected),
                signals,
                counters,
            }),
        }
    }

    /// Open the capture device at `format`, replacing any existing one.
    ///
    /// Never fails to the caller. Missing devices and open failures go out on
    /// the source-error signal; a missing device leaves the current device in
    /// place. Returns `true` if a device was opened.
    pub fn initialize(&self, format: DeviceFormat) -> bool {
        let mut errors = Vec::new();
        let opened = {
            let mut slot = self.device.lock();
            self.initialize_locked(&mut slot, format, None, &mut errors)
        };
        self.report(errors);
        opened
    }

    fn check_available(&self) -> Result<(), String> {
        let available = self.host.device_count();
        if available == 0 {
            return Err("No audio capture devices are available.".into());
        }
        match self.settings.device_index {
            Some(index) if index >= available => Err(format!(
                "The requested audio input device index {} exceeds the maximum index of {}.",
                index,
                available - 1
            )),
            _ => Ok(()),
        }
    }

    /// Replace the device in `slot`. `encode_format`, if given, becomes the
    /// encoding format once the old device is released and before the new one
    /// can deliver anything.
    fn initialize_locked(
        &self,
        slot: &mut DeviceSlot,
        format: DeviceFormat,
        encode_format: Option<&AudioFormat>,
        errors: &mut Vec<String>,
    ) -> bool {
        if let Err(message) = self.check_available() {
            errors.push(message);
            return false;
        }

        // Release the old device before a new one exists, so its handler can
        // never fire alongside the replacement's.
        if let Some(mut old) = slot.take() {
            self.status.lock().has_device = false;
            old.set_data_handler(None);
            if let Err(e) = old.stop() {
                log::warn!("failed to stop previous capture device: {}", e);
            }
        }
        if let Some(encode_format) = encode_format {
            *self.context.format.lock() = Some(encode_format.clone());
        }

        let params = CaptureDeviceParams {
            format,
            buffer_millis: self.settings.buffer_millis,
            buffer_count: self.settings.buffer_count,
        };
        let mut device = match self.host.open(self.settings.device_index, &params) {
            Ok(device) => device,
            Err(e) => {
                log::error!("capture device open failed: {}", e);
                errors.push(format!("Failed to initialise the audio capture device: {}", e));
                return false;
            }
        };

        let context = Arc::clone(&self.context);
        let handler: DataAvailableCallback =
            Arc::new(move |raw: &[u8], byte_count: usize| context.on_data_available(raw, byte_count));
        device.set_data_handler(Some(handler));

        let running = self.status.lock().state.is_running();
        if running {
            if let Err(e) = device.start() {
                errors.push(format!("Failed to restart audio capture: {}", e));
            }
        }

        log::debug!("capture device initialised at {}", format);
        *slot = Some(device);
        let mut status = self.status.lock();
        status.has_device = true;
        status.device_format = format;
        true
    }

    /// Switch to `format`, reopening the device only when its clock rate
    /// differs from the device's.
    ///
    /// `record` runs first, inside the same exclusive region as the swap, so
    /// whatever it stores changes together with the encoding format.
    /// Returns `true` if the device was reinitialised.
    pub fn apply_format<F>(&self, format: &AudioFormat, record: F) -> bool
    where
        F: FnOnce(),
    {
        let mut errors = Vec::new();
        let reinitialised = {
            let mut slot = self.device.lock();
            record();

            let status = *self.status.lock();
            if status.state.is_closed() || status.device_format.sample_rate == format.clock_rate {
                *self.context.format.lock() = Some(format.clone());
                false
            } else {
                log::debug!(
                    "capture rate change {} -> {} Hz, reinitialising device",
                    status.device_format.sample_rate,
                    format.clock_rate
                );
                let target = DeviceFormat::for_audio_format(format);
                let reinitialised =
                    self.initialize_locked(&mut slot, target, Some(format), &mut errors);
                if reinitialised {
                    DiagnosticsCounters::bump(&self.context.counters.capture_reinits);
                } else if self.status.lock().has_device {
                    // The device was never released, so it keeps its old rate
                    // and encoding format.
                    log::warn!(
                        "source format {} selected but the capture device stays at {} Hz",
                        format,
                        status.device_format.sample_rate
                    );
                }
                reinitialised
            }
        };
        self.report(errors);
        reinitialised
    }

    pub fn start(&self) {
        self.transition(PipelineState::mark_started, |device| {
            device
                .start()
                .map_err(|e| format!("Failed to start audio capture: {}", e))
        });
    }

    pub fn pause(&self) {
        self.transition(PipelineState::mark_paused, |device| {
            if let Err(e) = device.stop() {
                log::warn!("failed to pause capture device: {}", e);
            }
            Ok(())
        });
    }

    pub fn resume(&self) {
        self.transition(PipelineState::mark_resumed, |device| {
            device
                .start()
                .map_err(|e| format!("Failed to resume audio capture: {}", e))
        });
    }

    /// Stop for good. The device is unsubscribed and stopped; later
    /// start/resume calls do nothing.
    pub fn close(&self) {
        let mut slot = self.device.lock();
        if !self.status.lock().state.mark_closed() {
            return;
        }
        if let Some(device) = slot.as_mut() {
            device.set_data_handler(None);
            if let Err(e) = device.stop() {
                log::warn!("failed to stop capture device: {}", e);
            }
        }
    }

    /// Apply a guarded state change and, if it took effect, the matching
    /// device call. Skipped entirely when there is no device.
    fn transition<M, D>(&self, mark: M, device_call: D)
    where
        M: FnOnce(&mut PipelineState) -> bool,
        D: FnOnce(&mut Box<dyn CaptureDevice>) -> Result<(), String>,
    {
        let outcome = {
            let mut slot = self.device.lock();
            let Some(device) = slot.as_mut() else {
                return;
            };
            if !mark(&mut self.status.lock().state) {
                return;
            }
            device_call(device)
        };
        if let Err(message) = outcome {
            self.context.signals.source_error(message);
        }
    }

    fn report(&self, errors: Vec<String>) {
        for message in errors {
            self.context.signals.source_error(message);
        }
    }

    pub fn state(&self) -> PipelineState {
        self.status.lock().state
    }

    pub fn has_device(&self) -> bool {
        self.status.lock().has_device
    }

    pub fn device_format(&self) -> DeviceFormat {
        self.status.lock().device_format
    }

    /// Format captured buffers are currently encoded with.
    pub fn encoding_format(&self) -> Option<AudioFormat> {
        self.context.format.lock().clone()
    }
}
