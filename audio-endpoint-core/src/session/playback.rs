use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioFormat, DeviceFormat, DeviceIndex};
use crate::models::diagnostics::DiagnosticsCounters;
use crate::models::frame::EncodedAudioFrame;
use crate::models::state::PipelineState;
use crate::processing::pcm;
use crate::processing::sample_buffer::BoundedSampleBuffer;
use crate::traits::codec::AudioCodec;
use crate::traits::render_device::{RenderDevice, RenderDeviceHost};

use super::signals::EndpointSignals;

/// Static settings a playback pipeline opens devices with.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackSettings {
    pub device_index: DeviceIndex,
    /// Playback buffer length, in milliseconds of audio at the device format.
    pub buffer_millis: u32,
}

/// Observable side of a playback pipeline, including the buffer submissions
/// write into. Never locked across a device call or a signal.
struct PlaybackStatus {
    state: PipelineState,
    device_format: DeviceFormat,
    buffer: Option<Arc<BoundedSampleBuffer>>,
    has_device: bool,
}

type DeviceSlot = Option<Box<dyn RenderDevice>>;

/// Decoder → speaker half of an endpoint.
///
/// Same locking scheme as the capture side: the device slot serialises
/// device replacement and lifecycle calls, the status lock is only held for
/// reads and flag updates, and sink errors go out after both are released.
pub struct PlaybackPipeline {
    host: Arc<dyn RenderDeviceHost>,
    settings: PlaybackSettings,
    codec: Arc<dyn AudioCodec>,
    device: Mutex<DeviceSlot>,
    status: Mutex<PlaybackStatus>,
    signals: Arc<EndpointSignals>,
    counters: Arc<DiagnosticsCounters>,
}

impl PlaybackPipeline {
    pub(crate) fn new(
        host: Arc<dyn RenderDeviceHost>,
        settings: PlaybackSettings,
        codec: Arc<dyn AudioCodec>,
        initial_format: DeviceFormat,
        signals: Arc<EndpointSignals>,
        counters: Arc<DiagnosticsCounters>,
    ) -> Self {
        Self {
            host,
            settings,
            codec,
            device: Mutex::new(None),
            status: Mutex::new(PlaybackStatus {
                state: PipelineState::default(),
                device_format: initial_format,
                buffer: None,
                has_device: false,
            }),
            signals,
            counters,
        }
    }

    /// Open the render device at `format` with a fresh buffer.
    ///
    /// Never fails to the caller; problems go out on the sink-error signal.
    /// Returns `true` if a device was opened.
    pub fn initialize(&self, format: DeviceFormat) -> bool {
        let mut errors = Vec::new();
        let opened = {
            let mut slot = self.device.lock();
            self.initialize_locked(&mut slot, format, &mut errors)
        };
        self.report(errors);
        opened
    }

    fn check_available(&self) -> Result<(), String> {
        let available = self.host.device_count();
        if available == 0 {
            return Err("No audio playback devices are available.".into());
        }
        match self.settings.device_index {
            Some(index) if index >= available => Err(format!(
                "The requested audio output device index {} exceeds the maximum index of {}.",
                index,
                available - 1
            )),
            _ => Ok(()),
        }
    }

    fn initialize_locked(
        &self,
        slot: &mut DeviceSlot,
        format: DeviceFormat,
        errors: &mut Vec<String>,
    ) -> bool {
        if let Err(message) = self.check_available() {
            errors.push(message);
            return false;
        }

        if let Some(mut old) = slot.take() {
            {
                let mut status = self.status.lock();
                status.has_device = false;
                status.buffer = None;
            }
            if let Err(e) = old.stop() {
                log::warn!("failed to stop previous render device: {}", e);
            }
        }

        let buffer = Arc::new(BoundedSampleBuffer::new(
            format.bytes_for_millis(self.settings.buffer_millis),
        ));
        let mut device =
            match self
                .host
                .open(self.settings.device_index, format, Arc::clone(&buffer))
            {
                Ok(device) => device,
                Err(e) => {
                    log::error!("render device open failed: {}", e);
                    errors.push(format!("Failed to initialise the audio playback device: {}", e));
                    return false;
                }
            };

        let running = self.status.lock().state.is_running();
        if running {
            if let Err(e) = device.play() {
                errors.push(format!("Failed to restart audio playback: {}", e));
            }
        }

        log::debug!(
            "render device initialised at {}, buffer {} bytes",
            format,
            buffer.capacity()
        );
        *slot = Some(device);
        let mut status = self.status.lock();
        status.has_device = true;
        status.buffer = Some(buffer);
        status.device_format = format;
        true
    }

    /// Reopen the device if `format`'s clock rate differs from the device's.
    ///
    /// `record` runs first, inside the same exclusive region as the device
    /// replacement. Returns `true` if the device was reinitialised.
    pub fn apply_format<F>(&self, format: &AudioFormat, record: F) -> bool
    where
        F: FnOnce(),
    {
        let mut errors = Vec::new();
        let reinitialised = {
            let mut slot = self.device.lock();
            record();

            let (closed, device_rate) = {
                let status = self.status.lock();
                (status.state.is_closed(), status.device_format.sample_rate)
            };
            if closed || device_rate == format.clock_rate {
                false
            } else {
                log::debug!(
                    "playback rate change {} -> {} Hz, reinitialising device",
                    device_rate,
                    format.clock_rate
                );
                let reinitialised = self.initialize_locked(
                    &mut slot,
                    DeviceFormat::for_audio_format(format),
                    &mut errors,
                );
                if reinitialised {
                    DiagnosticsCounters::bump(&self.counters.render_reinits);
                } else if self.status.lock().has_device {
                    log::warn!(
                        "sink format {} selected but the render device stays at {} Hz",
                        format,
                        device_rate
                    );
                }
                reinitialised
            }
        };
        self.report(errors);
        reinitialised
    }

    /// Queue already-decoded little-endian PCM. Returns bytes accepted.
    pub fn submit_raw_samples(&self, pcm_bytes: &[u8]) -> usize {
        let Some(buffer) = self.current_buffer() else {
            return 0;
        };
        self.append(&buffer, pcm_bytes)
    }

    /// Decode `frame` with its own format and queue the PCM.
    ///
    /// Frames with an empty format are ignored.
    pub fn submit_encoded_frame(&self, frame: &EncodedAudioFrame) -> usize {
        if frame.format.is_empty() {
            return 0;
        }
        self.decode_and_queue(&frame.payload, &frame.format)
    }

    /// Decode `payload` as `format` and queue the PCM.
    pub fn decode_and_queue(&self, payload: &[u8], format: &AudioFormat) -> usize {
        let Some(buffer) = self.current_buffer() else {
            return 0;
        };
        let samples = match self.codec.decode(payload, format) {
            Ok(samples) => samples,
            Err(e) => {
                self.signals
                    .sink_error(format!("failed to decode {} payload: {}", format, e));
                return 0;
            }
        };
        DiagnosticsCounters::bump(&self.counters.decoded_frames);
        self.append(&buffer, &pcm::samples_to_le_bytes(&samples))
    }

    fn append(&self, buffer: &BoundedSampleBuffer, bytes: &[u8]) -> usize {
        let accepted = buffer.append(bytes, 0, bytes.len());
        DiagnosticsCounters::add(&self.counters.playback_accepted, accepted);
        DiagnosticsCounters::add(&self.counters.playback_dropped, bytes.len() - accepted);
        accepted
    }

    fn current_buffer(&self) -> Option<Arc<BoundedSampleBuffer>> {
        let status = self.status.lock();
        if status.state.is_closed() {
            return None;
        }
        status.buffer.clone()
    }

    pub fn start(&self) {
        self.transition(PipelineState::mark_started, |device| {
            device
                .play()
                .map_err(|e| format!("Failed to start audio playback: {}", e))
        });
    }

    /// Stop draining; whatever is buffered stays for `resume`.
    pub fn pause(&self) {
        self.transition(PipelineState::mark_paused, |device| {
            if let Err(e) = device.pause() {
                log::warn!("failed to pause render device: {}", e);
            }
            Ok(())
        });
    }

    pub fn resume(&self) {
        self.transition(PipelineState::mark_resumed, |device| {
            device
                .play()
                .map_err(|e| format!("Failed to resume audio playback: {}", e))
        });
    }

    pub fn close(&self) {
        let mut slot = self.device.lock();
        if !self.status.lock().state.mark_closed() {
            return;
        }
        if let Some(device) = slot.as_mut() {
            if let Err(e) = device.stop() {
                log::warn!("failed to stop render device: {}", e);
            }
        }
    }

    fn transition<M, D>(&self, mark: M, device_call: D)
    where
        M: FnOnce(&mut PipelineState) -> bool,
        D: FnOnce(&mut Box<dyn RenderDevice>) -> Result<(), String>,
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
            self.signals.sink_error(message);
        }
    }

    fn report(&self, errors: Vec<String>) {
        for message in errors {
            self.signals.sink_error(message);
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

    /// Bytes waiting in the playback buffer.
    pub fn buffered_bytes(&self) -> usize {
        self.status.lock().buffer.as_ref().map_or(0, |b| b.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::*;

    struct Fixture {
        host: Arc<MockRenderHost>,
        pipeline: PlaybackPipeline,
        signals: Arc<EndpointSignals>,
        counters: Arc<DiagnosticsCounters>,
    }

    fn fixture(device_count: usize, device_index: Option<usize>, buffer_millis: u32) -> Fixture {
        let host = MockRenderHost::new(device_count);
        let signals = Arc::new(EndpointSignals::default());
        let counters = Arc::new(DiagnosticsCounters::default());
        let pipeline = PlaybackPipeline::new(
            host.clone(),
            PlaybackSettings {
                device_index,
                buffer_millis,
            },
            LoopbackCodec::new(vec![l16(8000), l16(16000)]),
            DeviceFormat::new(8000, 1),
            Arc::clone(&signals),
            Arc::clone(&counters),
        );
        Fixture {
            host,
            pipeline,
            signals,
            counters,
        }
    }

    fn collect_errors(signals: &EndpointSignals) -> Arc<Mutex<Vec<String>>> {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        signals.sink_error.subscribe(move |msg: &String| sink.lock().push(msg.clone()));
        errors
    }

    #[test]
    fn initialize_sizes_buffer_from_format() {
        let f = fixture(1, None, 5000);
        assert!(f.pipeline.initialize(DeviceFormat::new(8000, 1)));

        let buffer = f.host.latest_buffer().unwrap();
        assert_eq!(buffer.capacity(), 8000 * 2 * 5);
        assert_eq!(
            f.host.events(),
            vec![DeviceEvent::Opened(0, DeviceFormat::new(8000, 1))]
        );
    }

    #[test]
    fn invalid_index_reports_sink_error() {
        let f = fixture(1, Some(4), 5000);
        let errors = collect_errors(&f.signals);

        assert!(!f.pipeline.initialize(DeviceFormat::new(8000, 1)));

        assert!(!f.pipeline.has_device());
        assert_eq!(
            errors.lock().as_slice(),
            ["The requested audio output device index 4 exceeds the maximum index of 0.".to_string()]
        );
    }

    #[test]
    fn open_failure_reports_sink_error() {
        let f = fixture(1, None, 5000);
        let errors = collect_errors(&f.signals);
        f.host.set_fail_open(true);

        assert!(!f.pipeline.initialize(DeviceFormat::new(8000, 1)));
        assert_eq!(errors.lock().len(), 1);
        assert_eq!(f.pipeline.submit_raw_samples(&[1, 2]), 0);
    }

    #[test]
    fn raw_samples_are_queued_verbatim() {
        let f = fixture(1, None, 5000);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));

        assert_eq!(f.pipeline.submit_raw_samples(&[1, 2, 3, 4]), 4);

        assert_eq!(f.host.latest_buffer().unwrap().drain(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn encoded_frame_decodes_with_its_own_format() {
        let f = fixture(1, None, 5000);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));

        // Loopback decode of LE bytes reproduces the same bytes.
        let payload: Vec<u8> = [100i16, -100, 3000]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let frame = EncodedAudioFrame::new(l16(16000), 20, payload.clone());

        assert_eq!(f.pipeline.submit_encoded_frame(&frame), 6);
        assert_eq!(f.host.latest_buffer().unwrap().drain(), payload);
        assert_eq!(f.counters.snapshot().decoded_frame_count, 1);
    }

    #[test]
    fn empty_format_frame_is_ignored() {
        let f = fixture(1, None, 5000);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));
        let errors = collect_errors(&f.signals);

        let frame = EncodedAudioFrame::new(AudioFormat::default(), 20, vec![1, 2]);
        assert_eq!(f.pipeline.submit_encoded_frame(&frame), 0);

        assert!(errors.lock().is_empty());
        assert_eq!(f.pipeline.buffered_bytes(), 0);
    }

    #[test]
    fn decode_failure_reports_sink_error() {
        let f = fixture(1, None, 5000);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));
        let errors = collect_errors(&f.signals);

        let unknown = AudioFormat {
            clock_rate: 8000,
            ..AudioFormat::default()
        };
        assert_eq!(f.pipeline.decode_and_queue(&[1, 2], &unknown), 0);
        assert_eq!(errors.lock().len(), 1);
    }

    #[test]
    fn overflow_drops_newest_and_is_counted() {
        // 1 ms at 8 kHz mono = 16 bytes of buffer.
        let f = fixture(1, None, 1);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));

        assert_eq!(f.pipeline.submit_raw_samples(&[1; 10]), 10);
        assert_eq!(f.pipeline.submit_raw_samples(&[2; 10]), 6);

        let diag = f.counters.snapshot();
        assert_eq!(diag.playback_bytes_accepted, 16);
        assert_eq!(diag.playback_bytes_dropped, 4);
        let buffered = f.host.latest_buffer().unwrap().drain();
        assert_eq!(&buffered[..10], &[1; 10]);
        assert_eq!(&buffered[10..], &[2; 6]);
    }

    #[test]
    fn rate_change_replaces_device_and_buffer() {
        let f = fixture(1, None, 5000);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));
        f.pipeline.start();
        f.pipeline.submit_raw_samples(&[9; 8]);
        f.host.clear_events();

        assert!(f.pipeline.apply_format(&l16(16000), || {}));

        assert_eq!(
            f.host.events(),
            vec![
                DeviceEvent::Stopped(0),
                DeviceEvent::Opened(1, DeviceFormat::new(16000, 1)),
                DeviceEvent::Played(1),
            ]
        );
        assert_eq!(f.pipeline.buffered_bytes(), 0);
        assert_eq!(f.host.latest_buffer().unwrap().capacity(), 16000 * 2 * 5);
        assert_eq!(f.counters.snapshot().render_reinit_count, 1);
    }

    #[test]
    fn same_rate_keeps_device() {
        let f = fixture(1, None, 5000);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));
        f.host.clear_events();

        assert!(!f.pipeline.apply_format(&l16(8000), || {}));
        assert!(f.host.events().is_empty());
        assert_eq!(f.host.opened(), 1);
    }

    #[test]
    fn pause_keeps_buffer_and_resume_plays() {
        let f = fixture(1, None, 5000);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));
        f.pipeline.start();
        f.pipeline.submit_raw_samples(&[5; 4]);
        f.host.clear_events();

        f.pipeline.pause();
        assert_eq!(f.pipeline.buffered_bytes(), 4);
        f.pipeline.resume();

        assert_eq!(
            f.host.events(),
            vec![DeviceEvent::Paused(0), DeviceEvent::Played(0)]
        );
    }

    #[test]
    fn close_is_terminal() {
        let f = fixture(1, None, 5000);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));
        f.pipeline.start();
        f.pipeline.close();
        f.host.clear_events();

        f.pipeline.start();
        f.pipeline.resume();
        f.pipeline.close();

        assert!(f.host.events().is_empty());
        assert_eq!(f.pipeline.submit_raw_samples(&[1, 2]), 0);
    }

    #[test]
    fn sink_error_subscriber_can_query_pipeline() {
        let Fixture {
            host,
            pipeline,
            signals,
            ..
        } = fixture(1, None, 5000);
        let pipeline = Arc::new(pipeline);
        pipeline.initialize(DeviceFormat::new(8000, 1));
        pipeline.start();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let weak = Arc::downgrade(&pipeline);
        signals.sink_error.subscribe(move |_: &String| {
            if let Some(p) = weak.upgrade() {
                sink.lock()
                    .push((p.has_device(), p.state().is_running(), p.buffered_bytes()));
            }
        });
        host.set_fail_open(true);

        assert!(!pipeline.apply_format(&l16(16000), || {}));

        assert_eq!(*seen.lock(), vec![(false, true, 0)]);
        assert_eq!(pipeline.submit_raw_samples(&[1, 2]), 0);
    }

    #[test]
    fn start_twice_plays_once() {
        let f = fixture(1, None, 5000);
        f.pipeline.initialize(DeviceFormat::new(8000, 1));

        f.pipeline.start();
        f.pipeline.start();

        assert_eq!(f.host.count_events(is_played), 1);
    }
}
