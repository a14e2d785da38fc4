use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::audio_models::{AudioFormat, DeviceFormat};
use crate::models::config::EndpointConfiguration;
use crate::models::diagnostics::{DiagnosticsCounters, EndpointDiagnostics};
use crate::models::error::EndpointError;
use crate::models::frame::{EncodedAudioFrame, EncodedSample, RawRtpAudio};
use crate::models::state::PipelineState;
use crate::traits::capture_device::CaptureDeviceHost;
use crate::traits::codec::AudioCodec;
use crate::traits::render_device::RenderDeviceHost;

use super::capture::{CapturePipeline, CaptureSettings};
use super::format_manager::FormatManager;
use super::playback::{PlaybackPipeline, PlaybackSettings};
use super::signal::Signal;
use super::signals::EndpointSignals;

/// Device-backed audio endpoint: microphone → encoder on one side,
/// decoder → speaker on the other.
///
/// Data flow:
/// ```text
/// [Capture device] → PCM → [AudioCodec::encode] → frame_ready / encoded_sample
/// frames / raw PCM → [AudioCodec::decode] → [BoundedSampleBuffer] → [Render device]
/// ```
///
/// Source and sink formats are negotiated independently. Selecting a format
/// whose clock rate differs from the device's reopens that device at the new
/// rate. Each pipeline follows `unstarted → started ⇄ paused → closed`, and
/// a pipeline that is disabled or has no device is skipped by every
/// lifecycle call.
///
/// All methods take `&self`; the endpoint can be shared between the
/// signalling thread and a network receive thread.
pub struct AudioEndpoint {
    id: Uuid,
    config: EndpointConfiguration,
    source_formats: Mutex<FormatManager>,
    sink_formats: Mutex<FormatManager>,
    capture: Option<CapturePipeline>,
    playback: Option<PlaybackPipeline>,
    signals: Arc<EndpointSignals>,
    counters: Arc<DiagnosticsCounters>,
}

impl AudioEndpoint {
    /// Build the endpoint and open its devices.
    ///
    /// Supported formats come from `codec`. If it advertises exactly one,
    /// that format is selected for both directions and devices open at its
    /// clock rate; otherwise they open at the configured default rate.
    ///
    /// Only an invalid configuration is an error. Device problems are
    /// reported on the source/sink error signals, so subscribe through
    /// [`with_signals`](Self::with_signals) to see those raised here.
    pub fn new(
        config: EndpointConfiguration,
        codec: Arc<dyn AudioCodec>,
        capture_host: Arc<dyn CaptureDeviceHost>,
        render_host: Arc<dyn RenderDeviceHost>,
    ) -> Result<Self, EndpointError> {
        Self::with_signals(
            config,
            codec,
            capture_host,
            render_host,
            Arc::new(EndpointSignals::default()),
        )
    }

    /// Like [`new`](Self::new), emitting on `signals`, which may already have
    /// subscribers.
    pub fn with_signals(
        config: EndpointConfiguration,
        codec: Arc<dyn AudioCodec>,
        capture_host: Arc<dyn CaptureDeviceHost>,
        render_host: Arc<dyn RenderDeviceHost>,
        signals: Arc<EndpointSignals>,
    ) -> Result<Self, EndpointError> {
        config.validate()?;

        let id = Uuid::new_v4();
        let counters = Arc::new(DiagnosticsCounters::default());
        let source_formats = FormatManager::new(codec.supported_formats());
        let sink_formats = FormatManager::new(codec.supported_formats());

        let default_format = DeviceFormat::new(config.default_sample_rate, config.default_channels);
        let device_format_for = |selected: Option<&AudioFormat>| {
            selected.map_or(default_format, DeviceFormat::for_audio_format)
        };

        let capture = if config.disable_source {
            None
        } else {
            let format = device_format_for(source_formats.selected_format());
            let pipeline = CapturePipeline::new(
                capture_host,
                CaptureSettings {
                    device_index: config.capture_device_index,
                    buffer_millis: config.capture_buffer_millis,
                    buffer_count: config.capture_buffer_count,
                },
                Arc::clone(&codec),
                format,
                source_formats.selected_format().cloned(),
                Arc::clone(&signals),
                Arc::clone(&counters),
            );
            pipeline.initialize(format);
            Some(pipeline)
        };

        let playback = if config.disable_sink {
            None
        } else {
            let format = device_format_for(sink_formats.selected_format());
            let pipeline = PlaybackPipeline::new(
                render_host,
                PlaybackSettings {
                    device_index: config.render_device_index,
                    buffer_millis: config.playback_buffer_millis,
                },
                Arc::clone(&codec),
                format,
                Arc::clone(&signals),
                Arc::clone(&counters),
            );
            pipeline.initialize(format);
            Some(pipeline)
        };

        log::info!(
            "audio endpoint {} created (source: {}, sink: {})",
            id,
            if capture.is_some() { "enabled" } else { "disabled" },
            if playback.is_some() { "enabled" } else { "disabled" },
        );

        Ok(Self {
            id,
            config,
            source_formats: Mutex::new(source_formats),
            sink_formats: Mutex::new(sink_formats),
            capture,
            playback,
            signals,
            counters,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EndpointConfiguration {
        &self.config
    }

    // --- Formats ---

    pub fn source_formats(&self) -> Vec<AudioFormat> {
        self.source_formats.lock().supported_formats().to_vec()
    }

    pub fn sink_formats(&self) -> Vec<AudioFormat> {
        self.sink_formats.lock().supported_formats().to_vec()
    }

    pub fn selected_source_format(&self) -> Option<AudioFormat> {
        self.source_formats.lock().selected_format().cloned()
    }

    pub fn selected_sink_format(&self) -> Option<AudioFormat> {
        self.sink_formats.lock().selected_format().cloned()
    }

    /// Narrow both directions' supported formats to those matching `filter`.
    pub fn restrict_formats<F>(&self, filter: F)
    where
        F: Fn(&AudioFormat) -> bool,
    {
        self.source_formats.lock().restrict_formats(&filter);
        self.sink_formats.lock().restrict_formats(&filter);
    }

    /// Select the format captured audio is encoded with.
    ///
    /// The selection is recorded inside the capture pipeline's exclusive
    /// region, so concurrent calls take effect in the order they are recorded.
    /// If the device cannot be reopened at a new rate because none is
    /// present, the old encoding format stays in use and a warning is logged.
    pub fn set_source_format(&self, format: AudioFormat) {
        log::debug!("endpoint {}: source format {}", self.id, format);
        let record = || self.source_formats.lock().set_selected_format(format.clone());
        match &self.capture {
            Some(capture) => {
                capture.apply_format(&format, record);
            }
            None => record(),
        }
    }

    /// Select the format the sink renders at.
    pub fn set_sink_format(&self, format: AudioFormat) {
        log::debug!("endpoint {}: sink format {}", self.id, format);
        let record = || self.sink_formats.lock().set_selected_format(format.clone());
        match &self.playback {
            Some(playback) => {
                playback.apply_format(&format, record);
            }
            None => record(),
        }
    }

    // --- Lifecycle ---

    pub fn start(&self) {
        if let Some(capture) = &self.capture {
            capture.start();
        }
        if let Some(playback) = &self.playback {
            playback.start();
        }
    }

    pub fn pause(&self) {
        if let Some(capture) = &self.capture {
            capture.pause();
        }
        if let Some(playback) = &self.playback {
            playback.pause();
        }
    }

    pub fn resume(&self) {
        if let Some(capture) = &self.capture {
            capture.resume();
        }
        if let Some(playback) = &self.playback {
            playback.resume();
        }
    }

    /// Stop both pipelines for good.
    pub fn close(&self) {
        if let Some(capture) = &self.capture {
            capture.close();
        }
        if let Some(playback) = &self.playback {
            playback.close();
        }
        log::info!("audio endpoint {} closed", self.id);
    }

    pub fn source_state(&self) -> Option<PipelineState> {
        self.capture.as_ref().map(CapturePipeline::state)
    }

    pub fn sink_state(&self) -> Option<PipelineState> {
        self.playback.as_ref().map(PlaybackPipeline::state)
    }

    pub fn is_source_paused(&self) -> bool {
        self.source_state().is_some_and(|s| s.is_paused())
    }

    pub fn is_sink_paused(&self) -> bool {
        self.sink_state().is_some_and(|s| s.is_paused())
    }

    pub fn source_device_format(&self) -> Option<DeviceFormat> {
        self.capture.as_ref().map(CapturePipeline::device_format)
    }

    pub fn sink_device_format(&self) -> Option<DeviceFormat> {
        self.playback.as_ref().map(PlaybackPipeline::device_format)
    }

    // --- Inbound audio ---

    /// Queue already-decoded little-endian PCM for playback. Returns bytes
    /// accepted; the rest was dropped because the buffer was full.
    pub fn submit_decoded_pcm(&self, pcm_bytes: &[u8]) -> usize {
        self.playback
            .as_ref()
            .map_or(0, |p| p.submit_raw_samples(pcm_bytes))
    }

    /// Decode `frame` with the format it carries and queue it for playback.
    pub fn submit_encoded_frame(&self, frame: &EncodedAudioFrame) -> usize {
        self.playback
            .as_ref()
            .map_or(0, |p| p.submit_encoded_frame(frame))
    }

    /// Legacy inbound path: decode an RTP payload with the selected sink
    /// format, whatever payload id it carries.
    pub fn submit_rtp_audio(&self, packet: &RawRtpAudio) -> usize {
        let Some(playback) = &self.playback else {
            return 0;
        };
        let Some(format) = self.selected_sink_format() else {
            log::debug!(
                "dropping RTP audio seq {} from {}, no sink format selected",
                packet.sequence_number,
                packet.remote
            );
            return 0;
        };
        if format.is_empty() {
            return 0;
        }
        playback.decode_and_queue(&packet.payload, &format)
    }

    /// Raw samples from an external source cannot be injected into a
    /// device-backed endpoint. Always fails.
    pub fn external_audio_source_raw_sample(
        &self,
        sample_rate: u32,
        duration_ms: u32,
        _samples: &[i16],
    ) -> Result<(), EndpointError> {
        log::error!(
            "endpoint {}: external raw sample ({} Hz, {} ms) rejected",
            self.id,
            sample_rate,
            duration_ms
        );
        Err(EndpointError::Unsupported(
            "external audio source samples are not supported by a device endpoint".into(),
        ))
    }

    // --- Signals ---

    /// Legacy encoded-sample signal, `(length, bytes)` per capture buffer.
    pub fn on_encoded_sample(&self) -> &Signal<EncodedSample> {
        &self.signals.encoded_sample
    }

    pub fn on_frame_ready(&self) -> &Signal<EncodedAudioFrame> {
        &self.signals.frame_ready
    }

    pub fn on_source_error(&self) -> &Signal<String> {
        &self.signals.source_error
    }

    pub fn on_sink_error(&self) -> &Signal<String> {
        &self.signals.sink_error
    }

    pub fn has_encoded_audio_subscribers(&self) -> bool {
        self.signals.has_encoded_audio_subscribers()
    }

    pub fn diagnostics(&self) -> EndpointDiagnostics {
        self.counters.snapshot()
    }
}
