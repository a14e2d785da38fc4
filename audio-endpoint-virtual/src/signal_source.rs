//! What a virtual microphone "hears".
//!
//! Samples pushed into a [`PcmFeed`] are delivered first; once the feed runs
//! dry the device falls back to its [`CaptureSignal`].

use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::sync::Arc;

use parking_lot::Mutex;

use audio_endpoint_core::models::audio_models::DeviceFormat;
use audio_endpoint_core::processing::pcm::f32_to_i16;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CaptureSignal {
    #[default]
    Silence,
    /// Sine wave, `amplitude` in `[0.0, 1.0]`, same on every channel.
    Tone { frequency_hz: f32, amplitude: f32 },
}

/// Interleaved PCM queued for delivery by a virtual capture device.
///
/// Cloning shares the queue, so a test can keep a handle and push while the
/// device thread reads.
#[derive(Debug, Clone, Default)]
pub struct PcmFeed {
    queue: Arc<Mutex<VecDeque<i16>>>,
}

impl PcmFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, samples: &[i16]) {
        self.queue.lock().extend(samples.iter().copied());
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    /// Move up to `out.len()` queued samples into `out`. Returns how many.
    fn take_into(&self, out: &mut [i16]) -> usize {
        let mut queue = self.queue.lock();
        let n = out.len().min(queue.len());
        for (slot, sample) in out.iter_mut().zip(queue.drain(..n)) {
            *slot = sample;
        }
        n
    }
}

/// Per-device sample generator. Keeps phase across buffers.
#[derive(Debug)]
pub(crate) struct SignalGenerator {
    signal: CaptureSignal,
    feed: PcmFeed,
    frame_position: u64,
}

impl SignalGenerator {
    pub(crate) fn new(signal: CaptureSignal, feed: PcmFeed) -> Self {
        Self {
            signal,
            feed,
            frame_position: 0,
        }
    }

    /// Fill `out` (interleaved, `format.channels` wide).
    pub(crate) fn fill(&mut self, out: &mut [i16], format: DeviceFormat) {
        let channels = usize::from(format.channels.max(1));
        let fed = self.feed.take_into(out);
        let rest = &mut out[fed..];

        match self.signal {
            CaptureSignal::Silence => rest.fill(0),
            CaptureSignal::Tone {
                frequency_hz,
                amplitude,
            } => {
                let rate = format.sample_rate.max(1) as f32;
                let frames = rest.len().div_ceil(channels);
                let wave: Vec<f32> = (0..frames as u64)
                    .map(|i| {
                        let t = (self.frame_position + i) as f32 / rate;
                        amplitude * (TAU * frequency_hz * t).sin()
                    })
                    .collect();
                let pcm = f32_to_i16(&wave);
                for (chunk, &sample) in rest.chunks_mut(channels).zip(pcm.iter()) {
                    chunk.fill(sample);
                }
            }
        }
        self.frame_position += (out.len() / channels) as u64;
    }
}
