//! Recording device hosts and codecs for pipeline and endpoint tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioCodecKind, AudioFormat, DeviceFormat};
use crate::models::error::EndpointError;
use crate::processing::sample_buffer::BoundedSampleBuffer;
use crate::traits::capture_device::{
    CaptureDevice, CaptureDeviceHost, CaptureDeviceParams, DataAvailableCallback,
};
use crate::traits::codec::AudioCodec;
use crate::traits::render_device::{RenderDevice, RenderDeviceHost};

/// Device calls in the order they happened. `usize` is the device's open order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Opened(usize, DeviceFormat),
    Subscribed(usize),
    Unsubscribed(usize),
    Started(usize),
    Stopped(usize),
    Played(usize),
    Paused(usize),
}

pub type EventLog = Arc<Mutex<Vec<DeviceEvent>>>;

pub struct MockCaptureHost {
    count: AtomicUsize,
    fail_open: AtomicBool,
    events: EventLog,
    handlers: Arc<Mutex<Vec<Option<DataAvailableCallback>>>>,
    params: Mutex<Vec<CaptureDeviceParams>>,
}

impl MockCaptureHost {
    pub fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            count: AtomicUsize::new(count),
            fail_open: AtomicBool::new(false),
            events: Arc::default(),
            handlers: Arc::default(),
            params: Mutex::default(),
        })
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn opened(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn last_params(&self) -> Option<CaptureDeviceParams> {
        self.params.lock().last().copied()
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_device_count(&self, count: usize) {
        self.count.store(count, Ordering::SeqCst);
    }

    /// Deliver `bytes` through device `id`'s handler, as the device thread would.
    /// Returns `false` if that device has no handler attached.
    pub fn fire(&self, id: usize, bytes: &[u8]) -> bool {
        self.fire_with_count(id, bytes, bytes.len())
    }

    pub fn fire_with_count(&self, id: usize, raw: &[u8], byte_count: usize) -> bool {
        let handler = self.handlers.lock().get(id).cloned().flatten();
        match handler {
            Some(handler) => {
                handler(raw, byte_count);
                true
            }
            None => false,
        }
    }

    /// Deliver through the most recently opened device.
    pub fn fire_latest(&self, bytes: &[u8]) -> bool {
        let latest = self.opened().saturating_sub(1);
        self.fire(latest, bytes)
    }

    pub fn count_events(&self, wanted: fn(&DeviceEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| wanted(e)).count()
    }
}

impl CaptureDeviceHost for MockCaptureHost {
    fn device_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn open(
        &self,
        _index: Option<usize>,
        params: &CaptureDeviceParams,
    ) -> Result<Box<dyn CaptureDevice>, EndpointError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(EndpointError::InitializationFailed("mock open failure".into()));
        }
        let id = {
            let mut handlers = self.handlers.lock();
            handlers.push(None);
            handlers.len() - 1
        };
        self.params.lock().push(*params);
        self.events.lock().push(DeviceEvent::Opened(id, params.format));
        Ok(Box::new(MockCaptureDevice {
            id,
            format: params.format,
            events: Arc::clone(&self.events),
            handlers: Arc::clone(&self.handlers),
        }))
    }
}

struct MockCaptureDevice {
    id: usize,
    format: DeviceFormat,
    events: EventLog,
    handlers: Arc<Mutex<Vec<Option<DataAvailableCallback>>>>,
}

impl CaptureDevice for MockCaptureDevice {
    fn set_data_handler(&mut self, handler: Option<DataAvailableCallback>) {
        let event = if handler.is_some() {
            DeviceEvent::Subscribed(self.id)
        } else {
            DeviceEvent::Unsubscribed(self.id)
        };
        self.handlers.lock()[self.id] = handler;
        self.events.lock().push(event);
    }

    fn start(&mut self) -> Result<(), EndpointError> {
        self.events.lock().push(DeviceEvent::Started(self.id));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EndpointError> {
        self.events.lock().push(DeviceEvent::Stopped(self.id));
        Ok(())
    }

    fn format(&self) -> DeviceFormat {
        self.format
    }
}

pub struct MockRenderHost {
    count: AtomicUsize,
    fail_open: AtomicBool,
    events: EventLog,
    buffers: Mutex<Vec<Arc<BoundedSampleBuffer>>>,
}

impl MockRenderHost {
    pub fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            count: AtomicUsize::new(count),
            fail_open: AtomicBool::new(false),
            events: Arc::default(),
            buffers: Mutex::default(),
        })
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn opened(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_device_count(&self, count: usize) {
        self.count.store(count, Ordering::SeqCst);
    }

    /// The buffer the most recently opened device drains.
    pub fn latest_buffer(&self) -> Option<Arc<BoundedSampleBuffer>> {
        self.buffers.lock().last().cloned()
    }

    pub fn count_events(&self, wanted: fn(&DeviceEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| wanted(e)).count()
    }
}

impl RenderDeviceHost for MockRenderHost {
    fn device_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn open(
        &self,
        _index: Option<usize>,
        format: DeviceFormat,
        buffer: Arc<BoundedSampleBuffer>,
    ) -> Result<Box<dyn RenderDevice>, EndpointError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(EndpointError::InitializationFailed("mock open failure".into()));
        }
        let id = {
            let mut buffers = self.buffers.lock();
            buffers.push(buffer);
            buffers.len() - 1
        };
        self.events.lock().push(DeviceEvent::Opened(id, format));
        Ok(Box::new(MockRenderDevice {
            id,
            events: Arc::clone(&self.events),
        }))
    }
}

struct MockRenderDevice {
    id: usize,
    events: EventLog,
}

impl RenderDevice for MockRenderDevice {
    fn play(&mut self) -> Result<(), EndpointError> {
        self.events.lock().push(DeviceEvent::Played(self.id));
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EndpointError> {
        self.events.lock().push(DeviceEvent::Paused(self.id));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EndpointError> {
        self.events.lock().push(DeviceEvent::Stopped(self.id));
        Ok(())
    }
}

/// Identity codec: "encodes" PCM as little-endian bytes.
pub struct LoopbackCodec {
    formats: Vec<AudioFormat>,
}

impl LoopbackCodec {
    pub fn new(formats: Vec<AudioFormat>) -> Arc<Self> {
        Arc::new(Self { formats })
    }
}

impl AudioCodec for LoopbackCodec {
    fn supported_formats(&self) -> Vec<AudioFormat> {
        self.formats.clone()
    }

    fn encode(&self, pcm: &[i16], format: &AudioFormat) -> Result<Vec<u8>, EndpointError> {
        if format.codec == AudioCodecKind::Unknown {
            return Err(EndpointError::EncodingFailed("unknown codec".into()));
        }
        Ok(pcm.iter().flat_map(|s| s.to_le_bytes()).collect())
    }

    fn decode(&self, encoded: &[u8], format: &AudioFormat) -> Result<Vec<i16>, EndpointError> {
        if format.codec == AudioCodecKind::Unknown {
            return Err(EndpointError::DecodingFailed("unknown codec".into()));
        }
        Ok(encoded
            .chunks_exact(2)
            .map(|p| i16::from_le_bytes([p[0], p[1]]))
            .collect())
    }
}

pub fn l16(clock_rate: u32) -> AudioFormat {
    AudioFormat::l16(100 + (clock_rate / 8000) as u8, clock_rate)
}

pub fn is_started(e: &DeviceEvent) -> bool {
    matches!(e, DeviceEvent::Started(_))
}

pub fn is_stopped(e: &DeviceEvent) -> bool {
    matches!(e, DeviceEvent::Stopped(_))
}

pub fn is_opened(e: &DeviceEvent) -> bool {
    matches!(e, DeviceEvent::Opened(..))
}

pub fn is_played(e: &DeviceEvent) -> bool {
    matches!(e, DeviceEvent::Played(_))
}

pub fn is_subscribed(e: &DeviceEvent) -> bool {
    matches!(e, DeviceEvent::Subscribed(_))
}
