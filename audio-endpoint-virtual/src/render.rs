//! Virtual speaker.
//!
//! A playing device drains its [`BoundedSampleBuffer`] in real time on a
//! named thread and appends what it read to a shared [`RenderedAudio`].
//! When the buffer runs dry the shortfall is rendered as silence, which is
//! counted but not recorded.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use audio_endpoint_core::models::audio_models::DeviceFormat;
use audio_endpoint_core::models::error::EndpointError;
use audio_endpoint_core::processing::sample_buffer::BoundedSampleBuffer;
use audio_endpoint_core::traits::render_device::{RenderDevice, RenderDeviceHost};

use crate::devices::{DeviceList, VirtualDeviceInfo};
use crate::error::VirtualDeviceError;

const DEFAULT_TICK_MILLIS: u32 = 10;

#[derive(Debug, Default)]
struct RenderedState {
    bytes: Vec<u8>,
    silence_bytes: u64,
}

/// Everything virtual render devices have played. Cloning shares it.
#[derive(Debug, Clone, Default)]
pub struct RenderedAudio {
    state: Arc<Mutex<RenderedState>>,
}

impl RenderedAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the recorded PCM, leaving the recording empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.lock().bytes)
    }

    pub fn len(&self) -> usize {
        self.state.lock().bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes of silence rendered because the buffer was empty.
    pub fn silence_bytes(&self) -> u64 {
        self.state.lock().silence_bytes
    }

    fn record(&self, played: &[u8], silence: usize) {
        let mut state = self.state.lock();
        state.bytes.extend_from_slice(played);
        state.silence_bytes += silence as u64;
    }
}

/// Host for virtual render devices.
pub struct VirtualRenderHost {
    devices: DeviceList,
    output: RenderedAudio,
    tick_millis: u32,
    opened: AtomicUsize,
}

impl VirtualRenderHost {
    /// One default device.
    pub fn new() -> Self {
        Self::with_devices(DeviceList::new(["Virtual Speaker"]))
    }

    pub fn with_devices(devices: DeviceList) -> Self {
        Self {
            devices,
            output: RenderedAudio::new(),
            tick_millis: DEFAULT_TICK_MILLIS,
            opened: AtomicUsize::new(0),
        }
    }

    /// How much audio each device pulls per wake-up.
    pub fn with_tick_millis(mut self, tick_millis: u32) -> Self {
        self.tick_millis = tick_millis.max(1);
        self
    }

    /// Shared recording of every device this host opens.
    pub fn output(&self) -> RenderedAudio {
        self.output.clone()
    }

    pub fn devices(&self) -> &[VirtualDeviceInfo] {
        self.devices.list()
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Default for VirtualRenderHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDeviceHost for VirtualRenderHost {
    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn open(
        &self,
        index: Option<usize>,
        format: DeviceFormat,
        buffer: Arc<BoundedSampleBuffer>,
    ) -> Result<Box<dyn RenderDevice>, EndpointError> {
        let info = self.devices.resolve(index)?;
        if format.sample_rate == 0 || format.channels == 0 {
            return Err(VirtualDeviceError::InvalidFormat(format.to_string()).into());
        }

        let serial = self.opened.fetch_add(1, Ordering::SeqCst);
        log::debug!("opening virtual render device '{}' at {}", info.name, format);
        Ok(Box::new(VirtualRenderDevice {
            thread_name: format!("virtual-speaker-{}-{}", info.index, serial),
            format,
            tick_millis: self.tick_millis,
            buffer,
            output: self.output.clone(),
            playing: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            render_handle: None,
        }))
    }
}

/// An opened virtual speaker.
pub struct VirtualRenderDevice {
    thread_name: String,
    format: DeviceFormat,
    tick_millis: u32,
    buffer: Arc<BoundedSampleBuffer>,
    output: RenderedAudio,
    playing: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    render_handle: Option<thread::JoinHandle<()>>,
}

impl VirtualRenderDevice {
    fn join_thread(&mut self) -> Result<(), VirtualDeviceError> {
        self.playing.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.render_handle.take() {
            handle
                .join()
                .map_err(|_| VirtualDeviceError::ThreadPanicked(self.thread_name.clone()))?;
        }
        Ok(())
    }
}

impl RenderDevice for VirtualRenderDevice {
    fn play(&mut self) -> Result<(), EndpointError> {
        self.playing.store(true, Ordering::SeqCst);
        if self.render_handle.is_some() {
            return Ok(());
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let playing = Arc::clone(&self.playing);
        let buffer = Arc::clone(&self.buffer);
        let output = self.output.clone();
        let chunk_bytes = self.format.bytes_for_millis(self.tick_millis);
        let period = Duration::from_millis(u64::from(self.tick_millis));

        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || render_loop(running, playing, buffer, output, chunk_bytes, period))
            .map_err(|e| {
                self.playing.store(false, Ordering::SeqCst);
                self.running.store(false, Ordering::SeqCst);
                VirtualDeviceError::Spawn(e)
            })?;

        self.render_handle = Some(handle);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EndpointError> {
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EndpointError> {
        self.join_thread()?;
        Ok(())
    }
}

impl Drop for VirtualRenderDevice {
    fn drop(&mut self) {
        if let Err(e) = self.join_thread() {
            log::error!("{}", e);
        }
    }
}

fn render_loop(
    running: Arc<AtomicBool>,
    playing: Arc<AtomicBool>,
    buffer: Arc<BoundedSampleBuffer>,
    output: RenderedAudio,
    chunk_bytes: usize,
    period: Duration,
) {
    let mut chunk = vec![0u8; chunk_bytes];
    let mut next_tick = Instant::now() + period;

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        }
        next_tick += period;

        if !playing.load(Ordering::SeqCst) {
            continue;
        }
        let read = buffer.read(&mut chunk);
        output.record(&chunk[..read], chunk_bytes - read);
    }
}
