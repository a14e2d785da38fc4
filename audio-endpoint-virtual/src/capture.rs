//! Virtual microphone.
//!
//! Each opened device runs a named thread that wakes every `buffer_millis`,
//! fills one buffer from its [`SignalGenerator`] and hands the bytes to the
//! attached data handler.
//!
//! `stop()` joins the thread. A data handler must not call back into
//! whatever owns the device (e.g. endpoint lifecycle methods) or the join
//! can deadlock.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use audio_endpoint_core::models::audio_models::DeviceFormat;
use audio_endpoint_core::models::error::EndpointError;
use audio_endpoint_core::processing::pcm::samples_to_le_bytes;
use audio_endpoint_core::traits::capture_device::{
    CaptureDevice, CaptureDeviceHost, CaptureDeviceParams, DataAvailableCallback,
};

use crate::devices::{DeviceList, VirtualDeviceInfo};
use crate::error::VirtualDeviceError;
use crate::signal_source::{CaptureSignal, PcmFeed, SignalGenerator};

/// Host for virtual capture devices.
pub struct VirtualCaptureHost {
    devices: DeviceList,
    signal: CaptureSignal,
    feed: PcmFeed,
    opened: AtomicUsize,
}

impl VirtualCaptureHost {
    /// One default device producing silence.
    pub fn new() -> Self {
        Self::with_devices(DeviceList::new(["Virtual Microphone"]))
    }

    pub fn with_devices(devices: DeviceList) -> Self {
        Self {
            devices,
            signal: CaptureSignal::default(),
            feed: PcmFeed::new(),
            opened: AtomicUsize::new(0),
        }
    }

    /// What devices opened from now on produce once their feed is empty.
    pub fn with_signal(mut self, signal: CaptureSignal) -> Self {
        self.signal = signal;
        self
    }

    /// Queue shared by every device this host opens.
    pub fn feed(&self) -> PcmFeed {
        self.feed.clone()
    }

    pub fn devices(&self) -> &[VirtualDeviceInfo] {
        self.devices.list()
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Default for VirtualCaptureHost {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDeviceHost for VirtualCaptureHost {
    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn open(
        &self,
        index: Option<usize>,
        params: &CaptureDeviceParams,
    ) -> Result<Box<dyn CaptureDevice>, EndpointError> {
        let info = self.devices.resolve(index)?;
        if params.format.sample_rate == 0 || params.format.channels == 0 || params.buffer_millis == 0 {
            return Err(VirtualDeviceError::InvalidFormat(format!(
                "{} with {} ms buffers",
                params.format, params.buffer_millis
            ))
            .into());
        }

        let serial = self.opened.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "opening virtual capture device '{}' at {} ({} ms x {})",
            info.name,
            params.format,
            params.buffer_millis,
            params.buffer_count
        );
        Ok(Box::new(VirtualCaptureDevice {
            thread_name: format!("virtual-mic-{}-{}", info.index, serial),
            params: *params,
            generator: Arc::new(Mutex::new(SignalGenerator::new(
                self.signal,
                self.feed.clone(),
            ))),
            handler: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: None,
        }))
    }
}

/// An opened virtual microphone.
pub struct VirtualCaptureDevice {
    thread_name: String,
    params: CaptureDeviceParams,
    generator: Arc<Mutex<SignalGenerator>>,
    handler: Arc<Mutex<Option<DataAvailableCallback>>>,
    running: Arc<AtomicBool>,
    capture_handle: Option<thread::JoinHandle<()>>,
}

impl VirtualCaptureDevice {
    fn join_thread(&mut self) -> Result<(), VirtualDeviceError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.take() {
            handle
                .join()
                .map_err(|_| VirtualDeviceError::ThreadPanicked(self.thread_name.clone()))?;
        }
        Ok(())
    }
}

impl CaptureDevice for VirtualCaptureDevice {
    fn set_data_handler(&mut self, handler: Option<DataAvailableCallback>) {
        *self.handler.lock() = handler;
    }

    fn start(&mut self) -> Result<(), EndpointError> {
        if self.capture_handle.is_some() {
            return Ok(());
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let handler = Arc::clone(&self.handler);
        let generator = Arc::clone(&self.generator);
        let params = self.params;

        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || capture_loop(running, params, generator, handler))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                VirtualDeviceError::Spawn(e)
            })?;

        self.capture_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EndpointError> {
        self.join_thread()?;
        Ok(())
    }

    fn format(&self) -> DeviceFormat {
        self.params.format
    }
}

impl Drop for VirtualCaptureDevice {
    fn drop(&mut self) {
        if let Err(e) = self.join_thread() {
            log::error!("{}", e);
        }
    }
}

/// Deliver one buffer per period until `running` clears.
fn capture_loop(
    running: Arc<AtomicBool>,
    params: CaptureDeviceParams,
    generator: Arc<Mutex<SignalGenerator>>,
    handler: Arc<Mutex<Option<DataAvailableCallback>>>,
) {
    let period = Duration::from_millis(u64::from(params.buffer_millis));
    let samples_per_buffer = params.format.bytes_for_millis(params.buffer_millis) / 2;
    let mut pcm = vec![0i16; samples_per_buffer];
    let mut next_tick = Instant::now() + period;

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        }
        next_tick += period;
        if !running.load(Ordering::SeqCst) {
            break;
        }

        generator.lock().fill(&mut pcm, params.format);
        let bytes = samples_to_le_bytes(&pcm);

        // Cloned so a handler swap never waits on a running callback.
        let current = handler.lock().clone();
        if let Some(callback) = current {
            callback(&bytes, bytes.len());
        }
    }
}
