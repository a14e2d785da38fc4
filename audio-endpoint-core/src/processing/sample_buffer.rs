use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Circular byte storage behind [`BoundedSampleBuffer`].
#[derive(Debug)]
struct ByteRing {
    buffer: Vec<u8>,
    write_index: usize,
    read_index: usize,
    available: usize,
}

impl ByteRing {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn free(&self) -> usize {
        self.capacity() - self.available
    }

    fn push(&mut self, bytes: &[u8]) {
        let capacity = self.capacity();
        for &byte in bytes {
            self.buffer[self.write_index] = byte;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.available += bytes.len();
    }

    fn pop_into(&mut self, out: &mut [u8]) -> usize {
        let to_read = out.len().min(self.available);
        let capacity = self.capacity();
        for slot in out.iter_mut().take(to_read) {
            *slot = self.buffer[self.read_index];
            self.read_index = (self.read_index + 1) % capacity;
        }
        self.available -= to_read;
        to_read
    }
}

/// Fixed-capacity PCM byte queue between the decode path and a render device.
///
/// One writer appends decoded audio while the device's output thread drains
/// it. When full, the newest incoming bytes are discarded: `append` never
/// blocks and never grows the buffer.
#[derive(Debug)]
pub struct BoundedSampleBuffer {
    ring: Mutex<ByteRing>,
    dropped: AtomicU64,
}

impl BoundedSampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(ByteRing::new(capacity.max(1))),
            dropped: AtomicU64::new(0),
        }
    }

    /// Append `count` bytes of `bytes` starting at `offset`.
    ///
    /// Returns how many bytes were stored. Whatever does not fit is dropped
    /// and counted in [`dropped_bytes`](Self::dropped_bytes). Out-of-range
    /// `offset`/`count` are clamped to `bytes`.
    pub fn append(&self, bytes: &[u8], offset: usize, count: usize) -> usize {
        let start = offset.min(bytes.len());
        let end = start.saturating_add(count).min(bytes.len());
        let incoming = &bytes[start..end];
        if incoming.is_empty() {
            return 0;
        }

        let mut ring = self.ring.lock();
        let accepted = incoming.len().min(ring.free());
        ring.push(&incoming[..accepted]);
        drop(ring);

        let discarded = incoming.len() - accepted;
        if discarded > 0 {
            self.dropped.fetch_add(discarded as u64, Ordering::Relaxed);
            log::trace!("sample buffer full, discarded {} bytes", discarded);
        }
        accepted
    }

    /// Move up to `out.len()` bytes into `out`. Returns the number written.
    pub fn read(&self, out: &mut [u8]) -> usize {
        self.ring.lock().pop_into(out)
    }

    /// Remove and return everything currently buffered.
    pub fn drain(&self) -> Vec<u8> {
        let mut ring = self.ring.lock();
        let mut out = vec![0; ring.available];
        ring.pop_into(&mut out);
        out
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.ring.lock().available
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    /// Total bytes discarded on overflow since creation.
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        let mut ring = self.ring.lock();
        ring.write_index = 0;
        ring.read_index = 0;
        ring.available = 0;
    }
}
