use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of endpoint counters, for debugging a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointDiagnostics {
    pub capture_callback_count: u64,
    pub encoded_frame_count: u64,
    pub encoded_bytes_total: u64,
    pub decoded_frame_count: u64,
    pub playback_bytes_accepted: u64,
    pub playback_bytes_dropped: u64,
    pub capture_reinit_count: u64,
    pub render_reinit_count: u64,
}

/// Live counters, updated from device callbacks and caller threads alike.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticsCounters {
    pub capture_callbacks: AtomicU64,
    pub encoded_frames: AtomicU64,
    pub encoded_bytes: AtomicU64,
    pub decoded_frames: AtomicU64,
    pub playback_accepted: AtomicU64,
    pub playback_dropped: AtomicU64,
    pub capture_reinits: AtomicU64,
    pub render_reinits: AtomicU64,
}

impl DiagnosticsCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, amount: usize) {
        counter.fetch_add(amount as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EndpointDiagnostics {
        EndpointDiagnostics {
            capture_callback_count: self.capture_callbacks.load(Ordering::Relaxed),
            encoded_frame_count: self.encoded_frames.load(Ordering::Relaxed),
            encoded_bytes_total: self.encoded_bytes.load(Ordering::Relaxed),
            decoded_frame_count: self.decoded_frames.load(Ordering::Relaxed),
            playback_bytes_accepted: self.playback_accepted.load(Ordering::Relaxed),
            playback_bytes_dropped: self.playback_dropped.load(Ordering::Relaxed),
            capture_reinit_count: self.capture_reinits.load(Ordering::Relaxed),
            render_reinit_count: self.render_reinits.load(Ordering::Relaxed),
        }
    }
}
