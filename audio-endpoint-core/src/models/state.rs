/// Lifecycle flags of one pipeline (capture or playback).
///
/// State transitions:
/// ```text
/// unstarted → started ⇄ paused
///     ↓          ↓        ↓
///   closed ←─────┴────────┘   (terminal)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineState {
    started: bool,
    paused: bool,
    closed: bool,
}

/// Coarse view of [`PipelineState`] for callers that want a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Unstarted,
    Started,
    Paused,
    Closed,
}

impl PipelineState {
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Paused only counts while started and not closed.
    pub fn is_paused(&self) -> bool {
        self.paused && self.started && !self.closed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Started, not paused and not closed: the device should be running.
    pub fn is_running(&self) -> bool {
        self.started && !self.paused && !self.closed
    }

    pub fn phase(&self) -> PipelinePhase {
        if self.closed {
            PipelinePhase::Closed
        } else if self.is_paused() {
            PipelinePhase::Paused
        } else if self.started {
            PipelinePhase::Started
        } else {
            PipelinePhase::Unstarted
        }
    }

    /// Returns `true` if the flag changed.
    pub fn mark_started(&mut self) -> bool {
        if self.started || self.closed {
            return false;
        }
        self.started = true;
        true
    }

    /// Returns `true` if the flag changed.
    pub fn mark_paused(&mut self) -> bool {
        if !self.started || self.paused || self.closed {
            return false;
        }
        self.paused = true;
        true
    }

    /// Returns `true` if the flag changed.
    pub fn mark_resumed(&mut self) -> bool {
        if !self.paused || self.closed {
            return false;
        }
        self.paused = false;
        true
    }

    /// Returns `true` if the flag changed. Closing is irreversible.
    pub fn mark_closed(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        true
    }
}
