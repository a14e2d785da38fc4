//! # audio-endpoint-core
//!
//! Platform-agnostic core of a device-backed audio endpoint.
//!
//! An [`AudioEndpoint`] sits between a media session and the local sound
//! hardware. Captured microphone PCM is encoded with the negotiated source
//! format and published as [`EncodedAudioFrame`]s; frames received from the
//! remote side are decoded and queued for the speaker. Device backends
//! implement [`CaptureDeviceHost`] and [`RenderDeviceHost`] and plug into the
//! endpoint; `audio-endpoint-virtual` provides a software one.
//!
//! ## Architecture
//!
//! ```text
//! audio-endpoint-core (this crate)
//! ├── traits/       ← CaptureDeviceHost, RenderDeviceHost, AudioCodec
//! ├── models/       ← EndpointError, AudioFormat, PipelineState, EndpointConfiguration, frames
//! ├── codecs/       ← G.711 µ-law/A-law, StandardAudioCodec
//! ├── processing/   ← BoundedSampleBuffer, PCM conversion
//! └── session/      ← AudioEndpoint, capture/playback pipelines, FormatManager, signals
//! ```

pub mod codecs;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use codecs::standard::StandardAudioCodec;
pub use models::audio_models::{AudioCodecKind, AudioFormat, DeviceFormat, DeviceIndex};
pub use models::config::EndpointConfiguration;
pub use models::diagnostics::EndpointDiagnostics;
pub use models::error::EndpointError;
pub use models::frame::{EncodedAudioFrame, EncodedSample, RawRtpAudio};
pub use models::state::{PipelinePhase, PipelineState};
pub use processing::sample_buffer::BoundedSampleBuffer;
pub use session::endpoint::AudioEndpoint;
pub use session::format_manager::FormatManager;
pub use session::signal::{Signal, SubscriptionId};
pub use session::signals::EndpointSignals;
pub use traits::capture_device::{
    CaptureDevice, CaptureDeviceHost, CaptureDeviceParams, DataAvailableCallback,
};
pub use traits::codec::AudioCodec;
pub use traits::render_device::{RenderDevice, RenderDeviceHost};
