//! # audio-endpoint-virtual
//!
//! Software sound devices for audio-endpoint-core.
//!
//! Provides:
//! - `VirtualCaptureHost`: microphones that deliver a tone, silence, or PCM
//!   pushed through a `PcmFeed`, paced in real time on their own threads
//! - `VirtualRenderHost`: speakers that drain the playback buffer in real
//!   time and record what they played into a `RenderedAudio`
//!
//! Useful on hosts without audio hardware and for driving a full endpoint in
//! tests.
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use audio_endpoint_core::{AudioEndpoint, EndpointConfiguration, StandardAudioCodec};
//! use audio_endpoint_virtual::{CaptureSignal, VirtualCaptureHost, VirtualRenderHost};
//!
//! let mic = VirtualCaptureHost::new().with_signal(CaptureSignal::Tone {
//!     frequency_hz: 440.0,
//!     amplitude: 0.3,
//! });
//! let endpoint = AudioEndpoint::new(
//!     EndpointConfiguration::default(),
//!     Arc::new(StandardAudioCodec::new()),
//!     Arc::new(mic),
//!     Arc::new(VirtualRenderHost::new()),
//! )?;
//! endpoint.start();
//! ```

pub mod capture;
pub mod devices;
pub mod error;
pub mod render;
pub mod signal_source;

pub use capture::{VirtualCaptureDevice, VirtualCaptureHost};
pub use devices::{DeviceList, VirtualDeviceInfo};
pub use error::VirtualDeviceError;
pub use render::{RenderedAudio, VirtualRenderDevice, VirtualRenderHost};
pub use signal_source::{CaptureSignal, PcmFeed};
