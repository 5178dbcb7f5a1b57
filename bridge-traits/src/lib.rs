//! # Host Bridge Traits
//!
//! Contracts between the audiobook core and the collaborators a host
//! application provides.
//!
//! ## Overview
//!
//! The core never decodes audio, downloads files or negotiates DRM licenses
//! itself. Those subsystems live on the host side and talk to the core through
//! the types in this crate:
//!
//! - [`MediaEngine`](playback::MediaEngine) - the physical player. Accepts
//!   transport commands and reports raw [`EngineEvent`](playback::EngineEvent)s.
//! - [`DownloadEvent`](download::DownloadEvent) - progress/completion reports
//!   from the download subsystem, keyed by URL.
//! - [`DrmEvent`](drm::DrmEvent) - license lifecycle reports from the DRM layer.
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert their native errors to `BridgeError` and keep
//! the message actionable.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` so a single implementation can be shared
//! across the store's writer and the event engine's delivery task.
//!
//! ## Examples
//!
//! ### Implementing MediaEngine
//!
//! ```ignore
//! use bridge_traits::playback::{MediaEngine, PlaybackRequest, PlaybackSessionId};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//! use std::time::Duration;
//!
//! pub struct ExoBridge { /* JNI handle */ }
//!
//! #[async_trait]
//! impl MediaEngine for ExoBridge {
//!     async fn prepare(&self, request: PlaybackRequest) -> Result<PlaybackSessionId> {
//!         todo!()
//!     }
//!     // ...
//! }
//! ```

pub mod download;
pub mod drm;
pub mod error;
pub mod playback;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use download::DownloadEvent;
pub use drm::{DrmEvent, DrmSessionInfo};
pub use playback::{
    EngineEvent, MediaEngine, MediaRequest, PlaybackRequest, PlaybackSessionId, TransportState,
};
pub use time::{Clock, ConsoleLogger, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
