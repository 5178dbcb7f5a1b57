//! # Playback State Machine
//!
//! Event-sourced playback state for the audiobook player.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Command`]: the closed set of inputs, from engine reports to user intents
//! - [`Snapshot`]: one immutable picture of playback, download and DRM state
//! - [`Reducer`]: the transition function `(snapshot, command) -> snapshot`
//! - [`Store`]: the single writer that owns the live snapshot and publishes
//!   every transition to subscribers
//! - [`ErrorCode`]: the stable error taxonomy reported downstream
//!
//! ## Usage
//!
//! ```
//! use bridge_traits::MediaRequest;
//! use core_playback::{AudioPlayable, Chapter, Command, DiscrepancyTolerance, Store};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let store = Store::default();
//! store.init_default();
//!
//! let book = AudioPlayable::new("b1", "Dune", MediaRequest::new("file:///dune.m4b"))
//!     .with_chapters(vec![Chapter::new(Duration::ZERO, Duration::from_secs(600))]);
//!
//! store
//!     .dispatch(Command::NewAudioPlayable {
//!         audio_playable: Arc::new(book),
//!         max_discrepancy: DiscrepancyTolerance::Disabled,
//!         initial_offset: Duration::ZERO,
//!     })
//!     .unwrap();
//!
//! assert!(store.current().unwrap().has_session());
//! ```

pub mod action;
pub mod codes;
pub mod error;
pub mod model;
pub mod reducer;
pub mod store;

pub use action::{Command, MediaAction};
pub use codes::{ErrorCode, ErrorFamily, PlayerError};
pub use error::{PlaybackError, Result};
pub use model::{
    AudioPlayable, Chapter, ControlState, DiagnosticTrace, DownloadProgress, DownloadState,
    DrmInfo, DrmState, InternalState, PlaybackInfo, PlaybackState, Progress, SeekIntent, Snapshot,
};
pub use reducer::{DiscrepancyTolerance, Reducer};
pub use store::{SnapshotStream, Store};
