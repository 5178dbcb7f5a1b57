//! Snapshot data model.

pub mod audiobook;
pub mod download;
pub mod drm;
pub mod playback;
pub mod snapshot;

pub use audiobook::{AudioPlayable, Chapter};
pub use download::{DownloadProgress, DownloadState};
pub use drm::{DrmInfo, DrmState};
pub use playback::{ControlState, PlaybackInfo, PlaybackState, Progress, SeekIntent};
pub use snapshot::{DiagnosticTrace, InternalState, Snapshot, DEFAULT_TRACE_CAPACITY};
