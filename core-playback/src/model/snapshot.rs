//! The authoritative player state.

use super::download::DownloadProgress;
use super::drm::DrmState;
use super::playback::PlaybackInfo;
use crate::action::Command;
use crate::codes::PlayerError;
use std::collections::VecDeque;

/// Number of commands a trace keeps unless configured otherwise.
pub const DEFAULT_TRACE_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InternalState {
    pub engine_ready: bool,
}

/// Bounded history of the commands that produced a snapshot, most recent
/// first, plus a counter of every transition applied.
///
/// Debugging aid only. It takes no part in snapshot equality.
#[derive(Debug, Clone)]
pub struct DiagnosticTrace {
    entries: VecDeque<Command>,
    capacity: usize,
    update_count: u64,
}

impl DiagnosticTrace {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            update_count: 0,
        }
    }

    pub(crate) fn record(&mut self, command: Command) {
        self.entries.push_front(command);
        self.entries.truncate(self.capacity);
        self.update_count += 1;
    }

    pub fn entries(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter()
    }

    /// Labels of the retained commands, most recent first.
    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(Command::label).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Transitions applied since the store was seeded, including those that
    /// fell out of the bounded history.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

impl Default for DiagnosticTrace {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRACE_CAPACITY)
    }
}

/// One complete picture of playback, download and DRM state.
///
/// Snapshots are never mutated once published; every transition produces a
/// new one.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// `None` until the first audiobook is loaded.
    pub playback_info: Option<PlaybackInfo>,
    pub downloads: Vec<DownloadProgress>,
    pub drm_state: DrmState,
    pub internal_state: InternalState,
    /// Soft error raised by the transition that produced this snapshot.
    pub error: Option<PlayerError>,
    pub trace: DiagnosticTrace,
}

impl Snapshot {
    pub fn new(trace_capacity: usize) -> Self {
        Self {
            trace: DiagnosticTrace::with_capacity(trace_capacity),
            ..Self::default()
        }
    }

    pub fn has_session(&self) -> bool {
        self.playback_info.is_some()
    }

    pub fn download(&self, url: &str) -> Option<&DownloadProgress> {
        self.downloads.iter().find(|download| download.url == url)
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.playback_info == other.playback_info
            && self.downloads == other.downloads
            && self.drm_state == other.drm_state
            && self.internal_state == other.internal_state
            && self.error == other.error
    }
}
