//! Derived playback events.
//!
//! Every callback the engine fires is also published as a [`PlayerEvent`] on
//! the engine's [`EventBus`](core_runtime::events::EventBus), for consumers
//! that prefer a stream over implementing listener traits.

use core_playback::{
    AudioPlayable, DownloadProgress, DrmState, PlaybackInfo, PlayerError, Snapshot,
};
use core_runtime::events::EventSeverity;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    NewAudiobook {
        audio_playable: Arc<AudioPlayable>,
        state: Arc<Snapshot>,
    },
    LoadingStarted {
        state: Arc<Snapshot>,
    },
    LoadingEnded {
        state: Arc<Snapshot>,
    },
    Played {
        state: Arc<Snapshot>,
    },
    Paused {
        state: Arc<Snapshot>,
    },
    Stopped {
        state: Arc<Snapshot>,
    },
    ContentEnded {
        state: Arc<Snapshot>,
    },
    /// A seek began; the position is about to jump.
    Discontinuity {
        state: Arc<Snapshot>,
    },
    FastForwarded {
        before: Arc<Snapshot>,
        after: Arc<Snapshot>,
    },
    Rewound {
        before: Arc<Snapshot>,
        after: Arc<Snapshot>,
    },
    SkippedToNext {
        before: Arc<Snapshot>,
        after: Arc<Snapshot>,
    },
    SkippedToPrevious {
        before: Arc<Snapshot>,
        after: Arc<Snapshot>,
    },
    Seeked {
        target: Option<Duration>,
        before: Arc<Snapshot>,
        after: Arc<Snapshot>,
    },
    /// Progress notification for session listeners.
    PlaybackStateUpdated {
        info: PlaybackInfo,
        chapter_index: usize,
    },
    SpeedChanged {
        state: Arc<Snapshot>,
        old: f32,
        new: f32,
    },
    SkipDistanceChanged {
        state: Arc<Snapshot>,
        old: Duration,
        new: Duration,
    },
    CustomAction {
        name: String,
        state: Arc<Snapshot>,
    },
    DownloadUpdated {
        progress: DownloadProgress,
        state: Arc<Snapshot>,
    },
    DownloadRemoved {
        url: String,
        state: Arc<Snapshot>,
    },
    DrmStateChanged {
        old: DrmState,
        new: DrmState,
    },
    EngineReady {
        state: Arc<Snapshot>,
    },
    Error {
        error: PlayerError,
        state: Arc<Snapshot>,
    },
}

impl PlayerEvent {
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::Error { .. } => EventSeverity::Error,
            PlayerEvent::DrmStateChanged { new, .. } => match new {
                DrmState::LicenseError { .. } | DrmState::LicenseExpired(_) => {
                    EventSeverity::Warning
                }
                _ => EventSeverity::Info,
            },
            PlayerEvent::PlaybackStateUpdated { .. }
            | PlayerEvent::DownloadUpdated { .. }
            | PlayerEvent::LoadingStarted { .. }
            | PlayerEvent::LoadingEnded { .. }
            | PlayerEvent::Discontinuity { .. } => EventSeverity::Debug,
            _ => EventSeverity::Info,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::NewAudiobook { .. } => "new_audiobook",
            PlayerEvent::LoadingStarted { .. } => "loading_start",
            PlayerEvent::LoadingEnded { .. } => "loading_end",
            PlayerEvent::Played { .. } => "play",
            PlayerEvent::Paused { .. } => "pause",
            PlayerEvent::Stopped { .. } => "stop",
            PlayerEvent::ContentEnded { .. } => "content_ended",
            PlayerEvent::Discontinuity { .. } => "discontinuity",
            PlayerEvent::FastForwarded { .. } => "fast_forward",
            PlayerEvent::Rewound { .. } => "rewind",
            PlayerEvent::SkippedToNext { .. } => "skip_to_next",
            PlayerEvent::SkippedToPrevious { .. } => "skip_to_previous",
            PlayerEvent::Seeked { .. } => "seek",
            PlayerEvent::PlaybackStateUpdated { .. } => "playback_state_change",
            PlayerEvent::SpeedChanged { .. } => "speed_change",
            PlayerEvent::SkipDistanceChanged { .. } => "skip_distance_change",
            PlayerEvent::CustomAction { .. } => "custom_action",
            PlayerEvent::DownloadUpdated { .. } => "download_update",
            PlayerEvent::DownloadRemoved { .. } => "download_removed",
            PlayerEvent::DrmStateChanged { .. } => "drm_state_change",
            PlayerEvent::EngineReady { .. } => "engine_ready",
            PlayerEvent::Error { .. } => "error",
        }
    }

    pub fn description(&self) -> String {
        match self {
            PlayerEvent::NewAudiobook { audio_playable, .. } => {
                format!("Loaded \"{}\"", audio_playable.title)
            }
            PlayerEvent::Seeked { target, .. } => match target {
                Some(target) => format!("Seeked to {:.1}s", target.as_secs_f64()),
                None => "Seeked".to_string(),
            },
            PlayerEvent::PlaybackStateUpdated { chapter_index, .. } => {
                format!("Playback state updated (chapter {})", chapter_index)
            }
            PlayerEvent::SpeedChanged { old, new, .. } => {
                format!("Speed changed from {}x to {}x", old, new)
            }
            PlayerEvent::SkipDistanceChanged { old, new, .. } => format!(
                "Skip distance changed from {}s to {}s",
                old.as_secs(),
                new.as_secs()
            ),
            PlayerEvent::CustomAction { name, .. } => format!("Custom action: {}", name),
            PlayerEvent::DownloadUpdated { progress, .. } => {
                format!("Download {} updated", progress.id)
            }
            PlayerEvent::DownloadRemoved { url, .. } => format!("Download removed: {}", url),
            PlayerEvent::DrmStateChanged { old, new } => {
                format!("DRM {} -> {}", old.label(), new.label())
            }
            PlayerEvent::Error { error, .. } => format!("Error: {}", error),
            other => other.name().replace('_', " "),
        }
    }
}
