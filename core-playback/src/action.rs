//! # Commands
//!
//! The closed set of values the reducer accepts. Commands are plain data;
//! every behaviour lives in [`Reducer`](crate::reducer::Reducer).
//!
//! Commands are grouped by where they come from:
//!
//! - **Engine transport**: what the host media engine reports.
//! - **User control**: intents issued through the player API.
//! - **Lifecycle**: sessions, engine readiness, metadata refreshes.
//! - **Downloads** and **DRM**: reports from those host subsystems.
//! - **Errors**: explicit error injection and clearing.

use crate::codes::PlayerError;
use crate::error::PlaybackError;
use crate::model::{AudioPlayable, DownloadProgress, DrmInfo, PlaybackState};
use crate::reducer::DiscrepancyTolerance;
use bridge_traits::MediaRequest;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ========================================================================
    // Engine transport
    // ========================================================================
    PlayerStateChanged(PlaybackState),
    SpeedChanged(f32),
    PlaybackProgress {
        position: Duration,
        /// The engine's view of the total length, if it has one.
        duration: Option<Duration>,
    },
    LoadingChanged(bool),
    ContentEnded,
    /// Cross-subsystem progress notification. `chapter_index` is `None` when
    /// the sender does not know the chapter.
    UpdateProgress {
        is_updated: bool,
        chapter_index: Option<usize>,
    },

    // ========================================================================
    // User control
    // ========================================================================
    /// Begins (`is_seeking: true`) or resolves (`is_seeking: false`) a seek.
    Seek {
        is_seeking: bool,
        target: Option<Duration>,
    },
    FastForward {
        target: Duration,
    },
    Rewind {
        target: Duration,
    },
    SkipNext {
        target: Duration,
    },
    SkipPrev {
        target: Duration,
    },
    CustomAction {
        name: String,
    },
    SkipDistanceChanged(Duration),

    // ========================================================================
    // Lifecycle
    // ========================================================================
    NewAudioPlayable {
        audio_playable: Arc<AudioPlayable>,
        max_discrepancy: DiscrepancyTolerance,
        initial_offset: Duration,
    },
    EngineReady(bool),
    MetadataUpdate(Arc<AudioPlayable>),
    MediaRequestUpdate(MediaRequest),

    // ========================================================================
    // Downloads
    // ========================================================================
    UpdateDownload(DownloadProgress),
    StopTrackingDownload(DownloadProgress),

    // ========================================================================
    // DRM
    // ========================================================================
    DrmLicenseOpening(DrmInfo),
    DrmLicenseAcquired(DrmInfo),
    DrmLicenseExpired(DrmInfo),
    DrmLicenseUsable(DrmInfo),
    DrmLicenseReleased(DrmInfo),
    DrmLicenseError {
        info: DrmInfo,
        message: String,
    },

    // ========================================================================
    // Errors
    // ========================================================================
    Error(PlayerError),
    ClearError,
}

impl Command {
    /// Human-readable name recorded in the diagnostic trace.
    pub fn label(&self) -> &'static str {
        match self {
            Command::PlayerStateChanged(_) => "PlayerStateChanged",
            Command::SpeedChanged(_) => "SpeedChanged",
            Command::PlaybackProgress { .. } => "PlaybackProgress",
            Command::LoadingChanged(_) => "LoadingChanged",
            Command::ContentEnded => "ContentEnded",
            Command::UpdateProgress { .. } => "UpdateProgress",
            Command::Seek { .. } => "Seek",
            Command::FastForward { .. } => "FastForward",
            Command::Rewind { .. } => "Rewind",
            Command::SkipNext { .. } => "SkipNext",
            Command::SkipPrev { .. } => "SkipPrev",
            Command::CustomAction { .. } => "CustomAction",
            Command::SkipDistanceChanged(_) => "SkipDistanceChanged",
            Command::NewAudioPlayable { .. } => "NewAudioPlayable",
            Command::EngineReady(_) => "EngineReady",
            Command::MetadataUpdate(_) => "MetadataUpdate",
            Command::MediaRequestUpdate(_) => "MediaRequestUpdate",
            Command::UpdateDownload(_) => "UpdateDownload",
            Command::StopTrackingDownload(_) => "StopTrackingDownload",
            Command::DrmLicenseOpening(_) => "DrmLicenseOpening",
            Command::DrmLicenseAcquired(_) => "DrmLicenseAcquired",
            Command::DrmLicenseExpired(_) => "DrmLicenseExpired",
            Command::DrmLicenseUsable(_) => "DrmLicenseUsable",
            Command::DrmLicenseReleased(_) => "DrmLicenseReleased",
            Command::DrmLicenseError { .. } => "DrmLicenseError",
            Command::Error(_) => "Error",
            Command::ClearError => "ClearError",
        }
    }

    /// Whether the command only makes sense against an active session.
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Command::PlayerStateChanged(_)
                | Command::SpeedChanged(_)
                | Command::PlaybackProgress { .. }
                | Command::LoadingChanged(_)
                | Command::ContentEnded
                | Command::UpdateProgress { .. }
                | Command::Seek { .. }
                | Command::FastForward { .. }
                | Command::Rewind { .. }
                | Command::SkipNext { .. }
                | Command::SkipPrev { .. }
                | Command::CustomAction { .. }
                | Command::SkipDistanceChanged(_)
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transport actions a host media session (lock screen, headset buttons,
/// car displays) hands over by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaAction {
    Play,
    Pause,
    Stop,
    FastForward,
    Rewind,
    SkipToNext,
    SkipToPrevious,
}

impl MediaAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaAction::Play => "play",
            MediaAction::Pause => "pause",
            MediaAction::Stop => "stop",
            MediaAction::FastForward => "fast_forward",
            MediaAction::Rewind => "rewind",
            MediaAction::SkipToNext => "skip_to_next",
            MediaAction::SkipToPrevious => "skip_to_previous",
        }
    }
}

impl FromStr for MediaAction {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" => Ok(MediaAction::Play),
            "pause" => Ok(MediaAction::Pause),
            "stop" => Ok(MediaAction::Stop),
            "fast_forward" => Ok(MediaAction::FastForward),
            "rewind" => Ok(MediaAction::Rewind),
            "skip_to_next" => Ok(MediaAction::SkipToNext),
            "skip_to_previous" => Ok(MediaAction::SkipToPrevious),
            _ => Err(PlaybackError::UnrecognizedCommand(s.to_string())),
        }
    }
}

impl fmt::Display for MediaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_actions_parse_case_insensitively() {
        assert_eq!("PLAY".parse::<MediaAction>().unwrap(), MediaAction::Play);
        assert_eq!(
            " skip_to_previous ".parse::<MediaAction>().unwrap(),
            MediaAction::SkipToPrevious
        );
        for action in [
            MediaAction::Play,
            MediaAction::Pause,
            MediaAction::Stop,
            MediaAction::FastForward,
            MediaAction::Rewind,
            MediaAction::SkipToNext,
            MediaAction::SkipToPrevious,
        ] {
            assert_eq!(action.as_str().parse::<MediaAction>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_media_action_is_unrecognized() {
        let err = "shuffle".parse::<MediaAction>().unwrap_err();
        assert!(matches!(err, PlaybackError::UnrecognizedCommand(ref name) if name == "shuffle"));
        assert!(err.is_contract_violation());
    }

    #[test]
    fn session_requirement() {
        assert!(Command::ContentEnded.requires_session());
        assert!(Command::Seek {
            is_seeking: false,
            target: None
        }
        .requires_session());
        assert!(!Command::EngineReady(true).requires_session());
        assert!(!Command::ClearError.requires_session());
        assert!(!Command::MediaRequestUpdate(MediaRequest::default()).requires_session());
    }

    #[test]
    fn labels_match_variant_names() {
        assert_eq!(Command::SkipPrev { target: Duration::ZERO }.label(), "SkipPrev");
        assert_eq!(Command::SpeedChanged(1.5).to_string(), "SpeedChanged");
    }
}
