//! Per-session playback state.

use super::audiobook::AudioPlayable;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Transport state of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    Playing,
    Paused,
    /// Nothing is playing. Reported by the engine when it is stopped.
    #[default]
    Idle,
}

/// Where the listener is inside the audiobook.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub current_chapter_index: usize,
    pub position_in_duration: Duration,
    /// Total length as reported by the engine, once known.
    pub total_player_duration: Option<Duration>,
    /// Total length as declared by the chapter metadata.
    pub total_chapters_duration: Duration,
}

/// Describes the command currently in flight.
///
/// Replaced as a whole by every command that issues one, so at most one of
/// the seek-intent flags is ever raised.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlState {
    pub is_starting_new_audio_playable: bool,
    pub is_stopping: bool,
    pub is_fast_forwarding: bool,
    pub is_rewinding: bool,
    pub is_next_chapter: bool,
    pub is_prev_chapter: bool,
    pub is_custom_action: bool,
    pub is_seeking: bool,
    pub has_content_ended: bool,
    pub is_playback_state_updating: bool,
    pub seek_target: Option<Duration>,
    pub updated_chapter_index: usize,
    pub custom_action_name: Option<String>,
}

/// Which kind of seek a control state was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeekIntent {
    FastForward,
    Rewind,
    NextChapter,
    PreviousChapter,
    Arbitrary,
}

impl ControlState {
    pub fn starting_new_audio_playable() -> Self {
        Self {
            is_starting_new_audio_playable: true,
            ..Self::default()
        }
    }

    pub fn stopping() -> Self {
        Self {
            is_stopping: true,
            ..Self::default()
        }
    }

    pub fn content_ended() -> Self {
        Self {
            has_content_ended: true,
            ..Self::default()
        }
    }

    pub fn custom_action(name: impl Into<String>) -> Self {
        Self {
            is_custom_action: true,
            custom_action_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// An in-flight seek of the given kind.
    pub fn seeking(intent: SeekIntent, target: Option<Duration>) -> Self {
        let mut state = Self {
            is_seeking: true,
            seek_target: target,
            ..Self::default()
        };
        match intent {
            SeekIntent::FastForward => state.is_fast_forwarding = true,
            SeekIntent::Rewind => state.is_rewinding = true,
            SeekIntent::NextChapter => state.is_next_chapter = true,
            SeekIntent::PreviousChapter => state.is_prev_chapter = true,
            SeekIntent::Arbitrary => {}
        }
        state
    }

    /// Classifies the seek this state was raised for.
    ///
    /// Flags are checked in fixed priority order: fast-forward, rewind,
    /// next chapter, previous chapter.
    pub fn seek_intent(&self) -> SeekIntent {
        if self.is_fast_forwarding {
            SeekIntent::FastForward
        } else if self.is_rewinding {
            SeekIntent::Rewind
        } else if self.is_next_chapter {
            SeekIntent::NextChapter
        } else if self.is_prev_chapter {
            SeekIntent::PreviousChapter
        } else {
            SeekIntent::Arbitrary
        }
    }
}

/// Everything known about the active playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackInfo {
    pub audio_playable: Arc<AudioPlayable>,
    pub playback_state: PlaybackState,
    pub progress: Progress,
    pub control_state: ControlState,
    pub playback_speed: f32,
    pub skip_distance: Duration,
    pub is_loading: bool,
}

impl PlaybackInfo {
    /// Chapter the listener is currently in, if the metadata has one.
    pub fn current_chapter(&self) -> Option<&super::Chapter> {
        self.audio_playable
            .chapter(self.progress.current_chapter_index)
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state == PlaybackState::Playing
    }
}
