//! # Listeners
//!
//! Callback interfaces fed by the event engine, and the registry that owns
//! them.
//!
//! Every method has an empty default, so implementors override only what
//! they observe. Callbacks run on the engine's delivery task and must not
//! block; they may dispatch new commands to the store.

use crate::event::PlayerEvent;
use core_playback::{
    AudioPlayable, DownloadProgress, DrmState, PlaybackInfo, PlayerError, Snapshot,
};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Full-detail playback observer.
#[allow(unused_variables)]
pub trait PlayerListener: Send + Sync {
    /// Periodic telemetry sample of the last snapshot the engine processed.
    fn on_poll(&self, state: &Snapshot) {}

    fn on_new_audiobook(&self, state: &Snapshot) {}

    fn on_loading_start(&self, state: &Snapshot) {}

    fn on_loading_end(&self, state: &Snapshot) {}

    fn on_play(&self, state: &Snapshot) {}

    fn on_pause(&self, state: &Snapshot) {}

    fn on_stop(&self, state: &Snapshot) {}

    fn on_content_ended(&self, state: &Snapshot) {}

    /// A seek began.
    fn on_discontinuity(&self, state: &Snapshot) {}

    fn on_fast_forward(&self, before: &Snapshot, after: &Snapshot) {}

    fn on_rewind(&self, before: &Snapshot, after: &Snapshot) {}

    fn on_skip_to_next(&self, before: &Snapshot, after: &Snapshot) {}

    fn on_skip_to_previous(&self, before: &Snapshot, after: &Snapshot) {}

    /// A seek that was not a fast-forward, rewind or chapter skip resolved.
    fn on_seek(&self, target: Option<Duration>, before: &Snapshot, after: &Snapshot) {}

    fn on_speed_change(&self, state: &Snapshot, old: f32, new: f32) {}

    fn on_skip_distance_change(&self, state: &Snapshot, old: Duration, new: Duration) {}

    fn on_custom_action(&self, name: &str, state: &Snapshot) {}

    fn on_error(&self, error: &PlayerError, state: &Snapshot) {}

    fn on_download_update(&self, progress: &DownloadProgress, state: &Snapshot) {}

    fn on_download_removed(&self, url: &str, state: &Snapshot) {}

    fn on_drm_state_change(&self, old: &DrmState, new: &DrmState) {}

    fn on_engine_ready(&self, state: &Snapshot) {}
}

/// Narrow observer for hosts that only track the listening session.
#[allow(unused_variables)]
pub trait SessionListener: Send + Sync {
    fn on_new_audiobook(&self, audio_playable: &AudioPlayable) {}

    fn on_playback_state_change(
        &self,
        info: &PlaybackInfo,
        audio_playable: &AudioPlayable,
        chapter_index: usize,
    ) {
    }

    fn on_playback_end(&self) {}
}

/// Listeners registered with one engine.
#[derive(Default)]
pub struct ListenerRegistry {
    players: RwLock<Vec<Arc<dyn PlayerListener>>>,
    sessions: RwLock<Vec<Arc<dyn SessionListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player_listener(&self, listener: Arc<dyn PlayerListener>) {
        self.players.write().push(listener);
    }

    /// Returns `true` if the listener was registered.
    pub fn remove_player_listener(&self, listener: &Arc<dyn PlayerListener>) -> bool {
        let mut players = self.players.write();
        let before = players.len();
        players.retain(|existing| !Arc::ptr_eq(existing, listener));
        players.len() != before
    }

    pub fn add_session_listener(&self, listener: Arc<dyn SessionListener>) {
        self.sessions.write().push(listener);
    }

    pub fn remove_session_listener(&self, listener: &Arc<dyn SessionListener>) -> bool {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|existing| !Arc::ptr_eq(existing, listener));
        sessions.len() != before
    }

    pub fn clear(&self) {
        self.players.write().clear();
        self.sessions.write().clear();
    }

    pub fn len(&self) -> usize {
        self.players.read().len() + self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn poll(&self, state: &Snapshot) {
        for listener in self.player_listeners() {
            listener.on_poll(state);
        }
    }

    /// Invokes the callbacks matching `event`.
    ///
    /// Listeners are snapshotted first, so a callback may add or remove
    /// listeners without deadlocking.
    pub fn dispatch(&self, event: &PlayerEvent) {
        let players = self.player_listeners();
        let sessions = self.session_listeners();

        match event {
            PlayerEvent::NewAudiobook {
                audio_playable,
                state,
            } => {
                players.iter().for_each(|l| l.on_new_audiobook(state));
                sessions.iter().for_each(|l| l.on_new_audiobook(audio_playable));
            }
            PlayerEvent::LoadingStarted { state } => {
                players.iter().for_each(|l| l.on_loading_start(state))
            }
            PlayerEvent::LoadingEnded { state } => {
                players.iter().for_each(|l| l.on_loading_end(state))
            }
            PlayerEvent::Played { state } => players.iter().for_each(|l| l.on_play(state)),
            PlayerEvent::Paused { state } => players.iter().for_each(|l| l.on_pause(state)),
            PlayerEvent::Stopped { state } => players.iter().for_each(|l| l.on_stop(state)),
            PlayerEvent::ContentEnded { state } => {
                players.iter().for_each(|l| l.on_content_ended(state));
                sessions.iter().for_each(|l| l.on_playback_end());
            }
            PlayerEvent::Discontinuity { state } => {
                players.iter().for_each(|l| l.on_discontinuity(state))
            }
            PlayerEvent::FastForwarded { before, after } => {
                players.iter().for_each(|l| l.on_fast_forward(before, after))
            }
            PlayerEvent::Rewound { before, after } => {
                players.iter().for_each(|l| l.on_rewind(before, after))
            }
            PlayerEvent::SkippedToNext { before, after } => {
                players.iter().for_each(|l| l.on_skip_to_next(before, after))
            }
            PlayerEvent::SkippedToPrevious { before, after } => players
                .iter()
                .for_each(|l| l.on_skip_to_previous(before, after)),
            PlayerEvent::Seeked {
                target,
                before,
                after,
            } => players.iter().for_each(|l| l.on_seek(*target, before, after)),
            PlayerEvent::PlaybackStateUpdated {
                info,
                chapter_index,
            } => sessions.iter().for_each(|l| {
                l.on_playback_state_change(info, &info.audio_playable, *chapter_index)
            }),
            PlayerEvent::SpeedChanged { state, old, new } => players
                .iter()
                .for_each(|l| l.on_speed_change(state, *old, *new)),
            PlayerEvent::SkipDistanceChanged { state, old, new } => players
                .iter()
                .for_each(|l| l.on_skip_distance_change(state, *old, *new)),
            PlayerEvent::CustomAction { name, state } => {
                players.iter().for_each(|l| l.on_custom_action(name, state))
            }
            PlayerEvent::DownloadUpdated { progress, state } => players
                .iter()
                .for_each(|l| l.on_download_update(progress, state)),
            PlayerEvent::DownloadRemoved { url, state } => {
                players.iter().for_each(|l| l.on_download_removed(url, state))
            }
            PlayerEvent::DrmStateChanged { old, new } => {
                players.iter().for_each(|l| l.on_drm_state_change(old, new))
            }
            PlayerEvent::EngineReady { state } => {
                players.iter().for_each(|l| l.on_engine_ready(state))
            }
            PlayerEvent::Error { error, state } => {
                players.iter().for_each(|l| l.on_error(error, state))
            }
        }
    }

    fn player_listeners(&self) -> Vec<Arc<dyn PlayerListener>> {
        self.players.read().clone()
    }

    fn session_listeners(&self) -> Vec<Arc<dyn SessionListener>> {
        self.sessions.read().clone()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("players", &self.players.read().len())
            .field("sessions", &self.sessions.read().len())
            .finish()
    }
}
