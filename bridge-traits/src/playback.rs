//! Media engine bridge and the raw events it reports.
//!
//! The host owns the physical player (ExoPlayer, AVPlayer, a desktop decoder
//! pipeline). The core drives it through [`MediaEngine`] and learns about its
//! transport changes through [`EngineEvent`] values the host forwards back.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// Where and how the engine should fetch the audio for a playable.
///
/// Signed URLs expire, so hosts refresh this independently of the rest of the
/// audiobook metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaRequest {
    /// Stream or file URI handed to the engine.
    pub uri: String,
    /// Extra HTTP headers (e.g. `Authorization`).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl MediaRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Determine whether the request points at remote content.
    pub fn is_remote(&self) -> bool {
        self.uri.starts_with("http://") || self.uri.starts_with("https://")
    }
}

/// Request describing the session a host engine should provision.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    /// Media to load.
    pub media: MediaRequest,
    /// Position to start from.
    pub start_position: Duration,
    /// Initial playback rate.
    pub speed: f32,
}

impl PlaybackRequest {
    pub fn new(media: MediaRequest) -> Self {
        Self {
            media,
            start_position: Duration::ZERO,
            speed: 1.0,
        }
    }

    pub fn with_start_position(mut self, position: Duration) -> Self {
        self.start_position = position;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Unique identifier for playback sessions managed by a host engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport state as the engine reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    Idle,
    Playing,
    Paused,
}

/// Raw notifications emitted by the host engine.
///
/// These carry no interpretation; the core turns them into commands.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine finished initialising and accepts commands.
    Ready,
    /// Transport switched between idle, playing and paused.
    TransportChanged(TransportState),
    /// Buffering started (`true`) or finished (`false`).
    LoadingChanged(bool),
    /// Periodic position report. `duration` is the engine's view of the total
    /// length, when it knows it.
    Position {
        position: Duration,
        duration: Option<Duration>,
    },
    /// Playback rate applied by the engine.
    SpeedChanged(f32),
    /// Position jumped; any pending seek has been resolved.
    Discontinuity,
    /// The end of the media was reached.
    Ended,
    /// Unrecoverable engine failure.
    Failed {
        message: String,
        /// `true` when the audio renderer (sink/decoder) failed rather than the
        /// source.
        renderer: bool,
    },
}

/// The physical player the host provides.
#[async_trait::async_trait]
pub trait MediaEngine: Send + Sync {
    /// Prepare a playback session. Returns an identifier subsequent control
    /// calls reference.
    async fn prepare(&self, request: PlaybackRequest) -> Result<PlaybackSessionId>;

    /// Begin or resume playback.
    async fn play(&self, session: PlaybackSessionId) -> Result<()>;

    /// Pause playback without releasing the session.
    async fn pause(&self, session: PlaybackSessionId) -> Result<()>;

    /// Seek to an absolute position within the media.
    async fn seek(&self, session: PlaybackSessionId, position: Duration) -> Result<()>;

    /// Change the playback rate.
    async fn set_speed(&self, session: PlaybackSessionId, speed: f32) -> Result<()>;

    /// Release resources associated with a playback session.
    async fn release(&self, session: PlaybackSessionId) -> Result<()>;
}
