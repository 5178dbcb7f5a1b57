//! The player façade.
//!
//! User intents are recorded in state first and then forwarded to the host
//! engine. The engine's reports come back through
//! [`AudiobookPlayer::handle_engine_event`] and settle the state (a seek, for
//! example, resolves when the engine reports a discontinuity).

use crate::error::{CoreError, Result};
use crate::PlayerDependencies;
use bridge_traits::{
    BridgeError, DownloadEvent, DrmEvent, EngineEvent, MediaRequest, PlaybackRequest,
    PlaybackSessionId, TransportState,
};
use core_events::{EventEngine, ListenerRegistry, PlayerEvent, PlayerListener, SessionListener};
use core_playback::{
    AudioPlayable, Command, DiscrepancyTolerance, DownloadProgress, DrmState, ErrorCode,
    MediaAction, PlaybackError, PlaybackInfo, PlaybackState, PlayerError, Snapshot, Store,
};
use core_runtime::config::MAX_PLAYBACK_SPEED;
use core_runtime::events::Receiver;
use core_runtime::logging::{redact_if_sensitive, strip_path};
use core_runtime::PlayerConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How far into a chapter skip-to-previous restarts the chapter instead of
/// moving to the previous one.
pub const RESTART_CHAPTER_THRESHOLD: Duration = Duration::from_secs(3);

/// Primary façade exposed to host applications.
pub struct AudiobookPlayer {
    config: PlayerConfig,
    deps: PlayerDependencies,
    store: Arc<Store>,
    engine: EventEngine,
    session: Mutex<Option<PlaybackSessionId>>,
}

impl AudiobookPlayer {
    /// Creates a player with a seeded store. Call [`AudiobookPlayer::start`]
    /// to begin event delivery.
    pub fn new(config: PlayerConfig, deps: PlayerDependencies) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(Store::new(&config));
        store.init_default();
        let engine = EventEngine::new(
            Arc::clone(&store),
            Arc::new(ListenerRegistry::new()),
            &config,
        );

        Ok(Self {
            config,
            deps,
            store,
            engine,
            session: Mutex::new(None),
        })
    }

    /// Starts event delivery and the telemetry poll.
    pub fn start(&self) -> Result<()> {
        self.engine.begin(self.config.poll_interval())?;
        Ok(())
    }

    /// Stops event delivery and releases the engine session.
    pub async fn shutdown(&self) -> Result<()> {
        self.engine.destroy();
        let session = self.session.lock().take();
        if let Some(session) = session {
            self.deps.media_engine.release(session).await?;
        }
        info!("Audiobook player shut down");
        Ok(())
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        self.engine.registry()
    }

    pub fn add_player_listener(&self, listener: Arc<dyn PlayerListener>) {
        self.listeners().add_player_listener(listener);
    }

    pub fn add_session_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners().add_session_listener(listener);
    }

    /// Derived events as a broadcast stream.
    pub fn events(&self) -> Receiver<PlayerEvent> {
        self.engine.subscribe()
    }

    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        Ok(self.store.current()?)
    }

    pub fn has_engine_session(&self) -> bool {
        self.session.lock().is_some()
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Loads an audiobook using the configured discrepancy tolerance.
    pub async fn load(&self, audio_playable: AudioPlayable, initial_offset: Duration) -> Result<()> {
        let tolerance = DiscrepancyTolerance::from_secs_f64(self.config.max_discrepancy_secs);
        self.load_with_tolerance(audio_playable, initial_offset, tolerance)
            .await
    }

    /// Loads an audiobook, replacing any current session.
    #[instrument(skip(self, audio_playable), fields(id = %audio_playable.id))]
    pub async fn load_with_tolerance(
        &self,
        audio_playable: AudioPlayable,
        initial_offset: Duration,
        max_discrepancy: DiscrepancyTolerance,
    ) -> Result<()> {
        let active = self
            .store
            .current()?
            .playback_info
            .as_ref()
            .map_or(false, |info| !info.control_state.is_stopping);
        if active {
            debug!("Stopping the current audiobook before loading another");
            self.store
                .dispatch(Command::PlayerStateChanged(PlaybackState::Idle))?;
        }
        self.release_engine_session().await;

        let media = media_label(&audio_playable.request);
        let request = PlaybackRequest::new(audio_playable.request.clone())
            .with_start_position(initial_offset)
            .with_speed(self.config.default_playback_speed);

        self.store.dispatch(Command::NewAudioPlayable {
            audio_playable: Arc::new(audio_playable),
            max_discrepancy,
            initial_offset,
        })?;

        match self.deps.media_engine.prepare(request).await {
            Ok(session) => {
                *self.session.lock() = Some(session);
                info!(%media, "Audiobook loaded");
                Ok(())
            }
            Err(error) => Err(self.fail(ErrorCode::SourceUnavailable, error)),
        }
    }

    /// Stops playback and releases the engine session.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        self.require_session_state("stop")?;
        self.store
            .dispatch(Command::PlayerStateChanged(PlaybackState::Idle))?;
        self.release_engine_session().await;
        Ok(())
    }

    // ========================================================================
    // Transport
    // ========================================================================

    #[instrument(skip(self))]
    pub async fn play(&self) -> Result<()> {
        let session = self.engine_session("play")?;
        self.deps
            .media_engine
            .play(session)
            .await
            .map_err(|error| self.fail(ErrorCode::PlaybackFailed, error))
    }

    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<()> {
        let session = self.engine_session("pause")?;
        self.deps
            .media_engine
            .pause(session)
            .await
            .map_err(|error| self.fail(ErrorCode::PlaybackFailed, error))
    }

    /// Seeks to `position`, clamped to the audiobook's declared length.
    #[instrument(skip(self))]
    pub async fn seek_to(&self, position: Duration) -> Result<()> {
        let info = self.require_session_state("seek")?;
        let target = position.min(info.progress.total_chapters_duration);
        self.seek_with(
            Command::Seek {
                is_seeking: true,
                target: Some(target),
            },
            target,
        )
        .await
    }

    /// Jumps forward by the session's skip distance.
    #[instrument(skip(self))]
    pub async fn fast_forward(&self) -> Result<()> {
        let info = self.require_session_state("fast_forward")?;
        let target = info
            .progress
            .position_in_duration
            .saturating_add(info.skip_distance)
            .min(info.progress.total_chapters_duration);
        self.seek_with(Command::FastForward { target }, target).await
    }

    /// Jumps back by the session's skip distance.
    #[instrument(skip(self))]
    pub async fn rewind(&self) -> Result<()> {
        let info = self.require_session_state("rewind")?;
        let target = info
            .progress
            .position_in_duration
            .saturating_sub(info.skip_distance);
        self.seek_with(Command::Rewind { target }, target).await
    }

    /// Moves to the start of the next chapter, or restarts the last one.
    #[instrument(skip(self))]
    pub async fn skip_to_next(&self) -> Result<()> {
        let info = self.require_session_state("skip_to_next")?;
        let target = next_chapter_start(&info);
        self.seek_with(Command::SkipNext { target }, target).await
    }

    /// Restarts the current chapter, or moves to the previous one when close
    /// to the chapter start.
    #[instrument(skip(self))]
    pub async fn skip_to_previous(&self) -> Result<()> {
        let info = self.require_session_state("skip_to_previous")?;
        let target = previous_chapter_start(&info);
        self.seek_with(Command::SkipPrev { target }, target).await
    }

    #[instrument(skip(self))]
    pub async fn set_speed(&self, speed: f32) -> Result<()> {
        if !(speed > 0.0 && speed <= MAX_PLAYBACK_SPEED) {
            return Err(core_runtime::Error::InvalidValue {
                field: "speed",
                message: format!("{} is outside (0, {}]", speed, MAX_PLAYBACK_SPEED),
            }
            .into());
        }
        let session = self.engine_session("set_speed")?;
        self.deps
            .media_engine
            .set_speed(session, speed)
            .await
            .map_err(|error| self.fail(ErrorCode::PlaybackFailed, error))?;
        self.store.dispatch(Command::SpeedChanged(speed))?;
        Ok(())
    }

    pub fn set_skip_distance(&self, distance: Duration) -> Result<()> {
        if distance.is_zero() {
            return Err(core_runtime::Error::InvalidValue {
                field: "skip_distance",
                message: "must be greater than zero".to_string(),
            }
            .into());
        }
        self.store.dispatch(Command::SkipDistanceChanged(distance))?;
        Ok(())
    }

    pub fn custom_action(&self, name: impl Into<String>) -> Result<()> {
        self.store
            .dispatch(Command::CustomAction { name: name.into() })?;
        Ok(())
    }

    /// Runs a transport action a host media session delivered by name.
    ///
    /// Unknown names fail with [`PlaybackError::UnrecognizedCommand`], which
    /// is also reported to listeners.
    pub async fn handle_media_action(&self, name: &str) -> Result<()> {
        let action = match name.parse::<MediaAction>() {
            Ok(action) => action,
            Err(error) => {
                warn!(action = name, "Unrecognized media action");
                self.engine.report_error(PlayerError::from(&error));
                return Err(error.into());
            }
        };

        debug!(action = %action, "Media action");
        match action {
            MediaAction::Play => self.play().await,
            MediaAction::Pause => self.pause().await,
            MediaAction::Stop => self.stop().await,
            MediaAction::FastForward => self.fast_forward().await,
            MediaAction::Rewind => self.rewind().await,
            MediaAction::SkipToNext => self.skip_to_next().await,
            MediaAction::SkipToPrevious => self.skip_to_previous().await,
        }
    }

    /// Notifies session listeners of a progress update. `chapter_index` is
    /// `None` when the caller does not know the chapter.
    pub fn notify_progress(&self, chapter_index: Option<usize>) -> Result<()> {
        self.store.dispatch(Command::UpdateProgress {
            is_updated: true,
            chapter_index,
        })?;
        self.store.dispatch(Command::UpdateProgress {
            is_updated: false,
            chapter_index: None,
        })?;
        Ok(())
    }

    pub fn update_metadata(&self, audio_playable: AudioPlayable) -> Result<()> {
        self.store
            .dispatch(Command::MetadataUpdate(Arc::new(audio_playable)))?;
        Ok(())
    }

    /// Replaces the media request of the current audiobook, e.g. with a
    /// freshly signed URL.
    pub fn refresh_media_request(&self, request: MediaRequest) -> Result<()> {
        self.store.dispatch(Command::MediaRequestUpdate(request))?;
        Ok(())
    }

    // ========================================================================
    // Collaborator reports
    // ========================================================================

    /// Translates a raw report from the host engine into state.
    pub fn handle_engine_event(&self, event: EngineEvent) -> Result<()> {
        let command = match event {
            EngineEvent::Ready => Command::EngineReady(true),
            EngineEvent::TransportChanged(state) => Command::PlayerStateChanged(match state {
                TransportState::Idle => PlaybackState::Idle,
                TransportState::Playing => PlaybackState::Playing,
                TransportState::Paused => PlaybackState::Paused,
            }),
            EngineEvent::LoadingChanged(loading) => Command::LoadingChanged(loading),
            EngineEvent::Position { position, duration } => {
                Command::PlaybackProgress { position, duration }
            }
            EngineEvent::SpeedChanged(speed) => Command::SpeedChanged(speed),
            EngineEvent::Discontinuity => {
                let seeking = self
                    .store
                    .current()?
                    .playback_info
                    .as_ref()
                    .map_or(false, |info| info.control_state.is_seeking);
                if !seeking {
                    debug!("Discontinuity without a pending seek");
                    return Ok(());
                }
                Command::Seek {
                    is_seeking: false,
                    target: None,
                }
            }
            EngineEvent::Ended => Command::ContentEnded,
            EngineEvent::Failed { message, renderer } => {
                let code = if renderer {
                    ErrorCode::AudioSinkError
                } else {
                    ErrorCode::PlaybackFailed
                };
                warn!(code = code.code(), %message, "Media engine failure");
                Command::Error(PlayerError::new(code, message))
            }
        };
        self.store.dispatch(command)?;
        Ok(())
    }

    /// Translates a download subsystem report into state.
    pub fn handle_download_event(&self, event: DownloadEvent) -> Result<()> {
        let command = match event {
            DownloadEvent::Removed { .. } => {
                Command::StopTrackingDownload(DownloadProgress::from(event))
            }
            other => Command::UpdateDownload(DownloadProgress::from(other)),
        };
        self.store.dispatch(command)?;
        Ok(())
    }

    /// Translates a DRM layer report into state.
    ///
    /// A license reported as acquired or usable whose expiry has already
    /// passed is recorded as expired.
    pub fn handle_drm_event(&self, event: DrmEvent) -> Result<()> {
        let now = self.deps.clock.now();
        let command = match DrmState::from(event) {
            DrmState::NoDrm => return Ok(()),
            DrmState::LicenseOpening(info) => Command::DrmLicenseOpening(info),
            DrmState::LicenseAcquired(info) | DrmState::LicenseUsable(info)
                if info.is_expired_at(now) =>
            {
                Command::DrmLicenseExpired(info)
            }
            DrmState::LicenseAcquired(info) => Command::DrmLicenseAcquired(info),
            DrmState::LicenseUsable(info) => Command::DrmLicenseUsable(info),
            DrmState::LicenseExpired(info) => Command::DrmLicenseExpired(info),
            DrmState::LicenseReleased(info) => Command::DrmLicenseReleased(info),
            DrmState::LicenseError { info, message } => Command::DrmLicenseError { info, message },
        };
        self.store.dispatch(command)?;
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn seek_with(&self, command: Command, target: Duration) -> Result<()> {
        let session = self.engine_session(command.label())?;
        self.store.dispatch(command)?;
        self.deps
            .media_engine
            .seek(session, target)
            .await
            .map_err(|error| self.fail(ErrorCode::SeekFailed, error))
    }

    fn require_session_state(&self, action: &'static str) -> Result<PlaybackInfo> {
        self.store
            .current()?
            .playback_info
            .clone()
            .ok_or_else(|| self.reject(action))
    }

    fn engine_session(&self, action: &'static str) -> Result<PlaybackSessionId> {
        let session = *self.session.lock();
        session.ok_or_else(|| self.reject(action))
    }

    fn reject(&self, action: &'static str) -> CoreError {
        let error = PlaybackError::ActionBeforeSetup { command: action };
        warn!(action, "Action requires an active session");
        self.engine.report_error(PlayerError::from(&error));
        error.into()
    }

    /// Records a bridge failure as a soft error and returns it.
    fn fail(&self, code: ErrorCode, error: BridgeError) -> CoreError {
        warn!(code = code.code(), error = %error, "Media engine call failed");
        if let Err(dispatch_error) = self
            .store
            .dispatch(Command::Error(PlayerError::new(code, error.to_string())))
        {
            warn!(error = %dispatch_error, "Could not record media engine failure");
        }
        error.into()
    }

    async fn release_engine_session(&self) {
        let session = self.session.lock().take();
        if let Some(session) = session {
            if let Err(error) = self.deps.media_engine.release(session).await {
                warn!(error = %error, "Failed to release engine session");
            }
        }
    }
}

impl Drop for AudiobookPlayer {
    fn drop(&mut self) {
        self.engine.destroy();
    }
}

/// Loggable form of a media request: remote URIs lose their query string,
/// local files are reduced to their file name.
fn media_label(request: &MediaRequest) -> String {
    if request.is_remote() {
        redact_if_sensitive("uri", &request.uri)
    } else {
        strip_path(&request.uri).to_string()
    }
}

fn next_chapter_start(info: &PlaybackInfo) -> Duration {
    let chapters = &info.audio_playable.chapters;
    let index = info.progress.current_chapter_index;
    chapters
        .get(index + 1)
        .or_else(|| chapters.get(index))
        .map_or(Duration::ZERO, |chapter| chapter.start)
}

fn previous_chapter_start(info: &PlaybackInfo) -> Duration {
    let chapters = &info.audio_playable.chapters;
    let index = info.progress.current_chapter_index;
    let Some(current) = chapters.get(index) else {
        return Duration::ZERO;
    };

    let into_chapter = info
        .progress
        .position_in_duration
        .saturating_sub(current.start);
    if into_chapter > RESTART_CHAPTER_THRESHOLD || index == 0 {
        current.start
    } else {
        chapters[index - 1].start
    }
}
