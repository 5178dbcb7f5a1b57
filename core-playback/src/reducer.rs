//! # Reducer
//!
//! Computes the next [`Snapshot`] from the current one and a [`Command`].
//!
//! The reducer never mutates its input: each call clones the snapshot,
//! applies the command to the clone and returns it. It holds the small amount
//! of configuration transitions depend on, most notably the duration
//! discrepancy tolerance, which every new audiobook replaces.
//!
//! ## Guard
//!
//! Commands that describe an active session fail with
//! [`PlaybackError::ActionBeforeSetup`] when no session exists. The failed
//! command leaves no trace.
//!
//! ## Soft errors
//!
//! Duration checks, failed downloads and DRM failures attach a
//! [`PlayerError`] to the produced snapshot. The error belongs to that one
//! transition; the next transition starts with no error.

use crate::action::Command;
use crate::codes::{ErrorCode, PlayerError};
use crate::error::{PlaybackError, Result};
use crate::model::{
    ControlState, DownloadState, DrmState, PlaybackInfo, PlaybackState, Progress, SeekIntent,
    Snapshot,
};
use core_runtime::PlayerConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How far the declared chapter durations may drift from the real length of
/// the media before the metadata is reported as incorrect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscrepancyTolerance {
    /// Never report a discrepancy.
    #[default]
    Disabled,
    Within(Duration),
}

impl DiscrepancyTolerance {
    /// Negative (or non-finite) values disable the check.
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_nan() || secs < 0.0 {
            return DiscrepancyTolerance::Disabled;
        }
        Duration::try_from_secs_f64(secs)
            .map(DiscrepancyTolerance::Within)
            .unwrap_or(DiscrepancyTolerance::Disabled)
    }

    /// Whether `expected` and `actual` differ by more than the tolerance.
    pub fn is_exceeded(&self, expected: Duration, actual: Duration) -> bool {
        match self {
            DiscrepancyTolerance::Disabled => false,
            DiscrepancyTolerance::Within(limit) => {
                let delta = if expected > actual {
                    expected - actual
                } else {
                    actual - expected
                };
                delta > *limit
            }
        }
    }
}

/// Applies commands to snapshots.
#[derive(Debug, Clone)]
pub struct Reducer {
    tolerance: DiscrepancyTolerance,
    default_speed: f32,
    default_skip_distance: Duration,
}

impl Reducer {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            tolerance: DiscrepancyTolerance::from_secs_f64(config.max_discrepancy_secs),
            default_speed: config.default_playback_speed,
            default_skip_distance: config.default_skip_distance(),
        }
    }

    /// Tolerance applied to the current session.
    pub fn tolerance(&self) -> DiscrepancyTolerance {
        self.tolerance
    }

    /// Produces the snapshot that follows `snapshot` once `command` is applied.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::ActionBeforeSetup`] when `command` requires a
    /// session and `snapshot` has none.
    pub fn reduce(&mut self, snapshot: &Snapshot, command: Command) -> Result<Snapshot> {
        if command.requires_session() && !snapshot.has_session() {
            return Err(PlaybackError::ActionBeforeSetup {
                command: command.label(),
            });
        }

        let mut next = snapshot.clone();
        next.error = None;
        next.trace.record(command.clone());
        self.apply(&mut next, command)?;

        if let Some(error) = &next.error {
            info!(code = error.code.code(), message = %error.message, "Transition raised soft error");
        }

        Ok(next)
    }

    fn apply(&mut self, next: &mut Snapshot, command: Command) -> Result<()> {
        let label = command.label();
        match command {
            Command::PlayerStateChanged(state) => {
                let info = session(next, label)?;
                info.playback_state = state;
                if state == PlaybackState::Idle {
                    info.control_state = ControlState::stopping();
                    info.progress = Progress {
                        total_chapters_duration: info.progress.total_chapters_duration,
                        ..Progress::default()
                    };
                } else {
                    info.control_state.is_starting_new_audio_playable = false;
                }
            }
            Command::SpeedChanged(speed) => {
                session(next, label)?.playback_speed = speed;
            }
            Command::PlaybackProgress { position, duration } => {
                let tolerance = self.tolerance;
                let info = session(next, label)?;
                info.progress.position_in_duration = position;
                info.progress.current_chapter_index = info.audio_playable.chapter_index_at(position);

                let mut error = None;
                if let Some(reported) = duration {
                    if info.progress.total_player_duration != Some(reported) {
                        info.progress.total_player_duration = Some(reported);
                        error = verify_duration(
                            tolerance,
                            info.progress.total_chapters_duration,
                            reported,
                            "media length",
                        );
                    }
                }
                next.error = error;
            }
            Command::LoadingChanged(loading) => {
                session(next, label)?.is_loading = loading;
            }
            Command::ContentEnded => {
                let tolerance = self.tolerance;
                let info = session(next, label)?;
                info.control_state = ControlState::content_ended();
                let error = verify_duration(
                    tolerance,
                    info.progress.total_chapters_duration,
                    info.progress.position_in_duration,
                    "end position",
                );
                next.error = error;
            }
            Command::UpdateProgress {
                is_updated,
                chapter_index,
            } => {
                let control = &mut session(next, label)?.control_state;
                control.is_playback_state_updating = is_updated;
                if let Some(index) = chapter_index {
                    control.updated_chapter_index = index;
                }
            }
            Command::Seek { is_seeking, target } => {
                session(next, label)?.control_state = if is_seeking {
                    ControlState::seeking(SeekIntent::Arbitrary, target)
                } else {
                    ControlState::default()
                };
            }
            Command::FastForward { target } => {
                session(next, label)?.control_state =
                    ControlState::seeking(SeekIntent::FastForward, Some(target));
            }
            Command::Rewind { target } => {
                session(next, label)?.control_state =
                    ControlState::seeking(SeekIntent::Rewind, Some(target));
            }
            Command::SkipNext { target } => {
                session(next, label)?.control_state =
                    ControlState::seeking(SeekIntent::NextChapter, Some(target));
            }
            Command::SkipPrev { target } => {
                session(next, label)?.control_state =
                    ControlState::seeking(SeekIntent::PreviousChapter, Some(target));
            }
            Command::CustomAction { name } => {
                session(next, label)?.control_state = ControlState::custom_action(name);
            }
            Command::SkipDistanceChanged(distance) => {
                session(next, label)?.skip_distance = distance;
            }
            Command::NewAudioPlayable {
                audio_playable,
                max_discrepancy,
                initial_offset,
            } => {
                self.tolerance = max_discrepancy;
                let skip_distance = next
                    .playback_info
                    .as_ref()
                    .map_or(self.default_skip_distance, |info| info.skip_distance);

                debug!(
                    id = %audio_playable.id,
                    chapters = audio_playable.chapters.len(),
                    "Starting new audio playable"
                );

                next.playback_info = Some(PlaybackInfo {
                    progress: Progress {
                        current_chapter_index: 0,
                        position_in_duration: initial_offset,
                        total_player_duration: None,
                        total_chapters_duration: audio_playable.duration(),
                    },
                    audio_playable,
                    playback_state: PlaybackState::Idle,
                    control_state: ControlState::starting_new_audio_playable(),
                    playback_speed: self.default_speed,
                    skip_distance,
                    is_loading: true,
                });
            }
            Command::EngineReady(ready) => {
                next.internal_state.engine_ready = ready;
            }
            Command::MetadataUpdate(audio_playable) => match next.playback_info.as_mut() {
                Some(info) if info.audio_playable.id == audio_playable.id => {
                    info.progress.total_chapters_duration = audio_playable.duration();
                    info.progress.current_chapter_index =
                        audio_playable.chapter_index_at(info.progress.position_in_duration);
                    info.audio_playable = audio_playable;
                }
                _ => debug!(id = %audio_playable.id, "Ignoring metadata for inactive playable"),
            },
            Command::MediaRequestUpdate(request) => {
                if let Some(info) = next.playback_info.as_mut() {
                    let mut playable = (*info.audio_playable).clone();
                    playable.request = request;
                    info.audio_playable = Arc::new(playable);
                }
            }
            Command::UpdateDownload(progress) => {
                next.downloads
                    .retain(|download| !(download.is_completed() && download.url != progress.url));

                if let DownloadState::Failed { reason } = &progress.state {
                    next.error = Some(PlayerError::new(
                        ErrorCode::DownloadFailed,
                        format!(
                            "download {} failed: {}",
                            progress.id,
                            reason.as_deref().unwrap_or("unknown reason")
                        ),
                    ));
                }

                match next
                    .downloads
                    .iter()
                    .position(|download| download.url == progress.url)
                {
                    Some(index) => next.downloads[index] = progress,
                    None => next.downloads.push(progress),
                }
            }
            Command::StopTrackingDownload(progress) => {
                next.downloads.retain(|download| download.url != progress.url);
            }
            Command::DrmLicenseOpening(info) => next.drm_state = DrmState::LicenseOpening(info),
            Command::DrmLicenseAcquired(info) => next.drm_state = DrmState::LicenseAcquired(info),
            Command::DrmLicenseExpired(info) => next.drm_state = DrmState::LicenseExpired(info),
            Command::DrmLicenseUsable(info) => next.drm_state = DrmState::LicenseUsable(info),
            Command::DrmLicenseReleased(info) => next.drm_state = DrmState::LicenseReleased(info),
            Command::DrmLicenseError { info, message } => {
                let code = match &next.drm_state {
                    DrmState::NoDrm | DrmState::LicenseOpening(_) => {
                        ErrorCode::LicenseAcquisitionFailed
                    }
                    DrmState::LicenseExpired(_) => ErrorCode::LicenseExpired,
                    DrmState::LicenseReleased(_) => ErrorCode::LicenseReleaseFailed,
                    DrmState::LicenseAcquired(_)
                    | DrmState::LicenseUsable(_)
                    | DrmState::LicenseError { .. } => ErrorCode::DrmSessionError,
                };
                next.error = Some(PlayerError::new(code, message.clone()));
                next.drm_state = DrmState::LicenseError { info, message };
            }
            Command::Error(error) => {
                if error.code == ErrorCode::SeekFailed {
                    // The engine never started the seek, so nothing will end it.
                    if let Some(info) = next
                        .playback_info
                        .as_mut()
                        .filter(|info| info.control_state.is_seeking)
                    {
                        info.control_state = ControlState::default();
                    }
                }
                next.error = Some(error);
            }
            Command::ClearError => next.error = None,
        }
        Ok(())
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(&PlayerConfig::default())
    }
}

fn session<'a>(snapshot: &'a mut Snapshot, command: &'static str) -> Result<&'a mut PlaybackInfo> {
    snapshot
        .playback_info
        .as_mut()
        .ok_or(PlaybackError::ActionBeforeSetup { command })
}

fn verify_duration(
    tolerance: DiscrepancyTolerance,
    declared: Duration,
    observed: Duration,
    what: &str,
) -> Option<PlayerError> {
    tolerance.is_exceeded(declared, observed).then(|| {
        PlayerError::new(
            ErrorCode::IncorrectChapterMetadata,
            format!(
                "chapters declare {:.3}s but {} is {:.3}s",
                declared.as_secs_f64(),
                what,
                observed.as_secs_f64()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AudioPlayable, Chapter, DownloadProgress, DrmInfo};
    use bridge_traits::MediaRequest;

    fn playable(id: &str, chapter_secs: &[u64]) -> Arc<AudioPlayable> {
        let mut start = Duration::ZERO;
        let chapters = chapter_secs
            .iter()
            .map(|secs| {
                let chapter = Chapter::new(start, Duration::from_secs(*secs));
                start += Duration::from_secs(*secs);
                chapter
            })
            .collect();
        Arc::new(
            AudioPlayable::new(id, "Title", MediaRequest::new("https://cdn.example.com/a.m4b"))
                .with_chapters(chapters),
        )
    }

    fn load(tolerance: DiscrepancyTolerance, offset: Duration) -> Command {
        Command::NewAudioPlayable {
            audio_playable: playable("book", &[2, 3]),
            max_discrepancy: tolerance,
            initial_offset: offset,
        }
    }

    fn run(reducer: &mut Reducer, commands: Vec<Command>) -> Snapshot {
        commands
            .into_iter()
            .fold(Snapshot::default(), |snapshot, command| {
                reducer.reduce(&snapshot, command).unwrap()
            })
    }

    fn session_commands() -> Vec<Command> {
        vec![
            Command::PlayerStateChanged(PlaybackState::Playing),
            Command::SpeedChanged(1.5),
            Command::PlaybackProgress {
                position: Duration::from_secs(1),
                duration: None,
            },
            Command::LoadingChanged(false),
            Command::ContentEnded,
            Command::UpdateProgress {
                is_updated: true,
                chapter_index: None,
            },
            Command::Seek {
                is_seeking: true,
                target: None,
            },
            Command::FastForward {
                target: Duration::from_secs(1),
            },
            Command::Rewind {
                target: Duration::ZERO,
            },
            Command::SkipNext {
                target: Duration::from_secs(2),
            },
            Command::SkipPrev {
                target: Duration::ZERO,
            },
            Command::CustomAction {
                name: "bookmark".into(),
            },
            Command::SkipDistanceChanged(Duration::from_secs(10)),
        ]
    }

    #[test]
    fn session_commands_require_setup() {
        let mut reducer = Reducer::default();
        let empty = Snapshot::default();
        for command in session_commands() {
            let label = command.label();
            let err = reducer.reduce(&empty, command).unwrap_err();
            assert!(
                matches!(err, PlaybackError::ActionBeforeSetup { command } if command == label),
                "{label} should be rejected"
            );
        }
    }

    #[test]
    fn session_free_commands_apply_without_setup() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                Command::EngineReady(true),
                Command::MetadataUpdate(playable("book", &[1])),
                Command::MediaRequestUpdate(MediaRequest::new("file:///x")),
                Command::ClearError,
            ],
        );
        assert!(snapshot.internal_state.engine_ready);
        assert!(snapshot.playback_info.is_none());
        assert_eq!(snapshot.trace.update_count(), 4);
    }

    #[test]
    fn new_audio_playable_resets_session() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![load(DiscrepancyTolerance::Disabled, Duration::from_secs(3))],
        );

        let info = snapshot.playback_info.unwrap();
        assert_eq!(info.progress.current_chapter_index, 0);
        assert_eq!(info.progress.position_in_duration, Duration::from_secs(3));
        assert_eq!(info.progress.total_chapters_duration, Duration::from_secs(5));
        assert_eq!(info.progress.total_player_duration, None);
        assert!(info.is_loading);
        assert!(info.control_state.is_starting_new_audio_playable);
        assert_eq!(info.playback_speed, 1.0);
        assert_eq!(info.skip_distance, Duration::from_secs(30));
    }

    #[test]
    fn skip_distance_carries_over_but_speed_resets() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::SpeedChanged(2.0),
                Command::SkipDistanceChanged(Duration::from_secs(15)),
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
            ],
        );
        let info = snapshot.playback_info.unwrap();
        assert_eq!(info.skip_distance, Duration::from_secs(15));
        assert_eq!(info.playback_speed, 1.0);
    }

    #[test]
    fn new_audio_playable_replaces_tolerance() {
        let mut reducer = Reducer::new(
            &PlayerConfig::builder()
                .max_discrepancy_secs(4.0)
                .build()
                .unwrap(),
        );
        assert_eq!(
            reducer.tolerance(),
            DiscrepancyTolerance::Within(Duration::from_secs(4))
        );
        let _ = run(&mut reducer, vec![load(DiscrepancyTolerance::Disabled, Duration::ZERO)]);
        assert_eq!(reducer.tolerance(), DiscrepancyTolerance::Disabled);
    }

    fn end_at(tolerance_secs: f64, position: Duration) -> Snapshot {
        let mut reducer = Reducer::default();
        run(
            &mut reducer,
            vec![
                Command::NewAudioPlayable {
                    audio_playable: playable("book", &[5]),
                    max_discrepancy: DiscrepancyTolerance::from_secs_f64(tolerance_secs),
                    initial_offset: Duration::ZERO,
                },
                Command::PlaybackProgress {
                    position,
                    duration: None,
                },
                Command::ContentEnded,
            ],
        )
    }

    #[test]
    fn completeness_check_reports_large_discrepancy() {
        let snapshot = end_at(1.0, Duration::from_secs(7));
        let error = snapshot.error.expect("discrepancy should be reported");
        assert_eq!(error.code, ErrorCode::IncorrectChapterMetadata);
        assert!(snapshot
            .playback_info
            .unwrap()
            .control_state
            .has_content_ended);
    }

    #[test]
    fn completeness_check_accepts_discrepancy_within_tolerance() {
        let snapshot = end_at(1.0, Duration::from_millis(5_500));
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn negative_tolerance_never_errors() {
        for position in [0, 7, 500] {
            let snapshot = end_at(-1.0, Duration::from_secs(position));
            assert!(snapshot.error.is_none());
        }
    }

    #[test]
    fn reported_media_length_is_verified_once_per_change() {
        let mut reducer = Reducer::default();
        let loaded = run(
            &mut reducer,
            vec![load(
                DiscrepancyTolerance::Within(Duration::from_secs(1)),
                Duration::ZERO,
            )],
        );
        let progress = |duration| Command::PlaybackProgress {
            position: Duration::from_secs(1),
            duration: Some(duration),
        };

        let first = reducer
            .reduce(&loaded, progress(Duration::from_secs(9)))
            .unwrap();
        assert_eq!(
            first.error.as_ref().map(|e| e.code),
            Some(ErrorCode::IncorrectChapterMetadata)
        );

        let repeated = reducer
            .reduce(&first, progress(Duration::from_secs(9)))
            .unwrap();
        assert!(repeated.error.is_none());

        let close = reducer
            .reduce(&repeated, progress(Duration::from_millis(5_200)))
            .unwrap();
        assert!(close.error.is_none());
        assert_eq!(
            close.playback_info.unwrap().progress.total_player_duration,
            Some(Duration::from_millis(5_200))
        );
    }

    #[test]
    fn progress_tracks_chapter_index() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::PlaybackProgress {
                    position: Duration::from_millis(2_500),
                    duration: None,
                },
            ],
        );
        assert_eq!(
            snapshot.playback_info.unwrap().progress.current_chapter_index,
            1
        );
    }

    #[test]
    fn seek_family_replaces_control_state() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::FastForward {
                    target: Duration::from_secs(4),
                },
                Command::Rewind {
                    target: Duration::from_secs(1),
                },
            ],
        );
        let control = snapshot.playback_info.unwrap().control_state;
        assert!(control.is_rewinding);
        assert!(!control.is_fast_forwarding);
        assert!(!control.is_starting_new_audio_playable);
        assert!(control.is_seeking);
        assert_eq!(control.seek_target, Some(Duration::from_secs(1)));
    }

    #[test]
    fn resolving_a_seek_restores_neutral_control_state() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::SkipNext {
                    target: Duration::from_secs(2),
                },
                Command::Seek {
                    is_seeking: false,
                    target: None,
                },
            ],
        );
        assert_eq!(
            snapshot.playback_info.unwrap().control_state,
            ControlState::default()
        );
    }

    #[test]
    fn idle_state_marks_stopping() {
        let mut reducer = Reducer::default();
        let playing = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::PlayerStateChanged(PlaybackState::Playing),
            ],
        );
        let control = &playing.playback_info.as_ref().unwrap().control_state;
        assert!(!control.is_starting_new_audio_playable);

        let stopped = reducer
            .reduce(&playing, Command::PlayerStateChanged(PlaybackState::Idle))
            .unwrap();
        let info = stopped.playback_info.unwrap();
        assert_eq!(info.control_state, ControlState::stopping());
        assert_eq!(info.progress.position_in_duration, Duration::ZERO);
    }

    #[test]
    fn update_progress_retains_chapter_when_unknown() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::UpdateProgress {
                    is_updated: true,
                    chapter_index: Some(1),
                },
                Command::UpdateProgress {
                    is_updated: false,
                    chapter_index: None,
                },
            ],
        );
        let control = snapshot.playback_info.unwrap().control_state;
        assert!(!control.is_playback_state_updating);
        assert_eq!(control.updated_chapter_index, 1);
    }

    #[test]
    fn trace_keeps_most_recent_twenty() {
        let mut reducer = Reducer::default();
        let mut commands = vec![load(DiscrepancyTolerance::Disabled, Duration::ZERO)];
        commands.extend((0..24).map(|secs| Command::SkipDistanceChanged(Duration::from_secs(secs))));
        let snapshot = run(&mut reducer, commands);

        assert_eq!(snapshot.trace.len(), 20);
        assert_eq!(snapshot.trace.update_count(), 25);
        let newest = snapshot.trace.entries().next().unwrap();
        assert_eq!(newest, &Command::SkipDistanceChanged(Duration::from_secs(23)));
        assert!(snapshot
            .trace
            .entries()
            .all(|command| command.label() == "SkipDistanceChanged"));
    }

    #[test]
    fn equivalent_sequences_compare_equal() {
        let mut reducer = Reducer::default();
        let direct = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::SpeedChanged(1.5),
            ],
        );
        let roundabout = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::SpeedChanged(2.0),
                Command::ClearError,
                Command::SpeedChanged(1.5),
            ],
        );
        assert_eq!(direct, roundabout);
        assert_ne!(direct.trace.update_count(), roundabout.trace.update_count());
    }

    fn download(url: &str, state: DownloadState) -> DownloadProgress {
        DownloadProgress::new(format!("id-{url}"), url, state)
    }

    #[test]
    fn downloads_upsert_and_remove_by_url() {
        let mut reducer = Reducer::default();
        let started = |percent| DownloadState::Started {
            percent,
            bytes_downloaded: 0,
        };
        let snapshot = run(
            &mut reducer,
            vec![
                Command::UpdateDownload(download("a", started(10.0))),
                Command::UpdateDownload(download("b", started(5.0))),
                Command::UpdateDownload(download("a", started(50.0))),
            ],
        );
        assert_eq!(snapshot.downloads.len(), 2);
        assert_eq!(snapshot.downloads[0].state, started(50.0));

        let removed = reducer
            .reduce(
                &snapshot,
                Command::StopTrackingDownload(download("a", DownloadState::Removed)),
            )
            .unwrap();
        assert_eq!(removed.downloads.len(), 1);
        assert_eq!(removed.downloads[0].url, "b");
    }

    #[test]
    fn completed_downloads_are_dropped_on_next_update() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                Command::UpdateDownload(download("a", DownloadState::Completed)),
                Command::UpdateDownload(download("b", DownloadState::Completed)),
            ],
        );
        assert_eq!(snapshot.downloads.len(), 1);
        assert_eq!(snapshot.downloads[0].url, "b");
    }

    #[test]
    fn failed_download_raises_soft_error_once() {
        let mut reducer = Reducer::default();
        let failed = run(
            &mut reducer,
            vec![Command::UpdateDownload(download(
                "a",
                DownloadState::Failed {
                    reason: Some("disk full".into()),
                },
            ))],
        );
        assert_eq!(
            failed.error.as_ref().map(|e| e.code),
            Some(ErrorCode::DownloadFailed)
        );

        let next = reducer.reduce(&failed, Command::EngineReady(true)).unwrap();
        assert!(next.error.is_none());
    }

    #[test]
    fn drm_error_code_depends_on_prior_state() {
        let info = DrmInfo {
            drm_type: "widevine".into(),
            expires_at: None,
            session_valid: false,
        };
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                Command::DrmLicenseOpening(info.clone()),
                Command::DrmLicenseError {
                    info: info.clone(),
                    message: "denied".into(),
                },
            ],
        );
        assert_eq!(
            snapshot.error.map(|e| e.code),
            Some(ErrorCode::LicenseAcquisitionFailed)
        );
        assert_eq!(snapshot.drm_state.label(), "LicenseError");
    }

    #[test]
    fn metadata_update_only_applies_to_active_playable() {
        let mut reducer = Reducer::default();
        let loaded = run(
            &mut reducer,
            vec![load(DiscrepancyTolerance::Disabled, Duration::ZERO)],
        );

        let other = reducer
            .reduce(&loaded, Command::MetadataUpdate(playable("other", &[60])))
            .unwrap();
        assert_eq!(loaded, other);

        let same = reducer
            .reduce(&loaded, Command::MetadataUpdate(playable("book", &[60, 60])))
            .unwrap();
        assert_eq!(
            same.playback_info.unwrap().progress.total_chapters_duration,
            Duration::from_secs(120)
        );
    }

    #[test]
    fn media_request_update_replaces_request() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::MediaRequestUpdate(
                    MediaRequest::new("https://cdn.example.com/b.m4b").with_header("X-Sig", "1"),
                ),
            ],
        );
        let playable = snapshot.playback_info.unwrap().audio_playable;
        assert_eq!(playable.request.uri, "https://cdn.example.com/b.m4b");
        assert_eq!(playable.id, "book");
    }

    #[test]
    fn failed_seek_abandons_pending_seek() {
        let mut reducer = Reducer::default();
        let snapshot = run(
            &mut reducer,
            vec![
                load(DiscrepancyTolerance::Disabled, Duration::ZERO),
                Command::FastForward {
                    target: Duration::from_secs(4),
                },
                Command::Error(PlayerError::new(ErrorCode::SeekFailed, "engine refused")),
            ],
        );
        let info = snapshot.playback_info.as_ref().unwrap();
        assert!(!info.control_state.is_seeking);
        assert!(!info.control_state.is_fast_forwarding);
        assert_eq!(snapshot.error.as_ref().unwrap().code, ErrorCode::SeekFailed);

        let rewound = reducer
            .reduce(
                &snapshot,
                Command::Rewind {
                    target: Duration::from_secs(1),
                },
            )
            .unwrap();
        let control = rewound.playback_info.unwrap().control_state;
        assert!(control.is_rewinding);
        assert!(!control.is_fast_forwarding);
    }

    #[test]
    fn tolerance_from_secs() {
        assert_eq!(
            DiscrepancyTolerance::from_secs_f64(-1.0),
            DiscrepancyTolerance::Disabled
        );
        assert_eq!(
            DiscrepancyTolerance::from_secs_f64(f64::NAN),
            DiscrepancyTolerance::Disabled
        );
        assert_eq!(
            DiscrepancyTolerance::from_secs_f64(0.5),
            DiscrepancyTolerance::Within(Duration::from_millis(500))
        );
        assert!(!DiscrepancyTolerance::Within(Duration::from_secs(1))
            .is_exceeded(Duration::from_secs(5), Duration::from_secs(6)));
    }
}
