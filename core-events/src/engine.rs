//! # Event Derivation Engine
//!
//! Turns the store's snapshot stream into edge-triggered listener callbacks.
//!
//! ## Overview
//!
//! The engine remembers the last snapshot it processed and, for each new one,
//! evaluates a fixed sequence of predicate families against the pair. A
//! single snapshot may raise several events (loading ended and play, for
//! example); families never short-circuit each other.
//!
//! ```text
//!  Store ──snapshots──> delivery task ──derive──> events ──> ListenerRegistry
//!    │                      ▲                          └───> EventBus<PlayerEvent>
//!    └──contract errors─────┘
//!
//!  poll timer ──reads last snapshot──> PlayerListener::on_poll
//! ```
//!
//! ## Memory
//!
//! - `last`: the previously processed snapshot, neutral after a reset.
//! - `seek_start`: the snapshot at which the current seek began; the seek is
//!   classified from it once it resolves.
//!
//! Only the delivery path writes memory. The poll timer reads it.
//!
//! A stop clears `seek_start`. The first new session after a stop is compared
//! against a neutral snapshot, so nothing from the stopped session (its speed,
//! its loading state) leaks into the new one. The stopped book itself keeps
//! reporting real transitions: playing it again fires `on_play`, while a
//! second stop without a start in between fires nothing.
//!
//! ## Failure recovery
//!
//! Delivery runs in a supervised task. If a listener panics, the supervisor
//! subscribes again; the store replays its current snapshot and delivery
//! resumes. Memory survives, so nothing is reported twice.

use crate::error::{EngineError, Result};
use crate::event::PlayerEvent;
use crate::listener::ListenerRegistry;
use core_playback::{
    ControlState, ErrorCode, PlaybackInfo, PlaybackState, PlayerError, SeekIntent, Snapshot,
    SnapshotStream, Store,
};
use core_runtime::events::{EventBus, Receiver, RecvError};
use core_runtime::PlayerConfig;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

struct Memory {
    last: Arc<Snapshot>,
    seek_start: Option<Arc<Snapshot>>,
    /// A stop was reported and no new session has started since.
    stopped: bool,
    /// Bumped by every teardown so late deliveries from a previous run are
    /// discarded.
    generation: u64,
}

impl Memory {
    fn new() -> Self {
        Self {
            last: Arc::new(Snapshot::default()),
            seek_start: None,
            stopped: false,
            generation: 0,
        }
    }

    fn reset(&mut self) {
        self.last = Arc::new(Snapshot::default());
        self.seek_start = None;
        self.stopped = false;
    }
}

struct Shared {
    store: Arc<Store>,
    registry: Arc<ListenerRegistry>,
    bus: EventBus<PlayerEvent>,
    memory: Mutex<Memory>,
}

impl Shared {
    fn handle_snapshot(&self, generation: Option<u64>, snapshot: Arc<Snapshot>) {
        let events = {
            let mut memory = self.memory.lock();
            if generation.map_or(false, |g| g != memory.generation) {
                return;
            }
            derive(&mut memory, &snapshot)
        };
        self.deliver(events);
    }

    fn handle_error(&self, generation: Option<u64>, error: PlayerError) {
        let state = {
            let memory = self.memory.lock();
            if generation.map_or(false, |g| g != memory.generation) {
                return;
            }
            Arc::clone(&memory.last)
        };
        self.deliver(vec![PlayerEvent::Error { error, state }]);
    }

    fn poll(&self, generation: u64) {
        let last = {
            let memory = self.memory.lock();
            if memory.generation != generation {
                return;
            }
            Arc::clone(&memory.last)
        };
        self.registry.poll(&last);
    }

    fn deliver(&self, events: Vec<PlayerEvent>) {
        for event in events {
            debug!(event = event.name(), "Derived event");
            self.registry.dispatch(&event);
            // No bus subscribers is fine.
            let _ = self.bus.emit(event);
        }
    }
}

/// Derives semantic playback events from consecutive snapshots.
pub struct EventEngine {
    shared: Arc<Shared>,
    running: Mutex<Option<CancellationToken>>,
}

impl EventEngine {
    pub fn new(store: Arc<Store>, registry: Arc<ListenerRegistry>, config: &PlayerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                registry,
                bus: EventBus::new(config.event_buffer_size),
                memory: Mutex::new(Memory::new()),
            }),
            running: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.shared.registry
    }

    /// Receives every derived event. Slow receivers lag and lose events.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.shared.bus.subscribe()
    }

    pub fn event_bus(&self) -> EventBus<PlayerEvent> {
        self.shared.bus.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// The snapshot the engine compares the next one against.
    pub fn last_snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.shared.memory.lock().last)
    }

    /// Starts delivery and the telemetry poll, tearing down any previous run.
    ///
    /// Subscribes to the store before returning, so no transition dispatched
    /// after `begin` is missed.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::InvalidPollInterval`] for a zero interval and
    /// [`EngineError::NoRuntime`] outside a Tokio runtime.
    pub fn begin(&self, poll_interval: Duration) -> Result<()> {
        if poll_interval.is_zero() {
            return Err(EngineError::InvalidPollInterval);
        }
        let handle = tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

        self.destroy();

        let token = CancellationToken::new();
        let generation = self.shared.memory.lock().generation;
        let snapshots = self.shared.store.subscribe();
        let errors = self.shared.store.errors();

        handle.spawn(supervise(
            Arc::clone(&self.shared),
            generation,
            token.clone(),
            snapshots,
            errors,
        ));
        handle.spawn(run_poll(
            Arc::clone(&self.shared),
            generation,
            poll_interval,
            token.clone(),
        ));
        *self.running.lock() = Some(token);

        info!(
            poll_interval_ms = poll_interval.as_millis() as u64,
            "Event engine started"
        );
        Ok(())
    }

    /// Stops delivery and the poll timer and resets memory.
    ///
    /// Safe to call repeatedly and without a prior [`EventEngine::begin`].
    pub fn destroy(&self) {
        if let Some(token) = self.running.lock().take() {
            token.cancel();
            info!("Event engine stopped");
        }
        let mut memory = self.shared.memory.lock();
        memory.generation += 1;
        memory.reset();
    }

    /// Processes one snapshot synchronously.
    ///
    /// For hosts that drive the engine themselves instead of calling
    /// [`EventEngine::begin`]. Ignored while the engine is running.
    pub fn process(&self, snapshot: Arc<Snapshot>) {
        if self.is_running() {
            warn!("Ignoring manual snapshot while the engine is running");
            return;
        }
        self.shared.handle_snapshot(None, snapshot);
    }

    /// Reports an error raised outside the store (for example by the media
    /// engine bridge) through `on_error`, with the last processed snapshot.
    pub fn report_error(&self, error: PlayerError) {
        self.shared.handle_error(None, error);
    }
}

impl Drop for EventEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for EventEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEngine")
            .field("running", &self.is_running())
            .field("registry", &self.shared.registry)
            .finish()
    }
}

async fn supervise(
    shared: Arc<Shared>,
    generation: u64,
    token: CancellationToken,
    mut snapshots: SnapshotStream,
    mut errors: broadcast::Receiver<PlayerError>,
) {
    loop {
        let task = tokio::spawn(run_delivery(
            Arc::clone(&shared),
            generation,
            token.clone(),
            snapshots,
            errors,
        ));

        match task.await {
            Ok(()) => return,
            Err(join_error) if join_error.is_panic() && !token.is_cancelled() => {
                error!("Listener panicked during delivery; resubscribing");
                snapshots = shared.store.subscribe();
                errors = shared.store.errors();
            }
            Err(_) => return,
        }
    }
}

async fn run_delivery(
    shared: Arc<Shared>,
    generation: u64,
    token: CancellationToken,
    mut snapshots: SnapshotStream,
    mut errors: broadcast::Receiver<PlayerError>,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            snapshot = snapshots.recv() => match snapshot {
                Some(snapshot) => shared.handle_snapshot(Some(generation), snapshot),
                None => return,
            },
            reported = errors.recv() => match reported {
                Ok(error) => shared.handle_error(Some(generation), error),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Contract violation reports were dropped");
                }
                Err(RecvError::Closed) => return,
            },
        }
    }
}

async fn run_poll(
    shared: Arc<Shared>,
    generation: u64,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {
                let polled = std::panic::catch_unwind(AssertUnwindSafe(|| shared.poll(generation)));
                if polled.is_err() {
                    error!("Listener panicked during poll");
                }
            }
        }
    }
}

// ============================================================================
// Derivation
// ============================================================================

fn derive(memory: &mut Memory, current: &Arc<Snapshot>) -> Vec<PlayerEvent> {
    let last = Arc::clone(&memory.last);
    let mut events = Vec::new();

    let starting = current
        .playback_info
        .as_ref()
        .map_or(false, |info| info.control_state.is_starting_new_audio_playable);
    let baseline = if memory.stopped && starting {
        memory.stopped = false;
        Arc::new(Snapshot {
            playback_info: None,
            error: None,
            ..Snapshot::clone(&last)
        })
    } else {
        Arc::clone(&last)
    };
    derive_session(memory, &baseline, current, &mut events);

    derive_downloads(&last, current, &mut events);

    if current.drm_state != last.drm_state {
        events.push(PlayerEvent::DrmStateChanged {
            old: last.drm_state.clone(),
            new: current.drm_state.clone(),
        });
    }

    if current.internal_state.engine_ready && !last.internal_state.engine_ready {
        events.push(PlayerEvent::EngineReady {
            state: Arc::clone(current),
        });
    }

    if let Some(error) = &current.error {
        events.push(PlayerEvent::Error {
            error: error.clone(),
            state: Arc::clone(current),
        });
    }

    memory.last = Arc::clone(current);
    events
}

fn derive_session(
    memory: &mut Memory,
    last: &Arc<Snapshot>,
    current: &Arc<Snapshot>,
    events: &mut Vec<PlayerEvent>,
) {
    let before = last.playback_info.as_ref();
    let after = current.playback_info.as_ref();
    let flag_before = |flag: fn(&ControlState) -> bool| before.map_or(false, |i| flag(&i.control_state));
    let flag_after = |flag: fn(&ControlState) -> bool| after.map_or(false, |i| flag(&i.control_state));
    let rose = |flag: fn(&ControlState) -> bool| flag_after(flag) && !flag_before(flag);
    let fell = |flag: fn(&ControlState) -> bool| flag_before(flag) && !flag_after(flag);

    // New session.
    if rose(|c| c.is_starting_new_audio_playable) {
        if let Some(info) = after {
            events.push(PlayerEvent::NewAudiobook {
                audio_playable: Arc::clone(&info.audio_playable),
                state: Arc::clone(current),
            });
        }
    }

    // Loading.
    let was_loading = before.map_or(false, |i| i.is_loading);
    let is_loading = after.map_or(false, |i| i.is_loading);
    if is_loading && !was_loading {
        events.push(PlayerEvent::LoadingStarted {
            state: Arc::clone(current),
        });
    } else if was_loading && !is_loading {
        events.push(PlayerEvent::LoadingEnded {
            state: Arc::clone(current),
        });
    }

    // Play / pause.
    let previous_state = before.map_or(PlaybackState::Idle, |i| i.playback_state);
    let playback_state = after.map_or(PlaybackState::Idle, |i| i.playback_state);
    if playback_state != previous_state {
        match playback_state {
            PlaybackState::Playing => events.push(PlayerEvent::Played {
                state: Arc::clone(current),
            }),
            PlaybackState::Paused => events.push(PlayerEvent::Paused {
                state: Arc::clone(current),
            }),
            PlaybackState::Idle => {}
        }
    }

    // Stop.
    let stopped_now = rose(|c| c.is_stopping);
    if stopped_now {
        events.push(PlayerEvent::Stopped {
            state: Arc::clone(current),
        });
        memory.stopped = true;
        memory.seek_start = None;
    }

    // Content ended.
    if rose(|c| c.has_content_ended) {
        events.push(PlayerEvent::ContentEnded {
            state: Arc::clone(current),
        });
    }

    // Seek begin / end.
    if rose(|c| c.is_seeking) {
        memory.seek_start = Some(Arc::clone(current));
        events.push(PlayerEvent::Discontinuity {
            state: Arc::clone(current),
        });
    } else if fell(|c| c.is_seeking) && !stopped_now && seek_failed(current) {
        // Reported through on_error; the seek never resolved.
        memory.seek_start = None;
        debug!("Seek abandoned after engine failure");
    } else if fell(|c| c.is_seeking) && !stopped_now {
        let before = memory.seek_start.take().unwrap_or_else(|| Arc::clone(last));
        let control = before
            .playback_info
            .as_ref()
            .map(|info| info.control_state.clone())
            .unwrap_or_default();
        let after = Arc::clone(current);
        events.push(match control.seek_intent() {
            SeekIntent::FastForward => PlayerEvent::FastForwarded { before, after },
            SeekIntent::Rewind => PlayerEvent::Rewound { before, after },
            SeekIntent::NextChapter => PlayerEvent::SkippedToNext { before, after },
            SeekIntent::PreviousChapter => PlayerEvent::SkippedToPrevious { before, after },
            SeekIntent::Arbitrary => PlayerEvent::Seeked {
                target: control.seek_target,
                before,
                after,
            },
        });
    }

    // Progress update for session listeners.
    if rose(|c| c.is_playback_state_updating) {
        if let Some(info) = after {
            events.push(PlayerEvent::PlaybackStateUpdated {
                info: info.clone(),
                chapter_index: info.control_state.updated_chapter_index,
            });
        }
    }

    // Speed and skip distance, only once a session has been seen.
    if let (Some(previous), Some(info)) = (before, after) {
        if previous.playback_speed != info.playback_speed {
            events.push(PlayerEvent::SpeedChanged {
                state: Arc::clone(current),
                old: previous.playback_speed,
                new: info.playback_speed,
            });
        }
        if previous.skip_distance != info.skip_distance {
            events.push(PlayerEvent::SkipDistanceChanged {
                state: Arc::clone(current),
                old: previous.skip_distance,
                new: info.skip_distance,
            });
        }
    }

    // Custom action. A different name while the flag stays raised counts too.
    let custom_action = |info: Option<&PlaybackInfo>| {
        info.filter(|i| i.control_state.is_custom_action)
            .map(|i| i.control_state.custom_action_name.clone().unwrap_or_default())
    };
    if let Some(name) = custom_action(after) {
        if custom_action(before).as_ref() != Some(&name) {
            events.push(PlayerEvent::CustomAction {
                name,
                state: Arc::clone(current),
            });
        }
    }
}

fn seek_failed(snapshot: &Snapshot) -> bool {
    snapshot
        .error
        .as_ref()
        .map_or(false, |error| error.code == ErrorCode::SeekFailed)
}

fn derive_downloads(last: &Snapshot, current: &Arc<Snapshot>, events: &mut Vec<PlayerEvent>) {
    for progress in &current.downloads {
        if last.download(&progress.url) != Some(progress) {
            events.push(PlayerEvent::DownloadUpdated {
                progress: progress.clone(),
                state: Arc::clone(current),
            });
        }
    }
    for progress in &last.downloads {
        if current.download(&progress.url).is_none() {
            events.push(PlayerEvent::DownloadRemoved {
                url: progress.url.clone(),
                state: Arc::clone(current),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::PlayerListener;
    use bridge_traits::MediaRequest;
    use core_playback::{
        AudioPlayable, Chapter, Command, DiscrepancyTolerance, DownloadProgress, DownloadState,
        ErrorCode, Reducer,
    };
    use mockall::mock;

    mock! {
        Player {}

        impl PlayerListener for Player {
            fn on_new_audiobook(&self, state: &Snapshot);
            fn on_discontinuity(&self, state: &Snapshot);
            fn on_fast_forward(&self, before: &Snapshot, after: &Snapshot);
            fn on_rewind(&self, before: &Snapshot, after: &Snapshot);
            fn on_skip_to_next(&self, before: &Snapshot, after: &Snapshot);
            fn on_skip_to_previous(&self, before: &Snapshot, after: &Snapshot);
            fn on_seek(&self, target: Option<Duration>, before: &Snapshot, after: &Snapshot);
            fn on_stop(&self, state: &Snapshot);
            fn on_error(&self, error: &PlayerError, state: &Snapshot);
        }
    }

    /// Records the names of the callbacks it receives.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, call: impl Into<String>) {
            self.calls.lock().push(call.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.calls.lock())
        }
    }

    impl PlayerListener for Recorder {
        fn on_new_audiobook(&self, _: &Snapshot) {
            self.push("new_audiobook");
        }
        fn on_loading_start(&self, _: &Snapshot) {
            self.push("loading_start");
        }
        fn on_loading_end(&self, _: &Snapshot) {
            self.push("loading_end");
        }
        fn on_play(&self, _: &Snapshot) {
            self.push("play");
        }
        fn on_pause(&self, _: &Snapshot) {
            self.push("pause");
        }
        fn on_stop(&self, _: &Snapshot) {
            self.push("stop");
        }
        fn on_content_ended(&self, _: &Snapshot) {
            self.push("content_ended");
        }
        fn on_discontinuity(&self, _: &Snapshot) {
            self.push("discontinuity");
        }
        fn on_fast_forward(&self, _: &Snapshot, _: &Snapshot) {
            self.push("fast_forward");
        }
        fn on_rewind(&self, _: &Snapshot, _: &Snapshot) {
            self.push("rewind");
        }
        fn on_skip_to_next(&self, _: &Snapshot, _: &Snapshot) {
            self.push("skip_to_next");
        }
        fn on_skip_to_previous(&self, _: &Snapshot, _: &Snapshot) {
            self.push("skip_to_previous");
        }
        fn on_seek(&self, target: Option<Duration>, _: &Snapshot, _: &Snapshot) {
            self.push(format!("seek:{:?}", target.map(|t| t.as_secs())));
        }
        fn on_speed_change(&self, _: &Snapshot, old: f32, new: f32) {
            self.push(format!("speed:{}->{}", old, new));
        }
        fn on_skip_distance_change(&self, _: &Snapshot, _: Duration, new: Duration) {
            self.push(format!("skip_distance:{}", new.as_secs()));
        }
        fn on_custom_action(&self, name: &str, _: &Snapshot) {
            self.push(format!("custom:{}", name));
        }
        fn on_error(&self, error: &PlayerError, _: &Snapshot) {
            self.push(format!("error:{}", error.code.code()));
        }
        fn on_download_update(&self, progress: &DownloadProgress, _: &Snapshot) {
            self.push(format!("download:{}", progress.url));
        }
        fn on_download_removed(&self, url: &str, _: &Snapshot) {
            self.push(format!("download_removed:{}", url));
        }
        fn on_engine_ready(&self, _: &Snapshot) {
            self.push("engine_ready");
        }
    }

    /// Drives an engine synchronously through a reducer.
    struct Harness {
        engine: EventEngine,
        reducer: Reducer,
        state: Arc<Snapshot>,
    }

    impl Harness {
        fn new(listener: Arc<dyn PlayerListener>) -> Self {
            let registry = Arc::new(ListenerRegistry::new());
            registry.add_player_listener(listener);
            Self {
                engine: EventEngine::new(
                    Arc::new(Store::default()),
                    registry,
                    &PlayerConfig::default(),
                ),
                reducer: Reducer::default(),
                state: Arc::new(Snapshot::default()),
            }
        }

        fn apply(&mut self, command: Command) {
            self.state = Arc::new(self.reducer.reduce(&self.state, command).unwrap());
            self.engine.process(Arc::clone(&self.state));
        }
    }

    fn load(id: &str) -> Command {
        Command::NewAudioPlayable {
            audio_playable: Arc::new(
                AudioPlayable::new(id, "Book", MediaRequest::new("file:///book.m4b"))
                    .with_chapters(vec![Chapter::new(Duration::ZERO, Duration::from_secs(5))]),
            ),
            max_discrepancy: DiscrepancyTolerance::Within(Duration::from_secs(1)),
            initial_offset: Duration::ZERO,
        }
    }

    fn end_seek() -> Command {
        Command::Seek {
            is_seeking: false,
            target: None,
        }
    }

    #[test]
    fn fast_forward_resolution_fires_only_fast_forward() {
        let mut player = MockPlayer::new();
        player.expect_on_new_audiobook().times(1).return_const(());
        player.expect_on_discontinuity().times(1).return_const(());
        player
            .expect_on_fast_forward()
            .withf(|before, after| {
                let start = &before.playback_info.as_ref().unwrap().control_state;
                let end = &after.playback_info.as_ref().unwrap().control_state;
                start.is_fast_forwarding && start.is_seeking && !end.is_seeking
            })
            .times(1)
            .return_const(());
        player.expect_on_rewind().never();
        player.expect_on_skip_to_next().never();
        player.expect_on_skip_to_previous().never();
        player.expect_on_seek().never();
        player.expect_on_stop().never();
        player.expect_on_error().never();

        let mut harness = Harness::new(Arc::new(player));
        harness.apply(load("a"));
        harness.apply(Command::FastForward {
            target: Duration::from_secs(3),
        });
        harness.apply(end_seek());
    }

    #[test]
    fn failed_fast_forward_does_not_taint_the_next_seek() {
        let recorder = Arc::new(Recorder::default());
        let mut harness = Harness::new(recorder.clone());
        harness.apply(load("a"));
        recorder.take();

        harness.apply(Command::FastForward {
            target: Duration::from_secs(4),
        });
        harness.apply(Command::Error(PlayerError::new(
            ErrorCode::SeekFailed,
            "engine refused",
        )));
        harness.apply(Command::ClearError);
        assert_eq!(recorder.take(), vec!["discontinuity", "error:2004"]);

        harness.apply(Command::Rewind {
            target: Duration::from_secs(1),
        });
        harness.apply(end_seek());
        assert_eq!(recorder.take(), vec!["discontinuity", "rewind"]);
    }

    #[test]
    fn seek_kinds_are_classified_from_the_start_snapshot() {
        let recorder = Arc::new(Recorder::default());
        let mut harness = Harness::new(recorder.clone());
        harness.apply(load("a"));
        recorder.take();

        let cases = [
            (
                Command::Rewind {
                    target: Duration::ZERO,
                },
                "rewind",
            ),
            (
                Command::SkipNext {
                    target: Duration::from_secs(4),
                },
                "skip_to_next",
            ),
            (
                Command::SkipPrev {
                    target: Duration::ZERO,
                },
                "skip_to_previous",
            ),
            (
                Command::Seek {
                    is_seeking: true,
                    target: Some(Duration::from_secs(2)),
                },
                "seek:Some(2)",
            ),
        ];
        for (command, expected) in cases {
            harness.apply(command);
            harness.apply(end_seek());
            assert_eq!(recorder.take(), vec!["discontinuity", expected]);
        }
    }

    #[test]
    fn one_snapshot_may_raise_several_events() {
        let recorder = Arc::new(Recorder::default());
        let mut harness = Harness::new(recorder.clone());

        harness.apply(load("a"));
        assert_eq!(recorder.take(), vec!["new_audiobook", "loading_start"]);

        harness.apply(Command::LoadingChanged(false));
        harness.apply(Command::PlayerStateChanged(PlaybackState::Playing));
        harness.apply(Command::PlayerStateChanged(PlaybackState::Paused));
        assert_eq!(recorder.take(), vec!["loading_end", "play", "pause"]);
    }

    #[test]
    fn speed_change_is_not_reported_on_first_load() {
        let recorder = Arc::new(Recorder::default());
        let mut harness = Harness::new(recorder.clone());

        harness.apply(load("a"));
        harness.apply(Command::SpeedChanged(1.5));
        harness.apply(Command::SkipDistanceChanged(Duration::from_secs(10)));

        let calls = recorder.take();
        assert!(!calls[..2].iter().any(|c| c.starts_with("speed")));
        assert_eq!(&calls[2..], &["speed:1->1.5", "skip_distance:10"]);
    }

    #[test]
    fn stop_resets_memory_for_next_session() {
        let recorder = Arc::new(Recorder::default());
        let mut harness = Harness::new(recorder.clone());

        harness.apply(load("a"));
        harness.apply(Command::SpeedChanged(2.0));
        harness.apply(Command::PlayerStateChanged(PlaybackState::Idle));
        recorder.take();

        harness.apply(load("b"));
        // Speed drops back to 1.0 but the stop cleared the previous session.
        assert_eq!(recorder.take(), vec!["new_audiobook", "loading_start"]);
    }

    #[test]
    fn stopped_book_reports_play_but_not_a_second_stop() {
        let recorder = Arc::new(Recorder::default());
        let mut harness = Harness::new(recorder.clone());

        harness.apply(load("a"));
        harness.apply(Command::PlayerStateChanged(PlaybackState::Idle));
        assert_eq!(recorder.take().last().map(String::as_str), Some("stop"));

        harness.apply(Command::PlayerStateChanged(PlaybackState::Idle));
        harness.apply(Command::UpdateDownload(DownloadProgress::new(
            "d",
            "https://cdn/a",
            DownloadState::Completed,
        )));
        assert_eq!(recorder.take(), vec!["download:https://cdn/a"]);

        harness.apply(Command::PlayerStateChanged(PlaybackState::Playing));
        harness.apply(Command::PlayerStateChanged(PlaybackState::Paused));
        assert_eq!(recorder.take(), vec!["play", "pause"]);
    }

    #[test]
    fn progress_updates_reach_session_listeners_on_rising_edge() {
        let recorder = Arc::new(Recorder::default());
        let mut harness = Harness::new(recorder.clone());
        let mut bus = harness.engine.subscribe();

        harness.apply(load("a"));
        harness.apply(Command::UpdateProgress {
            is_updated: true,
            chapter_index: Some(0),
        });
        harness.apply(Command::UpdateProgress {
            is_updated: true,
            chapter_index: None,
        });

        let mut updates = 0;
        while let Ok(event) = bus.try_recv() {
            if matches!(event, PlayerEvent::PlaybackStateUpdated { .. }) {
                updates += 1;
            }
        }
        assert_eq!(updates, 1);
    }

    #[test]
    fn custom_action_content_end_and_errors() {
        let recorder = Arc::new(Recorder::default());
        let mut harness = Harness::new(recorder.clone());

        harness.apply(load("a"));
        harness.apply(Command::CustomAction {
            name: "bookmark".into(),
        });
        harness.apply(Command::PlaybackProgress {
            position: Duration::from_secs(9),
            duration: None,
        });
        harness.apply(Command::ContentEnded);

        let calls = recorder.take();
        assert_eq!(
            &calls[2..],
            &["custom:bookmark", "content_ended", "error:2003"]
        );
    }

    #[test]
    fn downloads_drm_and_readiness() {
        let recorder = Arc::new(Recorder::default());
        let mut harness = Harness::new(recorder.clone());
        let mut bus = harness.engine.subscribe();

        harness.apply(Command::EngineReady(true));
        harness.apply(Command::UpdateDownload(DownloadProgress::new(
            "d",
            "https://cdn/a",
            DownloadState::Started {
                percent: 1.0,
                bytes_downloaded: 1,
            },
        )));
        harness.apply(Command::StopTrackingDownload(DownloadProgress::new(
            "d",
            "https://cdn/a",
            DownloadState::Removed,
        )));
        harness.apply(Command::DrmLicenseOpening(core_playback::DrmInfo {
            drm_type: "widevine".into(),
            expires_at: None,
            session_valid: true,
        }));

        assert_eq!(
            recorder.take(),
            vec![
                "engine_ready",
                "download:https://cdn/a",
                "download_removed:https://cdn/a"
            ]
        );
        let names: Vec<_> = std::iter::from_fn(|| bus.try_recv().ok())
            .map(|event| event.name())
            .collect();
        assert_eq!(names.last(), Some(&"drm_state_change"));
    }

    #[test]
    fn reported_errors_use_last_snapshot() {
        let mut player = MockPlayer::new();
        player
            .expect_on_error()
            .withf(|error, state| error.code == ErrorCode::SeekFailed && !state.has_session())
            .times(1)
            .return_const(());

        let harness = Harness::new(Arc::new(player));
        harness
            .engine
            .report_error(PlayerError::new(ErrorCode::SeekFailed, "engine refused"));
    }

    #[test]
    fn destroy_is_idempotent() {
        let harness = Harness::new(Arc::new(Recorder::default()));
        harness.engine.destroy();
        harness.engine.destroy();
        assert!(!harness.engine.is_running());
        assert!(!harness.engine.last_snapshot().has_session());
    }

    #[test]
    fn begin_requires_runtime_and_interval() {
        let harness = Harness::new(Arc::new(Recorder::default()));
        assert!(matches!(
            harness.engine.begin(Duration::ZERO),
            Err(EngineError::InvalidPollInterval)
        ));
        assert!(matches!(
            harness.engine.begin(Duration::from_secs(1)),
            Err(EngineError::NoRuntime)
        ));
    }
}
