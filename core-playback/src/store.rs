//! # State Store
//!
//! Holds the single live [`Snapshot`], serializes every transition through
//! the [`Reducer`] and republishes each result to subscribers.
//!
//! ## Ordering
//!
//! `dispatch` reduces and publishes while holding the store lock, so
//! subscribers observe transitions in dispatch order. Each subscriber has its
//! own unbounded queue: no intermediate snapshot is dropped or coalesced, and
//! publishing never waits on a slow consumer. Consumers may dispatch from
//! their own tasks without deadlocking the writer.
//!
//! ## Replay-one
//!
//! A new subscription first receives the current snapshot (when the store has
//! been seeded), then every snapshot published afterwards.
//!
//! ## Errors
//!
//! A snapshot carrying a soft error is published once. The store then drops
//! the error from the snapshot it retains, so the next transition starts
//! clean and no second snapshot is published for the clearing.
//!
//! Contract violations are returned from `dispatch` and also broadcast on the
//! error channel returned by [`Store::errors`].

use crate::action::Command;
use crate::codes::PlayerError;
use crate::error::{PlaybackError, Result};
use crate::model::Snapshot;
use crate::reducer::Reducer;
use core_runtime::PlayerConfig;
use futures::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

struct StoreInner {
    current: Option<Arc<Snapshot>>,
    reducer: Reducer,
    subscribers: Vec<mpsc::UnboundedSender<Arc<Snapshot>>>,
}

/// The authoritative holder of player state.
pub struct Store {
    inner: Mutex<StoreInner>,
    errors: broadcast::Sender<PlayerError>,
    trace_capacity: usize,
}

impl Store {
    pub fn new(config: &PlayerConfig) -> Self {
        let (errors, _) = broadcast::channel(config.event_buffer_size);
        Self {
            inner: Mutex::new(StoreInner {
                current: None,
                reducer: Reducer::new(config),
                subscribers: Vec::new(),
            }),
            errors,
            trace_capacity: config.trace_capacity,
        }
    }

    /// Seeds the store with an empty snapshot sized from the configuration.
    pub fn init_default(&self) {
        self.init(Snapshot::new(self.trace_capacity));
    }

    /// Seeds (or reseeds) the store and publishes `initial` to subscribers.
    pub fn init(&self, initial: Snapshot) {
        let snapshot = Arc::new(initial);
        let mut inner = self.inner.lock();
        inner.current = Some(Arc::clone(&snapshot));
        publish(&mut inner.subscribers, &snapshot);
        debug!("State store initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().current.is_some()
    }

    /// The most recently retained snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::StoreNotInitialized`] before [`Store::init`].
    pub fn current(&self) -> Result<Arc<Snapshot>> {
        self.inner
            .lock()
            .current
            .clone()
            .ok_or(PlaybackError::StoreNotInitialized)
    }

    /// Applies `command` and publishes the resulting snapshot.
    ///
    /// Returns the snapshot as published, including any soft error it
    /// carries.
    pub fn dispatch(&self, command: Command) -> Result<Arc<Snapshot>> {
        let label = command.label();
        let mut inner = self.inner.lock();

        let current = inner.current.clone();
        let result = match current {
            Some(current) => inner.reducer.reduce(&current, command),
            None => Err(PlaybackError::StoreNotInitialized),
        };

        let next = match result {
            Ok(next) => Arc::new(next),
            Err(error) => {
                drop(inner);
                warn!(command = label, error = %error, "Rejected command");
                // Nobody listening is fine.
                let _ = self.errors.send(PlayerError::from(&error));
                return Err(error);
            }
        };

        debug!(
            command = label,
            update = next.trace.update_count(),
            subscribers = inner.subscribers.len(),
            "Dispatched"
        );

        publish(&mut inner.subscribers, &next);

        inner.current = Some(if next.error.is_some() {
            let mut retained = (*next).clone();
            retained.error = None;
            Arc::new(retained)
        } else {
            Arc::clone(&next)
        });

        Ok(next)
    }

    /// Subscribes to snapshots, starting with the current one.
    pub fn subscribe(&self) -> SnapshotStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        if let Some(current) = &inner.current {
            // The receiver is alive, so this cannot fail.
            let _ = sender.send(Arc::clone(current));
        }
        inner.subscribers.push(sender);
        SnapshotStream { receiver }
    }

    /// Receives contract violations rejected by [`Store::dispatch`].
    pub fn errors(&self) -> broadcast::Receiver<PlayerError> {
        self.errors.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|sender| !sender.is_closed());
        inner.subscribers.len()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(&PlayerConfig::default())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Store")
            .field("initialized", &inner.current.is_some())
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

fn publish(subscribers: &mut Vec<mpsc::UnboundedSender<Arc<Snapshot>>>, snapshot: &Arc<Snapshot>) {
    subscribers.retain(|sender| sender.send(Arc::clone(snapshot)).is_ok());
}

/// Ordered stream of published snapshots.
#[derive(Debug)]
pub struct SnapshotStream {
    receiver: mpsc::UnboundedReceiver<Arc<Snapshot>>,
}

impl SnapshotStream {
    /// Waits for the next snapshot. `None` once the store is dropped.
    pub async fn recv(&mut self) -> Option<Arc<Snapshot>> {
        self.receiver.recv().await
    }

    /// Returns the next snapshot if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<Snapshot>> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for SnapshotStream {
    type Item = Arc<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
