//! Audiobook playback kit.
//!
//! Re-exports the workspace crates behind feature flags so hosts can depend
//! on a single crate:
//!
//! - `service` (default): the [`AudiobookPlayer`](service::AudiobookPlayer)
//!   façade with the state store and event engine wired together.
//! - `state-only`: the command model, reducer and state store.
//! - `events`: the state store plus the event derivation engine, for hosts
//!   that drive their own media session.

#[cfg(feature = "service")]
pub use core_service as service;

#[cfg(any(feature = "events", feature = "state-only"))]
pub use core_playback as playback;

#[cfg(feature = "events")]
pub use core_events as events;
