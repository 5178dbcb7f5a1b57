//! # Playback Event Derivation
//!
//! Watches the playback state store and reports what happened between
//! consecutive snapshots as discrete, classified events.
//!
//! ## Overview
//!
//! - [`EventEngine`]: subscribes to the store, diffs each snapshot against
//!   the last one and fires callbacks; also drives a fixed-interval poll
//! - [`PlayerListener`] / [`SessionListener`]: callback interfaces
//! - [`ListenerRegistry`]: the listeners one engine reports to
//! - [`PlayerEvent`]: the same events as values, broadcast on an event bus
//!
//! ## Usage
//!
//! ```no_run
//! use core_events::{EventEngine, ListenerRegistry, PlayerListener};
//! use core_playback::{Snapshot, Store};
//! use core_runtime::PlayerConfig;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PlayerListener for Printer {
//!     fn on_play(&self, _state: &Snapshot) {
//!         println!("playing");
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = PlayerConfig::default();
//! let store = Arc::new(Store::new(&config));
//! store.init_default();
//!
//! let registry = Arc::new(ListenerRegistry::new());
//! registry.add_player_listener(Arc::new(Printer));
//!
//! let engine = EventEngine::new(store, registry, &config);
//! engine.begin(config.poll_interval()).unwrap();
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod event;
pub mod listener;

pub use engine::EventEngine;
pub use error::{EngineError, Result};
pub use event::PlayerEvent;
pub use listener::{ListenerRegistry, PlayerListener, SessionListener};
