//! Audiobook player façade.
//!
//! This crate wires a host-provided [`MediaEngine`] into the playback state
//! store and the event derivation engine. Hosts construct an
//! [`AudiobookPlayer`], register listeners, call [`AudiobookPlayer::start`]
//! and then forward their engine, download and DRM reports to it.
//!
//! ```no_run
//! use bridge_traits::{MediaEngine, MediaRequest};
//! use core_playback::{AudioPlayable, Chapter};
//! use core_runtime::PlayerConfig;
//! use core_service::{AudiobookPlayer, PlayerDependencies};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(engine: Arc<dyn MediaEngine>) -> core_service::Result<()> {
//! let player = AudiobookPlayer::new(PlayerConfig::default(), PlayerDependencies::new(engine))?;
//! player.start()?;
//!
//! let book = AudioPlayable::new("b1", "Dune", MediaRequest::new("https://cdn.example.com/dune.m4b"))
//!     .with_chapters(vec![Chapter::new(Duration::ZERO, Duration::from_secs(3600))]);
//! player.load(book, Duration::ZERO).await?;
//! player.play().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod player;

pub use error::{CoreError, Result};
pub use player::AudiobookPlayer;

use bridge_traits::{Clock, MediaEngine, SystemClock};
use std::sync::Arc;

/// Aggregated handle to the bridge dependencies the player requires.
#[derive(Clone)]
pub struct PlayerDependencies {
    pub media_engine: Arc<dyn MediaEngine>,
    /// Used to judge license expiry.
    pub clock: Arc<dyn Clock>,
}

impl PlayerDependencies {
    /// Construct a dependency bundle using the system clock.
    pub fn new(media_engine: Arc<dyn MediaEngine>) -> Self {
        Self {
            media_engine,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
