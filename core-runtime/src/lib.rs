//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the audiobook core crates:
//! - Logging and tracing infrastructure
//! - Player configuration
//! - A typed broadcast event bus
//!
//! ## Overview
//!
//! Nothing in here knows about playback semantics. The state machine
//! (`core-playback`) and the event derivation engine (`core-events`) build on
//! these pieces so that logging conventions, configuration validation and
//! event fan-out look the same everywhere.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::PlayerConfig;
pub use error::{Error, Result};
