//! # Player Configuration
//!
//! Settings shared by the store, the reducer and the event derivation engine.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::PlayerConfig;
//! use std::time::Duration;
//!
//! let config = PlayerConfig::builder()
//!     .poll_interval(Duration::from_millis(500))
//!     .default_skip_distance(Duration::from_secs(15))
//!     .max_discrepancy_secs(2.0)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.poll_interval(), Duration::from_millis(500));
//! ```
//!
//! Hosts that ship configuration as JSON can deserialize it directly; every
//! field has a default:
//!
//! ```
//! use core_runtime::config::PlayerConfig;
//!
//! let config = PlayerConfig::from_json_str(r#"{ "trace_capacity": 50 }"#).unwrap();
//! assert_eq!(config.trace_capacity, 50);
//! assert_eq!(config.poll_interval_ms, 1000);
//! ```
//!
//! ## Discrepancy tolerance
//!
//! `max_discrepancy_secs` only seeds the reducer. Each new audiobook carries
//! its own tolerance, which replaces the seeded value for the rest of that
//! session. A negative value disables duration verification entirely.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound accepted for playback speed.
pub const MAX_PLAYBACK_SPEED: f32 = 4.0;

/// Configuration for a player instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Interval of the telemetry poll callback, in milliseconds.
    ///
    /// Default: 1000 ms.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Number of commands kept in a snapshot's diagnostic trace.
    ///
    /// Default: 20.
    #[serde(default = "default_trace_capacity")]
    pub trace_capacity: usize,

    /// Speed every new audiobook starts with.
    ///
    /// Default: 1.0.
    #[serde(default = "default_playback_speed")]
    pub default_playback_speed: f32,

    /// Fast-forward / rewind distance used when no previous session set one,
    /// in seconds.
    ///
    /// Default: 30 s.
    #[serde(default = "default_skip_distance_secs")]
    pub default_skip_distance_secs: u64,

    /// Allowed difference between chapter metadata and the real media length,
    /// in seconds. Negative disables the check.
    ///
    /// Default: -1 (disabled).
    #[serde(default = "default_max_discrepancy_secs")]
    pub max_discrepancy_secs: f64,

    /// Buffer size of the derived-event broadcast bus.
    ///
    /// Default: 100.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            trace_capacity: default_trace_capacity(),
            default_playback_speed: default_playback_speed(),
            default_skip_distance_secs: default_skip_distance_secs(),
            max_discrepancy_secs: default_max_discrepancy_secs(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}

impl PlayerConfig {
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn default_skip_distance(&self) -> Duration {
        Duration::from_secs(self.default_skip_distance_secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidValue {
                field: "poll_interval_ms",
                message: "must be greater than zero".to_string(),
            });
        }

        if self.trace_capacity == 0 {
            return Err(Error::InvalidValue {
                field: "trace_capacity",
                message: "must be greater than zero".to_string(),
            });
        }

        if !(self.default_playback_speed > 0.0 && self.default_playback_speed <= MAX_PLAYBACK_SPEED)
        {
            return Err(Error::InvalidValue {
                field: "default_playback_speed",
                message: format!(
                    "{} is outside (0, {}]",
                    self.default_playback_speed, MAX_PLAYBACK_SPEED
                ),
            });
        }

        if self.default_skip_distance_secs == 0 {
            return Err(Error::InvalidValue {
                field: "default_skip_distance_secs",
                message: "must be greater than zero".to_string(),
            });
        }

        if self.max_discrepancy_secs.is_nan() {
            return Err(Error::InvalidValue {
                field: "max_discrepancy_secs",
                message: "must be a number".to_string(),
            });
        }

        if self.event_buffer_size == 0 {
            return Err(Error::InvalidValue {
                field: "event_buffer_size",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for [`PlayerConfig`].
#[derive(Debug, Default)]
pub struct PlayerConfigBuilder {
    poll_interval: Option<Duration>,
    trace_capacity: Option<usize>,
    default_playback_speed: Option<f32>,
    default_skip_distance: Option<Duration>,
    max_discrepancy_secs: Option<f64>,
    event_buffer_size: Option<usize>,
}

impl PlayerConfigBuilder {
    /// Sets the telemetry poll interval. Sub-millisecond precision is dropped.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn trace_capacity(mut self, capacity: usize) -> Self {
        self.trace_capacity = Some(capacity);
        self
    }

    pub fn default_playback_speed(mut self, speed: f32) -> Self {
        self.default_playback_speed = Some(speed);
        self
    }

    /// Sets the skip distance used by the first session. Rounded down to whole
    /// seconds.
    pub fn default_skip_distance(mut self, distance: Duration) -> Self {
        self.default_skip_distance = Some(distance);
        self
    }

    pub fn max_discrepancy_secs(mut self, secs: f64) -> Self {
        self.max_discrepancy_secs = Some(secs);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the configuration, failing fast on invalid values.
    pub fn build(self) -> Result<PlayerConfig> {
        let defaults = PlayerConfig::default();
        let config = PlayerConfig {
            poll_interval_ms: self
                .poll_interval
                .map(|d| d.as_millis() as u64)
                .unwrap_or(defaults.poll_interval_ms),
            trace_capacity: self.trace_capacity.unwrap_or(defaults.trace_capacity),
            default_playback_speed: self
                .default_playback_speed
                .unwrap_or(defaults.default_playback_speed),
            default_skip_distance_secs: self
                .default_skip_distance
                .map(|d| d.as_secs())
                .unwrap_or(defaults.default_skip_distance_secs),
            max_discrepancy_secs: self
                .max_discrepancy_secs
                .unwrap_or(defaults.max_discrepancy_secs),
            event_buffer_size: self.event_buffer_size.unwrap_or(defaults.event_buffer_size),
        };

        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_trace_capacity() -> usize {
    20
}

fn default_playback_speed() -> f32 {
    1.0
}

fn default_skip_distance_secs() -> u64 {
    30
}

fn default_max_discrepancy_secs() -> f64 {
    -1.0
}

fn default_event_buffer_size() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trace_capacity, 20);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.default_skip_distance(), Duration::from_secs(30));
        assert!(config.max_discrepancy_secs < 0.0);
    }

    #[test]
    fn test_builder_overrides() {
        let config = PlayerConfig::builder()
            .poll_interval(Duration::from_millis(250))
            .trace_capacity(5)
            .default_playback_speed(1.25)
            .default_skip_distance(Duration::from_secs(10))
            .max_discrepancy_secs(1.5)
            .event_buffer_size(8)
            .build()
            .unwrap();

        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.trace_capacity, 5);
        assert_eq!(config.default_playback_speed, 1.25);
        assert_eq!(config.default_skip_distance_secs, 10);
        assert_eq!(config.max_discrepancy_secs, 1.5);
        assert_eq!(config.event_buffer_size, 8);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = PlayerConfig::builder()
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidValue {
                field: "poll_interval_ms",
                ..
            }
        ));
    }

    #[test]
    fn test_speed_out_of_range_rejected() {
        assert!(PlayerConfig::builder()
            .default_playback_speed(0.0)
            .build()
            .is_err());
        assert!(PlayerConfig::builder()
            .default_playback_speed(MAX_PLAYBACK_SPEED + 0.5)
            .build()
            .is_err());
    }

    #[test]
    fn test_zero_trace_capacity_rejected() {
        assert!(PlayerConfig::builder().trace_capacity(0).build().is_err());
    }

    #[test]
    fn test_from_json_with_partial_fields() {
        let config =
            PlayerConfig::from_json_str(r#"{ "poll_interval_ms": 200, "max_discrepancy_secs": 3 }"#)
                .unwrap();
        assert_eq!(config.poll_interval_ms, 200);
        assert_eq!(config.max_discrepancy_secs, 3.0);
        assert_eq!(config.trace_capacity, 20);
    }

    #[test]
    fn test_from_json_rejects_invalid_values() {
        assert!(matches!(
            PlayerConfig::from_json_str(r#"{ "event_buffer_size": 0 }"#),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            PlayerConfig::from_json_str("not json"),
            Err(Error::Parse(_))
        ));
    }
}
