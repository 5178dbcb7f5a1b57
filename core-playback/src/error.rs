//! # Playback Error Types
//!
//! Two disjoint classes of failure exist:
//!
//! - [`PlaybackError`] is returned by [`Store::dispatch`](crate::store::Store::dispatch)
//!   when the caller broke the sequencing contract. These are programming
//!   errors: never retried, always reported.
//! - [`PlayerError`](crate::codes::PlayerError) is a soft, business-level
//!   error carried on a snapshot for exactly one tick.

use crate::codes::{ErrorCode, PlayerError};
use thiserror::Error;

/// Errors returned by the state store and reducer.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Contract Violations
    // ========================================================================
    /// A session-scoped command arrived while no audiobook was loaded.
    #[error("`{command}` requires an active playback session")]
    ActionBeforeSetup { command: &'static str },

    /// A host handed over a command name the core does not know.
    #[error("Unrecognized command: {0}")]
    UnrecognizedCommand(String),

    /// `dispatch`/`current` called before `init`.
    #[error("State store has not been initialized")]
    StoreNotInitialized,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),
}

impl PlaybackError {
    /// Stable code reported to downstream error reporting.
    pub fn code(&self) -> ErrorCode {
        match self {
            PlaybackError::ActionBeforeSetup { .. } => ErrorCode::ActionBeforeSetup,
            PlaybackError::UnrecognizedCommand(_) => ErrorCode::UnrecognizedCommand,
            PlaybackError::StoreNotInitialized => ErrorCode::SdkNotInitialized,
            PlaybackError::Config(_) => ErrorCode::InvalidConfiguration,
        }
    }

    /// Returns `true` when the caller issued a command the state could never
    /// accept.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            PlaybackError::ActionBeforeSetup { .. }
                | PlaybackError::UnrecognizedCommand(_)
                | PlaybackError::StoreNotInitialized
        )
    }
}

impl From<&PlaybackError> for PlayerError {
    fn from(error: &PlaybackError) -> Self {
        PlayerError::new(error.code(), error.to_string())
    }
}

/// Result type for state-machine operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
