//! # Error Taxonomy
//!
//! Stable numeric error codes consumed by downstream error reporting.
//!
//! Codes are grouped by family in blocks of one hundred. A code, once
//! published, never changes meaning; new codes are appended inside their
//! family block. Serialized form is the bare number.
//!
//! | Family          | Range     |
//! |-----------------|-----------|
//! | Session/config  | 1000-1099 |
//! | Playback        | 2000-2099 |
//! | Download        | 3000-3099 |
//! | Misc            | 4000-4099 |
//! | Browse          | 5000-5099 |
//! | Renderer        | 6000-6099 |
//! | DRM             | 7000-7099 |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error family, derived from the code's thousands block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorFamily {
    Session,
    Playback,
    Download,
    Misc,
    Browse,
    Renderer,
    Drm,
}

/// Enumerated error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // Session / configuration
    SdkNotInitialized = 1000,
    InvalidConfiguration = 1001,
    ActionBeforeSetup = 1002,
    UnrecognizedCommand = 1003,
    SessionExpired = 1004,

    // Playback
    PlaybackFailed = 2000,
    SourceUnavailable = 2001,
    UnsupportedFormat = 2002,
    IncorrectChapterMetadata = 2003,
    SeekFailed = 2004,
    EngineNotReady = 2005,

    // Download
    DownloadFailed = 3000,
    DownloadStorageFull = 3001,
    DownloadNotFound = 3002,

    // Misc
    Unknown = 4000,
    Internal = 4001,
    Network = 4002,

    // Browse
    BrowseFailed = 5000,
    ContentNotFound = 5001,

    // Renderer
    RendererInitFailed = 6000,
    AudioSinkError = 6001,
    DecoderInitFailed = 6002,

    // DRM
    LicenseAcquisitionFailed = 7000,
    LicenseExpired = 7001,
    LicenseReleaseFailed = 7002,
    UnsupportedDrmScheme = 7003,
    DrmSessionError = 7004,
}

impl ErrorCode {
    const ALL: &'static [ErrorCode] = &[
        ErrorCode::SdkNotInitialized,
        ErrorCode::InvalidConfiguration,
        ErrorCode::ActionBeforeSetup,
        ErrorCode::UnrecognizedCommand,
        ErrorCode::SessionExpired,
        ErrorCode::PlaybackFailed,
        ErrorCode::SourceUnavailable,
        ErrorCode::UnsupportedFormat,
        ErrorCode::IncorrectChapterMetadata,
        ErrorCode::SeekFailed,
        ErrorCode::EngineNotReady,
        ErrorCode::DownloadFailed,
        ErrorCode::DownloadStorageFull,
        ErrorCode::DownloadNotFound,
        ErrorCode::Unknown,
        ErrorCode::Internal,
        ErrorCode::Network,
        ErrorCode::BrowseFailed,
        ErrorCode::ContentNotFound,
        ErrorCode::RendererInitFailed,
        ErrorCode::AudioSinkError,
        ErrorCode::DecoderInitFailed,
        ErrorCode::LicenseAcquisitionFailed,
        ErrorCode::LicenseExpired,
        ErrorCode::LicenseReleaseFailed,
        ErrorCode::UnsupportedDrmScheme,
        ErrorCode::DrmSessionError,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    pub fn family(self) -> ErrorFamily {
        match self.code() / 1000 {
            1 => ErrorFamily::Session,
            2 => ErrorFamily::Playback,
            3 => ErrorFamily::Download,
            5 => ErrorFamily::Browse,
            6 => ErrorFamily::Renderer,
            7 => ErrorFamily::Drm,
            _ => ErrorFamily::Misc,
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::from_code(value).ok_or_else(|| format!("unknown error code {}", value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// A classified error as seen by listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerError {
    pub code: ErrorCode,
    pub message: String,
}

impl PlayerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn family(&self) -> ErrorFamily {
        self.code.family()
    }
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for PlayerError {}
