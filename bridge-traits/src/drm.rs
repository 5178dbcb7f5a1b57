//! Reports from the host DRM layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the DRM layer knows about the current license session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrmSessionInfo {
    /// Scheme identifier as reported by the host (`"widevine"`, `"fairplay"`,
    /// `"playready"`, `"clearkey"`).
    pub scheme: String,
    /// License expiry, if the license is time limited.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the DRM session can still decrypt.
    pub session_valid: bool,
}

/// License lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum DrmEvent {
    Opening(DrmSessionInfo),
    Acquired(DrmSessionInfo),
    Expired(DrmSessionInfo),
    Usable(DrmSessionInfo),
    Released(DrmSessionInfo),
    Error {
        session: DrmSessionInfo,
        message: String,
    },
}
