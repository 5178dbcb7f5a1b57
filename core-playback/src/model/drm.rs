//! DRM license state.

use bridge_traits::{DrmEvent, DrmSessionInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// License details carried by every DRM state except `NoDrm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrmInfo {
    pub drm_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub session_valid: bool,
}

impl DrmInfo {
    /// Whether the license has expired at `now`. Licenses without an expiry
    /// never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expiry| expiry <= now)
    }
}

impl From<DrmSessionInfo> for DrmInfo {
    fn from(info: DrmSessionInfo) -> Self {
        Self {
            drm_type: info.scheme,
            expires_at: info.expires_at,
            session_valid: info.session_valid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum DrmState {
    #[default]
    NoDrm,
    LicenseOpening(DrmInfo),
    LicenseAcquired(DrmInfo),
    LicenseExpired(DrmInfo),
    LicenseUsable(DrmInfo),
    LicenseReleased(DrmInfo),
    LicenseError { info: DrmInfo, message: String },
}

impl DrmState {
    pub fn info(&self) -> Option<&DrmInfo> {
        match self {
            DrmState::NoDrm => None,
            DrmState::LicenseOpening(info)
            | DrmState::LicenseAcquired(info)
            | DrmState::LicenseExpired(info)
            | DrmState::LicenseUsable(info)
            | DrmState::LicenseReleased(info)
            | DrmState::LicenseError { info, .. } => Some(info),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrmState::NoDrm => "NoDrm",
            DrmState::LicenseOpening(_) => "LicenseOpening",
            DrmState::LicenseAcquired(_) => "LicenseAcquired",
            DrmState::LicenseExpired(_) => "LicenseExpired",
            DrmState::LicenseUsable(_) => "LicenseUsable",
            DrmState::LicenseReleased(_) => "LicenseReleased",
            DrmState::LicenseError { .. } => "LicenseError",
        }
    }
}

impl From<DrmEvent> for DrmState {
    fn from(event: DrmEvent) -> Self {
        match event {
            DrmEvent::Opening(info) => DrmState::LicenseOpening(info.into()),
            DrmEvent::Acquired(info) => DrmState::LicenseAcquired(info.into()),
            DrmEvent::Expired(info) => DrmState::LicenseExpired(info.into()),
            DrmEvent::Usable(info) => DrmState::LicenseUsable(info.into()),
            DrmEvent::Released(info) => DrmState::LicenseReleased(info.into()),
            DrmEvent::Error { session, message } => DrmState::LicenseError {
                info: session.into(),
                message,
            },
        }
    }
}
