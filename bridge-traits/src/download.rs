//! Reports from the host download subsystem.

use serde::{Deserialize, Serialize};

/// Lifecycle notification for a single download, keyed by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum DownloadEvent {
    Progress {
        id: String,
        url: String,
        percent: f32,
        bytes_downloaded: u64,
    },
    Completed {
        id: String,
        url: String,
    },
    Removed {
        id: String,
        url: String,
    },
    Failed {
        id: String,
        url: String,
        reason: Option<String>,
    },
}

impl DownloadEvent {
    pub fn url(&self) -> &str {
        match self {
            DownloadEvent::Progress { url, .. }
            | DownloadEvent::Completed { url, .. }
            | DownloadEvent::Removed { url, .. }
            | DownloadEvent::Failed { url, .. } => url,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DownloadEvent::Progress { id, .. }
            | DownloadEvent::Completed { id, .. }
            | DownloadEvent::Removed { id, .. }
            | DownloadEvent::Failed { id, .. } => id,
        }
    }
}
