//! Download tracking entries, unique by URL.

use bridge_traits::DownloadEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum DownloadState {
    Started { percent: f32, bytes_downloaded: u64 },
    Completed,
    Removed,
    Failed { reason: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub id: String,
    pub url: String,
    pub state: DownloadState,
}

impl DownloadProgress {
    pub fn new(id: impl Into<String>, url: impl Into<String>, state: DownloadState) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            state,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, DownloadState::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, DownloadState::Failed { .. })
    }
}

impl From<DownloadEvent> for DownloadProgress {
    fn from(event: DownloadEvent) -> Self {
        match event {
            DownloadEvent::Progress {
                id,
                url,
                percent,
                bytes_downloaded,
            } => DownloadProgress::new(
                id,
                url,
                DownloadState::Started {
                    percent: percent.clamp(0.0, 100.0),
                    bytes_downloaded,
                },
            ),
            DownloadEvent::Completed { id, url } => {
                DownloadProgress::new(id, url, DownloadState::Completed)
            }
            DownloadEvent::Removed { id, url } => {
                DownloadProgress::new(id, url, DownloadState::Removed)
            }
            DownloadEvent::Failed { id, url, reason } => {
                DownloadProgress::new(id, url, DownloadState::Failed { reason })
            }
        }
    }
}
