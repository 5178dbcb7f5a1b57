//! Audiobook metadata as the player sees it.

use bridge_traits::MediaRequest;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A chapter inside an audiobook, positioned on the audiobook's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: Option<String>,
    /// Offset of the first sample of this chapter.
    pub start: Duration,
    pub duration: Duration,
}

impl Chapter {
    pub fn new(start: Duration, duration: Duration) -> Self {
        Self {
            title: None,
            start,
            duration,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn end(&self) -> Duration {
        self.start.saturating_add(self.duration)
    }

    /// Whether `position` falls in `[start, start + duration)`.
    pub fn contains(&self, position: Duration) -> bool {
        position >= self.start && position < self.end()
    }
}

/// Something the engine can play: an audiobook with its chapter list and the
/// request used to fetch its audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPlayable {
    pub id: String,
    pub title: String,
    pub chapters: Vec<Chapter>,
    pub request: MediaRequest,
}

impl AudioPlayable {
    pub fn new(id: impl Into<String>, title: impl Into<String>, request: MediaRequest) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            chapters: Vec::new(),
            request,
        }
    }

    pub fn with_chapters(mut self, chapters: Vec<Chapter>) -> Self {
        self.chapters = chapters;
        self
    }

    /// Sum of all chapter durations, as declared by the metadata.
    pub fn duration(&self) -> Duration {
        self.chapters
            .iter()
            .fold(Duration::ZERO, |total, chapter| total.saturating_add(chapter.duration))
    }

    /// Index of the chapter playing at `position`.
    ///
    /// The last chapter is selected for any position at or after its start,
    /// so engine positions slightly past the declared end still resolve.
    /// Positions that fall in a gap map to the closest preceding chapter.
    pub fn chapter_index_at(&self, position: Duration) -> usize {
        let Some(last) = self.chapters.len().checked_sub(1) else {
            return 0;
        };

        if let Some(index) = self.chapters[..last]
            .iter()
            .position(|chapter| chapter.contains(position))
        {
            return index;
        }

        if position >= self.chapters[last].start {
            return last;
        }

        self.chapters
            .iter()
            .rposition(|chapter| chapter.start <= position)
            .unwrap_or(0)
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }
}
