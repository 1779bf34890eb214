// src/domain/progress.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::episode::EpisodeNumber;
use super::reconciled::ReconciledList;
use super::MediaId;

/// Highest completed episode number of one media item.
/// The metadata service owns it; the local copy is an offline checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMark {
    pub media_id: MediaId,
    pub progress: u32,
    pub updated_at: DateTime<Utc>,
}

impl ProgressMark {
    pub fn new(media_id: MediaId, progress: u32) -> Self {
        Self {
            media_id,
            progress,
            updated_at: Utc::now(),
        }
    }
}

/// Result of a progress write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressOutcome {
    /// Accepted locally and by the metadata service
    Recorded { progress: u32 },
    /// Not strictly greater than the current value; nothing changed
    Rejected { current: u32 },
    /// Metadata service unreachable; kept as a local checkpoint only
    SavedLocally { progress: u32 },
}

impl ProgressOutcome {
    pub fn progress(&self) -> u32 {
        match self {
            ProgressOutcome::Recorded { progress } | ProgressOutcome::SavedLocally { progress } => {
                *progress
            }
            ProgressOutcome::Rejected { current } => *current,
        }
    }
}

/// "Watched" and "continue watching" markers for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchMarkers {
    pub progress: u32,
    /// First episode after the progress mark, if any
    pub continue_watching: Option<EpisodeNumber>,
    pub watched_count: usize,
    pub remaining: usize,
}

impl WatchMarkers {
    pub fn compute(list: &ReconciledList, progress: u32) -> Self {
        let watched_count = list
            .episodes
            .iter()
            .filter(|e| Self::watched(e.number, progress))
            .count();

        // Lowest unwatched number, whatever the display order
        let continue_watching = list
            .episodes
            .iter()
            .map(|e| e.number)
            .filter(|n| !Self::watched(*n, progress))
            .min();

        Self {
            progress,
            continue_watching,
            watched_count,
            remaining: list.len() - watched_count,
        }
    }

    pub fn is_watched(&self, number: EpisodeNumber) -> bool {
        Self::watched(number, self.progress)
    }

    fn watched(number: EpisodeNumber, progress: u32) -> bool {
        number.value() <= f64::from(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::episode::{Episode, EpisodeSource};
    use crate::domain::SortOrder;

    fn list(n: u32, order: SortOrder) -> ReconciledList {
        let mut list = ReconciledList::empty(MediaId(1));
        list.episodes = (1..=n)
            .map(|i| {
                Episode::new(
                    format!("e{}", i),
                    EpisodeNumber::whole(i).unwrap(),
                    EpisodeSource::MetadataService,
                )
            })
            .collect();
        list.with_sort_order(order)
    }

    #[test]
    fn test_markers_mid_series() {
        let markers = WatchMarkers::compute(&list(12, SortOrder::Ascending), 5);
        assert_eq!(markers.watched_count, 5);
        assert_eq!(markers.remaining, 7);
        assert_eq!(markers.continue_watching.unwrap().as_whole(), Some(6));
        assert!(markers.is_watched(EpisodeNumber::whole(5).unwrap()));
        assert!(!markers.is_watched(EpisodeNumber::new(5.5).unwrap()));
    }

    #[test]
    fn test_continue_watching_ignores_display_order() {
        let markers = WatchMarkers::compute(&list(12, SortOrder::Descending), 3);
        assert_eq!(markers.continue_watching.unwrap().as_whole(), Some(4));
    }

    #[test]
    fn test_markers_when_finished() {
        let markers = WatchMarkers::compute(&list(3, SortOrder::Ascending), 3);
        assert!(markers.continue_watching.is_none());
        assert_eq!(markers.remaining, 0);
    }
}
