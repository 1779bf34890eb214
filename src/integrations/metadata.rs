// src/integrations/metadata.rs
//
// The metadata/catalog service seen from the engine: canonical episode count
// and the user's progress, keyed by canonical media id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::MediaId;
use crate::error::AppResult;

/// Canonical facts about one media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalMedia {
    pub id: MediaId,
    pub title: Option<String>,
    pub episodes: Option<u32>,
    /// Number of the next episode still to air, for ongoing shows
    pub next_airing_episode: Option<u32>,
    /// Highest completed episode on the user's list, if the entry exists
    pub progress: Option<u32>,
}

impl CanonicalMedia {
    /// Episodes known to exist: the announced total, or what has aired so far.
    pub fn known_episode_count(&self) -> Option<u32> {
        self.episodes
            .or_else(|| self.next_airing_episode.map(|next| next.saturating_sub(1)))
            .filter(|count| *count > 0)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataService: Send + Sync {
    async fn fetch_media(&self, media_id: MediaId) -> AppResult<CanonicalMedia>;

    /// Remote progress; 0 when the user has no list entry
    async fn fetch_progress(&self, media_id: MediaId) -> AppResult<u32>;

    /// Store progress remotely and return the value the service kept
    async fn save_progress(&self, media_id: MediaId, progress: u32) -> AppResult<u32>;

    async fn canonical_episode_count(&self, media_id: MediaId) -> AppResult<Option<u32>> {
        Ok(self.fetch_media(media_id).await?.known_episode_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(episodes: Option<u32>, next: Option<u32>) -> CanonicalMedia {
        CanonicalMedia {
            id: MediaId(1),
            title: None,
            episodes,
            next_airing_episode: next,
            progress: None,
        }
    }

    #[test]
    fn test_known_episode_count() {
        assert_eq!(media(Some(24), Some(5)).known_episode_count(), Some(24));
        assert_eq!(media(None, Some(8)).known_episode_count(), Some(7));
        assert_eq!(media(None, Some(1)).known_episode_count(), None);
        assert_eq!(media(None, None).known_episode_count(), None);
    }
}
