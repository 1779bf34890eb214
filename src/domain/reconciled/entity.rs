// src/domain/reconciled/entity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::episode::{AudioType, Episode, EpisodeNumber, RawEpisode};
use crate::domain::{MediaId, ProviderKind};

/// Display order of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Raw episodes from one provider call, with the trust it was given for this run.
/// Lower `trust_rank` means higher trust; rank 0 is the primary source.
#[derive(Debug, Clone)]
pub struct EpisodeSet {
    pub provider: ProviderKind,
    /// Track requested from a per-track provider, `None` for combined calls
    pub audio: Option<AudioType>,
    pub trust_rank: u32,
    pub episodes: Vec<RawEpisode>,
}

impl EpisodeSet {
    pub fn new(provider: ProviderKind, trust_rank: u32, episodes: Vec<RawEpisode>) -> Self {
        Self {
            provider,
            audio: None,
            trust_rank,
            episodes,
        }
    }

    pub fn with_audio(mut self, audio: AudioType) -> Self {
        self.audio = Some(audio);
        self
    }
}

/// The canonical, ordered, deduplicated episode sequence of one media item.
/// Replaced wholesale on every successful reconciliation, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledList {
    pub media_id: MediaId,
    pub episodes: Vec<Episode>,
    pub sort_order: SortOrder,
    /// Providers that contributed at least one episode, in trust order
    pub providers: Vec<ProviderKind>,
    pub canonical_episode_count: Option<u32>,
    pub reconciled_at: DateTime<Utc>,
}

impl ReconciledList {
    pub fn empty(media_id: MediaId) -> Self {
        Self {
            media_id,
            episodes: Vec::new(),
            sort_order: SortOrder::Ascending,
            providers: Vec::new(),
            canonical_episode_count: None,
            reconciled_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn get(&self, number: EpisodeNumber) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.number == number)
    }

    pub fn numbers(&self) -> Vec<EpisodeNumber> {
        self.episodes.iter().map(|e| e.number).collect()
    }

    pub fn highest_number(&self) -> Option<EpisodeNumber> {
        self.episodes.iter().map(|e| e.number).max()
    }

    /// A copy of this list in the requested order.
    pub fn with_sort_order(&self, order: SortOrder) -> ReconciledList {
        let mut sorted = self.clone();
        sorted.sort_order = order;
        match order {
            SortOrder::Ascending => sorted.episodes.sort_by(|a, b| a.number.cmp(&b.number)),
            SortOrder::Descending => sorted.episodes.sort_by(|a, b| b.number.cmp(&a.number)),
        }
        sorted
    }

    /// Whole episode numbers missing between 1 and the highest known number
    /// (or the canonical count when that is larger). Reported, never filled.
    pub fn gaps(&self) -> Vec<u32> {
        let highest = self
            .highest_number()
            .map(|n| n.value().floor() as u32)
            .unwrap_or(0);
        let upper = highest.max(self.canonical_episode_count.unwrap_or(0));

        let present: BTreeSet<u32> = self
            .episodes
            .iter()
            .filter_map(|e| e.number.as_whole())
            .collect();

        (1..=upper).filter(|n| !present.contains(n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::episode::EpisodeSource;

    fn list_of(numbers: &[f64]) -> ReconciledList {
        let mut list = ReconciledList::empty(MediaId(1));
        list.episodes = numbers
            .iter()
            .map(|n| {
                Episode::new(
                    format!("ep-{}", n),
                    EpisodeNumber::new(*n).unwrap(),
                    EpisodeSource::Provider(ProviderKind::HiAnime),
                )
            })
            .collect();
        list
    }

    #[test]
    fn test_with_sort_order_reorders_copy() {
        let list = list_of(&[1.0, 2.0, 3.0]);
        let desc = list.with_sort_order(SortOrder::Descending);
        assert_eq!(desc.numbers()[0].as_whole(), Some(3));
        assert_eq!(desc.sort_order, SortOrder::Descending);
        // original untouched
        assert_eq!(list.numbers()[0].as_whole(), Some(1));
    }

    #[test]
    fn test_gaps_reports_missing_whole_numbers() {
        let mut list = list_of(&[1.0, 2.0, 4.0, 4.5, 6.0]);
        assert_eq!(list.gaps(), vec![3, 5]);

        list.canonical_episode_count = Some(8);
        assert_eq!(list.gaps(), vec![3, 5, 7, 8]);
    }

    #[test]
    fn test_empty_list() {
        let list = ReconciledList::empty(MediaId(7));
        assert!(list.is_empty());
        assert!(list.highest_number().is_none());
        assert!(list.gaps().is_empty());
    }
}
