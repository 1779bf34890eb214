// src/services/reconciler.rs
//
// Episode Reconciler
//
// Merges raw episode sets from one or more providers into one canonical,
// ordered, deduplicated list.
//
// CRITICAL RULES:
// - One episode per number; the map is keyed by `EpisodeNumber`
// - Trust order comes from `EpisodeSet::trust_rank` (lower = more trusted),
//   never from argument order, so merging is order-independent
// - The most trusted source seeds the map; later sources only add numbers that
//   are still absent. Existing fields (title, filler/recap tags, ids) are kept
// - Every contributing source still attaches its provider refs, and audio
//   availability is the union of all sources' flags
// - Malformed numbers are discarded and logged, never synthesized
// - Gaps are reported, never filled
// - Pure: the only side effect is logging

use chrono::Utc;
use std::collections::BTreeMap;

use crate::domain::{
    validate_reconciled_list, Episode, EpisodeNumber, EpisodeSet, MediaId, ProviderKind,
    ReconciledList, SortOrder,
};

/// Canonical facts supplied by the metadata service, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileHint {
    pub max_known_episode: Option<u32>,
}

impl ReconcileHint {
    pub fn new(max_known_episode: Option<u32>) -> Self {
        Self { max_known_episode }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EpisodeReconciler;

impl EpisodeReconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(
        &self,
        media_id: MediaId,
        hint: ReconcileHint,
        mut sets: Vec<EpisodeSet>,
        order: SortOrder,
    ) -> ReconciledList {
        sets.sort_by(|a, b| {
            (a.trust_rank, a.provider, a.audio).cmp(&(b.trust_rank, b.provider, b.audio))
        });

        let mut merged: BTreeMap<EpisodeNumber, Episode> = BTreeMap::new();
        let mut providers: Vec<ProviderKind> = Vec::new();
        let mut primary_max: Option<EpisodeNumber> = hint
            .max_known_episode
            .and_then(|n| EpisodeNumber::whole(n).ok());
        let primary_rank = sets.first().map(|s| s.trust_rank);

        for set in sets {
            let is_primary = Some(set.trust_rank) == primary_rank;
            let mut contributed = false;

            for raw in set.episodes {
                let provider = raw.source_provider;
                let raw_number = raw.raw_number.clone();
                let episode = match raw.into_episode() {
                    Ok(episode) => episode,
                    Err(e) => {
                        log::warn!(
                            "Discarding {} episode with number {:?}: {}",
                            provider,
                            raw_number,
                            e
                        );
                        continue;
                    }
                };
                contributed = true;

                if !is_primary && primary_max.is_some_and(|max| episode.number > max) {
                    log::debug!(
                        "{} has episode {} ahead of the primary source",
                        provider,
                        episode.number
                    );
                }

                match merged.get_mut(&episode.number) {
                    Some(existing) => Self::absorb(existing, &episode),
                    None => {
                        merged.insert(episode.number, episode);
                    }
                }
            }

            if is_primary {
                let set_max = merged.keys().next_back().copied();
                primary_max = primary_max.max(set_max);
            }
            if contributed && !providers.contains(&set.provider) {
                providers.push(set.provider);
            }
        }

        let mut list = ReconciledList {
            media_id,
            episodes: merged.into_values().collect(),
            sort_order: SortOrder::Ascending,
            providers,
            canonical_episode_count: hint.max_known_episode,
            reconciled_at: Utc::now(),
        };
        if order == SortOrder::Descending {
            list = list.with_sort_order(order);
        }

        let gaps = list.gaps();
        if !gaps.is_empty() {
            log::info!(
                "Media {} reconciled with {} missing episode number(s): {:?}",
                media_id,
                gaps.len(),
                gaps
            );
        }
        if let Err(e) = validate_reconciled_list(&list) {
            log::error!("Reconciled list for media {} is inconsistent: {}", media_id, e);
        }

        list
    }

    /// Fold a lower-trust duplicate into the surviving episode.
    fn absorb(existing: &mut Episode, incoming: &Episode) {
        for (provider, reference) in &incoming.provider_refs {
            existing.attach_ref(*provider, reference);
        }
        existing.audio = existing.audio.union(incoming.audio);
    }
}
