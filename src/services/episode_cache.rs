// src/services/episode_cache.rs
//
// Cache Layer
//
// Last successfully reconciled list per media id, served instantly on the
// next open while a fresh pass runs.
//
// CRITICAL RULES:
// - `save` replaces the whole entry; nothing is merged into a cached list
// - A missing or unreadable entry is "absent", never an error to the UI
// - Eviction only through `invalidate` (explicit user action)
// - The sync store is only touched from `spawn_blocking`

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::domain::{MediaId, ReconciledList};
use crate::error::AppResult;
use crate::repositories::{storage_keys, KeyValueRepository};

// ============================================================================
// JSON HELPERS OVER THE KEY-VALUE STORE
// ============================================================================

/// Read and decode `key`. Undecodable values count as absent.
pub(crate) async fn load_json<T>(store: &Arc<dyn KeyValueRepository>, key: String) -> AppResult<Option<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || -> AppResult<Option<T>> {
        let Some(raw) = store.get(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Ignoring unreadable value under '{}': {}", key, e);
                Ok(None)
            }
        }
    })
    .await?
}

pub(crate) async fn save_json<T>(store: &Arc<dyn KeyValueRepository>, key: String, value: &T) -> AppResult<()>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || store.set(&key, &raw)).await?
}

pub(crate) async fn remove_key(store: &Arc<dyn KeyValueRepository>, key: String) -> AppResult<()> {
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || store.remove(&key)).await?
}

// ============================================================================
// EPISODE CACHE
// ============================================================================

#[derive(Clone)]
pub struct EpisodeCache {
    store: Arc<dyn KeyValueRepository>,
}

impl EpisodeCache {
    pub fn new(store: Arc<dyn KeyValueRepository>) -> Self {
        Self { store }
    }

    pub async fn load(&self, media_id: MediaId) -> AppResult<Option<ReconciledList>> {
        let cached: Option<ReconciledList> =
            load_json(&self.store, storage_keys::episodes(media_id)).await?;

        // An entry filed under the wrong id is as good as none
        Ok(cached.filter(|list| {
            let matches = list.media_id == media_id;
            if !matches {
                log::warn!("Cached list under media {} belongs to media {}", media_id, list.media_id);
            }
            matches
        }))
    }

    pub async fn save(&self, media_id: MediaId, list: &ReconciledList) -> AppResult<()> {
        save_json(&self.store, storage_keys::episodes(media_id), list).await?;
        log::debug!("Cached {} episodes for media {}", list.len(), media_id);
        Ok(())
    }

    pub async fn invalidate(&self, media_id: MediaId) -> AppResult<()> {
        remove_key(&self.store, storage_keys::episodes(media_id)).await?;
        log::info!("Cleared cached episodes for media {}", media_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Episode, EpisodeNumber, EpisodeSource, ProviderKind};
    use crate::repositories::InMemoryKeyValueRepository;

    fn list(media_id: MediaId, count: u32) -> ReconciledList {
        let mut list = ReconciledList::empty(media_id);
        list.providers = vec![ProviderKind::HiAnime];
        list.episodes = (1..=count)
            .map(|n| {
                Episode::new(
                    format!("ep-{}", n),
                    EpisodeNumber::whole(n).unwrap(),
                    EpisodeSource::Provider(ProviderKind::HiAnime),
                )
            })
            .collect();
        list
    }

    fn cache() -> (EpisodeCache, Arc<dyn KeyValueRepository>) {
        let store: Arc<dyn KeyValueRepository> = Arc::new(InMemoryKeyValueRepository::new());
        (EpisodeCache::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_load_missing_is_absent() {
        let (cache, _) = cache();
        assert!(cache.load(MediaId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_whole_entry() {
        let (cache, _) = cache();
        let replacement = list(MediaId(1), 3);
        cache.save(MediaId(1), &list(MediaId(1), 12)).await.unwrap();
        cache.save(MediaId(1), &replacement).await.unwrap();

        let loaded = cache.load(MediaId(1)).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded, replacement);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_absent() {
        let (cache, store) = cache();
        store.set("media:1:episodes", "{not json").unwrap();
        assert!(cache.load(MediaId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (cache, _) = cache();
        cache.save(MediaId(2), &list(MediaId(2), 2)).await.unwrap();
        cache.invalidate(MediaId(2)).await.unwrap();
        assert!(cache.load(MediaId(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_are_keyed_per_media() {
        let (cache, _) = cache();
        cache.save(MediaId(3), &list(MediaId(3), 5)).await.unwrap();
        assert!(cache.load(MediaId(4)).await.unwrap().is_none());
        assert_eq!(cache.load(MediaId(3)).await.unwrap().unwrap().len(), 5);
    }
}
