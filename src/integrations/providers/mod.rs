// src/integrations/providers/mod.rs
//
// Provider Adapters
//
// CRITICAL RULES:
// - Every backend implements the same capability (`ProviderAdapter`)
// - Adapters normalize responses into `RawEpisode`s tagged with their provider
//   and audio availability
// - Network/parse failures become a typed `ProviderError`; nothing panics and
//   nothing raw escapes this boundary
// - A provider missing from the registry behaves like one that never finds anything

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{AudioMode, AudioType, MediaId, ProviderKind, RawEpisode, SearchCandidate};
use crate::error::ProviderError;
use crate::integrations::http::RateLimitedFetcher;
use crate::services::title_resolver;

pub mod animepahe;
pub mod gogoanime;
pub mod hianime;

pub use animepahe::AnimePaheAdapter;
pub use gogoanime::GogoanimeAdapter;
pub use hianime::HiAnimeAdapter;

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn audio_mode(&self) -> AudioMode;

    /// Raw catalogue search
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, ProviderError>;

    /// Map a canonical title onto this provider's catalogue id.
    async fn resolve(
        &self,
        title: &str,
        canonical_id: Option<MediaId>,
    ) -> Result<String, ProviderError> {
        let candidates = self.search(title).await?;
        title_resolver::resolve_title(title, canonical_id, &candidates)
            .map(|found| found.candidate.id.clone())
            .ok_or_else(|| ProviderError::NotFound {
                provider: self.kind(),
                title: title.to_string(),
            })
    }

    /// Episodes of a catalogue entry. `audio` selects the track on per-track
    /// providers and is ignored by combined ones.
    async fn get_episodes(
        &self,
        provider_media_id: &str,
        audio: Option<AudioType>,
    ) -> Result<Vec<RawEpisode>, ProviderError>;
}

/// Base URLs of the provider APIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    pub hianime: Option<String>,
    pub gogoanime: Option<String>,
    pub animepahe: Option<String>,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            hianime: Some("http://localhost:3000/anime/zoro".to_string()),
            gogoanime: Some("http://localhost:3000/anime/gogoanime".to_string()),
            animepahe: Some("http://localhost:3000/anime/animepahe".to_string()),
        }
    }
}

/// The configured adapters, looked up by kind.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one adapter per configured endpoint, all sharing `fetcher`.
    pub fn from_endpoints(fetcher: &RateLimitedFetcher, endpoints: &ProviderEndpoints) -> Self {
        let mut registry = Self::new();
        if let Some(url) = &endpoints.hianime {
            registry.register(Arc::new(HiAnimeAdapter::new(fetcher.clone(), url.clone())));
        }
        if let Some(url) = &endpoints.gogoanime {
            registry.register(Arc::new(GogoanimeAdapter::new(fetcher.clone(), url.clone())));
        }
        if let Some(url) = &endpoints.animepahe {
            registry.register(Arc::new(AnimePaheAdapter::new(fetcher.clone(), url.clone())));
        }
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self.adapters.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

/// Providers report episode numbers as JSON numbers or strings; keep them raw.
pub(crate) fn raw_number(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

pub(crate) fn decode_failure(provider: ProviderKind, what: &str, err: impl std::fmt::Display) -> ProviderError {
    ProviderError::Failed {
        provider,
        reason: format!("unexpected {} response: {}", what, err),
    }
}
