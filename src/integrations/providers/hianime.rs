// src/integrations/providers/hianime.rs
//
// HiAnime: one info call serves both tracks, with per-episode
// `isSubbed` / `isDubbed` / `isFiller` flags.

use async_trait::async_trait;
use serde::Deserialize;

use super::{decode_failure, raw_number, ProviderAdapter};
use crate::domain::{
    AudioAvailability, AudioFlag, AudioMode, AudioType, CatalogKind, MediaId, ProviderKind,
    ProviderRef, RawEpisode, SearchCandidate,
};
use crate::error::ProviderError;
use crate::integrations::http::{HttpRequest, RateLimitedFetcher};

const KIND: ProviderKind = ProviderKind::HiAnime;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: String,
    title: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "alID")]
    anilist_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    episodes: Vec<EpisodeItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodeItem {
    id: String,
    number: Option<serde_json::Value>,
    title: Option<String>,
    #[serde(default)]
    is_filler: bool,
    is_subbed: Option<bool>,
    is_dubbed: Option<bool>,
}

impl EpisodeItem {
    /// Flags come from the response only; a missing flag stays unknown.
    fn audio(&self) -> AudioAvailability {
        AudioAvailability {
            sub: self.is_subbed.map_or(AudioFlag::Unknown, AudioFlag::from_bool),
            dub: self.is_dubbed.map_or(AudioFlag::Unknown, AudioFlag::from_bool),
        }
    }

    fn into_raw(self) -> RawEpisode {
        let audio = self.audio();
        let mut raw = RawEpisode::new(KIND, self.id.clone(), raw_number(self.number.as_ref()), audio)
            .with_title(self.title)
            .with_provider_ref(ProviderRef::combined(self.id));
        raw.is_filler = self.is_filler;
        raw
    }
}

pub struct HiAnimeAdapter {
    fetcher: RateLimitedFetcher,
    base_url: String,
}

impl HiAnimeAdapter {
    pub fn new(fetcher: RateLimitedFetcher, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for HiAnimeAdapter {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    fn audio_mode(&self) -> AudioMode {
        AudioMode::Combined
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, ProviderError> {
        let request = HttpRequest::get(format!("{}/search", self.base_url)).query("q", query);
        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| ProviderError::from_fetch(KIND, e))?;
        let body: SearchResponse = response
            .json()
            .map_err(|e| decode_failure(KIND, "search", e))?;

        Ok(body
            .results
            .into_iter()
            .map(|item| {
                let kind = item
                    .kind
                    .as_deref()
                    .map_or(CatalogKind::Other, CatalogKind::from_label);
                let candidate = SearchCandidate::new(item.id, item.title, kind);
                match item.anilist_id {
                    Some(id) => candidate.with_canonical_id(MediaId(id)),
                    None => candidate,
                }
            })
            .collect())
    }

    async fn get_episodes(
        &self,
        provider_media_id: &str,
        _audio: Option<AudioType>,
    ) -> Result<Vec<RawEpisode>, ProviderError> {
        let request =
            HttpRequest::get(format!("{}/info", self.base_url)).query("id", provider_media_id);
        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| ProviderError::from_fetch(KIND, e))?;
        let body: InfoResponse = response
            .json()
            .map_err(|e| decode_failure(KIND, "info", e))?;

        Ok(body.episodes.into_iter().map(EpisodeItem::into_raw).collect())
    }
}
