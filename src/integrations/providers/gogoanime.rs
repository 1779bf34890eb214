// src/integrations/providers/gogoanime.rs
//
// Gogoanime: audio-track-specific. The dub catalogue entry is a separate
// page whose id is the sub id with a "-dub" suffix; each call serves one track.

use async_trait::async_trait;
use serde::Deserialize;

use super::{decode_failure, raw_number, ProviderAdapter};
use crate::domain::{
    AudioAvailability, AudioMode, AudioType, CatalogKind, ProviderKind, ProviderRef, RawEpisode,
    SearchCandidate,
};
use crate::error::ProviderError;
use crate::integrations::http::{HttpRequest, RateLimitedFetcher};

const KIND: ProviderKind = ProviderKind::Gogoanime;
const DUB_SUFFIX: &str = "-dub";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    id: String,
    title: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    sub_or_dub: Option<String>,
}

impl SearchItem {
    fn is_dub_entry(&self) -> bool {
        self.sub_or_dub.as_deref() == Some("dub") || self.id.ends_with(DUB_SUFFIX)
    }
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    episodes: Vec<EpisodeItem>,
}

#[derive(Debug, Deserialize)]
struct EpisodeItem {
    id: String,
    number: Option<serde_json::Value>,
    title: Option<String>,
}

pub struct GogoanimeAdapter {
    fetcher: RateLimitedFetcher,
    base_url: String,
}

impl GogoanimeAdapter {
    pub fn new(fetcher: RateLimitedFetcher, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Catalogue id serving the requested track.
    fn track_id(provider_media_id: &str, track: AudioType) -> String {
        let base = provider_media_id.trim_end_matches(DUB_SUFFIX);
        match track {
            AudioType::Sub => base.to_string(),
            AudioType::Dub => format!("{}{}", base, DUB_SUFFIX),
        }
    }
}

#[async_trait]
impl ProviderAdapter for GogoanimeAdapter {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    fn audio_mode(&self) -> AudioMode {
        AudioMode::PerTrack
    }

    /// Dub entries are dropped: resolution always lands on the sub entry and
    /// `get_episodes` derives the dub id from it.
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, ProviderError> {
        let request = HttpRequest::get(format!("{}/search", self.base_url)).query("keyw", query);
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
            .filter(|item| !item.is_dub_entry())
            .map(|item| {
                let kind = item
                    .kind
                    .as_deref()
                    .map_or(CatalogKind::Other, CatalogKind::from_label);
                SearchCandidate::new(item.id, item.title, kind)
            })
            .collect())
    }

    async fn get_episodes(
        &self,
        provider_media_id: &str,
        audio: Option<AudioType>,
    ) -> Result<Vec<RawEpisode>, ProviderError> {
        let track = audio.unwrap_or(AudioType::Sub);
        let id = Self::track_id(provider_media_id, track);

        let request = HttpRequest::get(format!("{}/info", self.base_url)).query("id", id.as_str());
        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| ProviderError::from_fetch(KIND, e))?;
        let body: InfoResponse = response
            .json()
            .map_err(|e| decode_failure(KIND, "info", e))?;

        Ok(body
            .episodes
            .into_iter()
            .map(|item| {
                RawEpisode::new(
                    KIND,
                    item.id.clone(),
                    raw_number(item.number.as_ref()),
                    AudioAvailability::only(track),
                )
                .with_title(item.title)
                .with_provider_ref(ProviderRef::for_track(track, item.id))
            })
            .collect())
    }
}
