// src/integrations/providers/animepahe.rs
//
// AnimePahe: audio-track-specific (`audio=jpn|eng`), episode listing is
// paginated and followed to the last page.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::{decode_failure, raw_number, ProviderAdapter};
use crate::domain::{
    AudioAvailability, AudioMode, AudioType, CatalogKind, ProviderKind, ProviderRef, RawEpisode,
    SearchCandidate,
};
use crate::error::ProviderError;
use crate::integrations::http::{HttpRequest, RateLimitedFetcher};

const KIND: ProviderKind = ProviderKind::AnimePahe;

/// Upper bound on followed episode pages
const MAX_EPISODE_PAGES: u32 = 50;

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
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodePage {
    #[serde(default)]
    episodes: Vec<EpisodeItem>,
    #[serde(default = "single_page")]
    episode_pages: u32,
}

fn single_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodeItem {
    id: String,
    number: Option<serde_json::Value>,
    title: Option<String>,
    duration: Option<serde_json::Value>,
    created_at: Option<String>,
    #[serde(default)]
    filler: bool,
}

impl EpisodeItem {
    fn into_raw(self, track: AudioType) -> RawEpisode {
        let mut raw = RawEpisode::new(
            KIND,
            self.id.clone(),
            raw_number(self.number.as_ref()),
            AudioAvailability::only(track),
        )
        .with_title(self.title)
        .with_provider_ref(ProviderRef::for_track(track, self.id));
        raw.duration_minutes = self.duration.as_ref().and_then(parse_duration_minutes);
        raw.aired_at = self.created_at.as_deref().and_then(parse_timestamp);
        raw.is_filler = self.filler;
        raw
    }
}

/// "00:23:40" or a plain number of minutes
fn parse_duration_minutes(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|m| u32::try_from(m).ok()),
        serde_json::Value::String(s) => {
            let parts: Vec<u32> = s.split(':').map(|p| p.trim().parse().ok()).collect::<Option<_>>()?;
            match parts.as_slice() {
                [h, m, s] => h
                    .checked_mul(60)?
                    .checked_add(*m)?
                    .checked_add(u32::from(*s >= 30)),
                [m, s] => m.checked_add(u32::from(*s >= 30)),
                [m] => Some(*m),
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn audio_param(track: AudioType) -> &'static str {
    match track {
        AudioType::Sub => "jpn",
        AudioType::Dub => "eng",
    }
}

pub struct AnimePaheAdapter {
    fetcher: RateLimitedFetcher,
    base_url: String,
}

impl AnimePaheAdapter {
    pub fn new(fetcher: RateLimitedFetcher, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_page(
        &self,
        provider_media_id: &str,
        track: AudioType,
        page: u32,
    ) -> Result<EpisodePage, ProviderError> {
        let request = HttpRequest::get(format!("{}/info", self.base_url))
            .query("id", provider_media_id)
            .query("audio", audio_param(track))
            .query("episodePage", page.to_string());
        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| ProviderError::from_fetch(KIND, e))?;
        response.json().map_err(|e| decode_failure(KIND, "info", e))
    }
}

#[async_trait]
impl ProviderAdapter for AnimePaheAdapter {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    fn audio_mode(&self) -> AudioMode {
        AudioMode::PerTrack
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

        let first = self.fetch_page(provider_media_id, track, 1).await?;
        let last_page = first.episode_pages.clamp(1, MAX_EPISODE_PAGES);
        if first.episode_pages > MAX_EPISODE_PAGES {
            log::warn!(
                "{} reports {} episode pages for {}, reading the first {}",
                KIND,
                first.episode_pages,
                provider_media_id,
                MAX_EPISODE_PAGES
            );
        }

        let mut items = first.episodes;
        for page in 2..=last_page {
            let next = self.fetch_page(provider_media_id, track, page).await?;
            items.extend(next.episodes);
        }

        Ok(items.into_iter().map(|item| item.into_raw(track)).collect())
    }
}
