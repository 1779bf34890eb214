// src/integrations/anilist/client.rs
//
// AniList API Integration
//
// ARCHITECTURE:
// - GraphQL client for the AniList API, implementing `MetadataService`
// - Handles authentication and rate limiting
// - Maps external data → internal DTOs (NO domain mutation)
// - All HTTP goes through the shared RateLimitedFetcher (429 backoff)
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Progress writes require a bearer token

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::domain::MediaId;
use crate::error::{AppError, AppResult};
use crate::integrations::http::{HttpRequest, RateLimitedFetcher};
use crate::integrations::metadata::{CanonicalMedia, MetadataService};

pub const ANILIST_URL: &str = "https://graphql.anilist.co";

const MEDIA_QUERY: &str = r#"
    query ($id: Int) {
        Media(id: $id, type: ANIME) {
            id
            title {
                romaji
                english
            }
            episodes
            nextAiringEpisode {
                episode
            }
            mediaListEntry {
                progress
            }
        }
    }
"#;

const PROGRESS_QUERY: &str = r#"
    query ($id: Int) {
        Media(id: $id, type: ANIME) {
            id
            mediaListEntry {
                progress
            }
        }
    }
"#;

const SAVE_PROGRESS_MUTATION: &str = r#"
    mutation ($mediaId: Int, $progress: Int) {
        SaveMediaListEntry(mediaId: $mediaId, progress: $progress) {
            id
            progress
        }
    }
"#;

/// GraphQL response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
    #[allow(dead_code)] // Part of GraphQL error response schema
    status: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct MediaEnvelope {
    #[serde(rename = "Media")]
    media: MediaData,
}

#[derive(Debug, Deserialize)]
struct MediaData {
    id: u64,
    title: Option<TitleData>,
    episodes: Option<u32>,
    #[serde(rename = "nextAiringEpisode")]
    next_airing_episode: Option<AiringData>,
    #[serde(rename = "mediaListEntry")]
    media_list_entry: Option<ListEntryData>,
}

#[derive(Debug, Deserialize)]
struct TitleData {
    romaji: Option<String>,
    english: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiringData {
    episode: u32,
}

#[derive(Debug, Deserialize)]
struct ListEntryData {
    progress: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SaveEnvelope {
    #[serde(rename = "SaveMediaListEntry")]
    entry: ListEntryData,
}

/// Rate limiter state
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// AniList API Client
pub struct AniListClient {
    base_url: String,
    fetcher: RateLimitedFetcher,
    rate_limiter: Mutex<RateLimiter>,
    auth_token: Option<String>,
}

impl AniListClient {
    /// Create a new AniList client (1 request per `min_interval`)
    pub fn new(fetcher: RateLimitedFetcher, min_interval: Duration) -> Self {
        Self {
            base_url: ANILIST_URL.to_string(),
            fetcher,
            rate_limiter: Mutex::new(RateLimiter::new(min_interval)),
            auth_token: None,
        }
    }

    /// Create client with authentication token
    pub fn with_auth(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    // ========================================================================
    // INTERNAL: GraphQL Execution
    // ========================================================================

    /// Execute a GraphQL query
    async fn execute_query<T>(&self, query: &str, variables: serde_json::Value) -> AppResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.rate_limiter.lock().await.wait_if_needed().await;

        let body = json!({
            "query": query,
            "variables": variables
        });

        let mut request = HttpRequest::post_json(&self.base_url, body)
            .header("Content-Type", "application/json");

        // Add auth token if present
        if let Some(token) = &self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let graphql_response: GraphQLResponse<T> = self
            .fetcher
            .fetch_json(&request)
            .await
            .map_err(|e| AppError::Metadata(format!("AniList request failed: {}", e)))?;

        // Check for GraphQL errors
        if let Some(errors) = graphql_response.errors {
            let error_messages: Vec<String> = errors.iter().map(|e| e.message.clone()).collect();

            return Err(AppError::Metadata(format!(
                "AniList API errors: {}",
                error_messages.join(", ")
            )));
        }

        graphql_response
            .data
            .ok_or_else(|| AppError::Metadata("AniList API returned no data".to_string()))
    }

    fn map_media(media: MediaData) -> CanonicalMedia {
        CanonicalMedia {
            id: MediaId(media.id),
            title: media.title.and_then(|t| t.english.or(t.romaji)),
            episodes: media.episodes,
            next_airing_episode: media.next_airing_episode.map(|a| a.episode),
            progress: media.media_list_entry.and_then(|e| e.progress),
        }
    }
}

#[async_trait]
impl MetadataService for AniListClient {
    async fn fetch_media(&self, media_id: MediaId) -> AppResult<CanonicalMedia> {
        let data: MediaEnvelope = self
            .execute_query(MEDIA_QUERY, json!({ "id": media_id.value() }))
            .await?;
        Ok(Self::map_media(data.media))
    }

    async fn fetch_progress(&self, media_id: MediaId) -> AppResult<u32> {
        let data: MediaEnvelope = self
            .execute_query(PROGRESS_QUERY, json!({ "id": media_id.value() }))
            .await?;
        Ok(data
            .media
            .media_list_entry
            .and_then(|e| e.progress)
            .unwrap_or(0))
    }

    async fn save_progress(&self, media_id: MediaId, progress: u32) -> AppResult<u32> {
        if !self.is_authenticated() {
            return Err(AppError::Metadata(
                "Saving progress requires an AniList token".to_string(),
            ));
        }

        let data: SaveEnvelope = self
            .execute_query(
                SAVE_PROGRESS_MUTATION,
                json!({ "mediaId": media_id.value(), "progress": progress }),
            )
            .await?;
        Ok(data.entry.progress.unwrap_or(progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::http::testing::ScriptedTransport;
    use crate::integrations::http::RetryPolicy;
    use std::sync::Arc;

    fn client(transport: Arc<ScriptedTransport>) -> AniListClient {
        let fetcher = RateLimitedFetcher::new(transport, RetryPolicy::new(3, Duration::ZERO));
        AniListClient::new(fetcher, Duration::ZERO)
    }

    #[test]
    fn test_client_creation() {
        let client = client(Arc::new(ScriptedTransport::new()));
        assert_eq!(client.base_url, "https://graphql.anilist.co");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_client_with_auth() {
        let client = client(Arc::new(ScriptedTransport::new())).with_auth("test_token".to_string());
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_fetch_media_maps_fields() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "anilist",
            200,
            r#"{"data":{"Media":{"id":21,"title":{"romaji":"One Piece","english":null},
                "episodes":null,"nextAiringEpisode":{"episode":1101},
                "mediaListEntry":{"progress":1000}}}}"#,
        ));
        let media = client(transport).fetch_media(MediaId(21)).await.unwrap();

        assert_eq!(media.title.as_deref(), Some("One Piece"));
        assert_eq!(media.known_episode_count(), Some(1100));
        assert_eq!(media.progress, Some(1000));
    }

    #[tokio::test]
    async fn test_progress_without_list_entry_is_zero() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "anilist",
            200,
            r#"{"data":{"Media":{"id":5,"mediaListEntry":null}}}"#,
        ));
        assert_eq!(client(transport).fetch_progress(MediaId(5)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_graphql_errors_are_reported() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "anilist",
            200,
            r#"{"data":null,"errors":[{"message":"Not Found.","status":404}]}"#,
        ));
        let err = client(transport).fetch_progress(MediaId(5)).await.unwrap_err();
        assert!(err.to_string().contains("Not Found."));
    }

    #[tokio::test]
    async fn test_save_progress_requires_token() {
        let transport = Arc::new(ScriptedTransport::new());
        let result = client(transport.clone()).save_progress(MediaId(5), 3).await;
        assert!(matches!(result, Err(AppError::Metadata(_))));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_save_progress_sends_bearer_token() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "anilist",
            200,
            r#"{"data":{"SaveMediaListEntry":{"id":9,"progress":4}}}"#,
        ));
        let saved = client(transport.clone())
            .with_auth("tok".to_string())
            .save_progress(MediaId(5), 4)
            .await
            .unwrap();

        assert_eq!(saved, 4);
        let request = &transport.requests()[0];
        assert!(request
            .headers
            .iter()
            .any(|(k, v)| k == "Authorization" && v == "Bearer tok"));
        assert_eq!(request.body.as_ref().unwrap()["variables"]["progress"], 4);
    }
}
