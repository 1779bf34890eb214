// src/application/state.rs
//
// Application state: the wired engine, built once from an EngineConfig.
// All fields are Arc-wrapped for sharing across the host's tasks.

use std::sync::Arc;

use super::config::{EngineConfig, StorageLocation};
use crate::db::{create_connection_pool, create_connection_pool_at, get_connection, initialize_database};
use crate::domain::MediaId;
use crate::error::AppResult;
use crate::events::EventBus;
use crate::integrations::{
    AniListClient, HttpTransport, MetadataService, ProviderRegistry, RateLimitedFetcher,
    ReqwestTransport,
};
use crate::repositories::{InMemoryKeyValueRepository, KeyValueRepository, SqliteKeyValueRepository};
use crate::services::{
    EpisodeCache, EpisodeEngine, EpisodeSession, ProgressTracker, SessionSnapshot, SettingsService,
};

pub struct AppState {
    pub event_bus: Arc<EventBus>,
    pub store: Arc<dyn KeyValueRepository>,
    pub settings: Arc<SettingsService>,
    pub progress: Arc<ProgressTracker>,
    pub engine: Arc<EpisodeEngine>,
}

impl AppState {
    /// Wire everything against the real HTTP stack.
    pub fn initialize(config: &EngineConfig) -> AppResult<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(config.http_timeout())?);
        Self::with_transport(config, transport)
    }

    /// Same wiring over a caller-supplied transport.
    pub fn with_transport(config: &EngineConfig, transport: Arc<dyn HttpTransport>) -> AppResult<Self> {
        // 1. INFRASTRUCTURE
        let event_bus = Arc::new(EventBus::new());
        let store = open_store(&config.storage)?;
        let fetcher = RateLimitedFetcher::new(transport, config.retry);

        // 2. INTEGRATIONS
        let mut anilist = AniListClient::new(fetcher.clone(), config.metadata_min_interval())
            .with_base_url(config.anilist_url.clone());
        if let Some(token) = &config.anilist_token {
            anilist = anilist.with_auth(token.clone());
        }
        let metadata: Arc<dyn MetadataService> = Arc::new(anilist);
        let registry = ProviderRegistry::from_endpoints(&fetcher, &config.providers);

        Ok(Self::assemble(config, store, metadata, registry, event_bus))
    }

    /// Wire pre-built parts. Used by hosts that bring their own adapters.
    pub fn assemble(
        config: &EngineConfig,
        store: Arc<dyn KeyValueRepository>,
        metadata: Arc<dyn MetadataService>,
        registry: ProviderRegistry,
        event_bus: Arc<EventBus>,
    ) -> Self {
        // 3. SERVICES
        let settings = Arc::new(SettingsService::new(Arc::clone(&store)));
        let cache = EpisodeCache::new(Arc::clone(&store));
        let progress = Arc::new(ProgressTracker::new(
            Arc::clone(&metadata),
            Arc::clone(&store),
            Arc::clone(&event_bus),
        ));

        // 4. ENGINE
        let engine = Arc::new(
            EpisodeEngine::new(registry, cache, Arc::clone(&progress), metadata, Arc::clone(&event_bus))
                .with_display(config.display),
        );

        log::info!(
            "Episode engine ready with providers {:?}",
            engine.registry().kinds()
        );

        Self {
            event_bus,
            store,
            settings,
            progress,
            engine,
        }
    }

    /// Open a session using the saved display settings, if any.
    pub async fn open_session(&self, media_id: MediaId, title: impl Into<String>) -> EpisodeSession {
        let session = self.engine.open_session(media_id, title);
        if let Some(display) = self.settings.stored_display_preferences().await {
            session.set_display(display);
        }
        session
    }

    /// Run a pass with the saved provider preference.
    pub async fn load_session(&self, session: &EpisodeSession) -> AppResult<Arc<SessionSnapshot>> {
        let preference = self.settings.provider_preference().await;
        session.load(&preference).await
    }
}

fn open_store(location: &StorageLocation) -> AppResult<Arc<dyn KeyValueRepository>> {
    let pool = match location {
        StorageLocation::InMemory => return Ok(Arc::new(InMemoryKeyValueRepository::new())),
        StorageLocation::AppData => create_connection_pool()?,
        StorageLocation::File(path) => create_connection_pool_at(path)?,
    };

    // Initialize schema (idempotent)
    {
        let conn = get_connection(&pool)?;
        initialize_database(&conn)?;
    }

    Ok(Arc::new(SqliteKeyValueRepository::new(Arc::new(pool))))
}
