// src/lib.rs
// AniSync - Multi-provider anime episode resolution and reconciliation
//
// Architecture:
// - Domain-centric: episode identity, merge invariants and session states live in domain/
// - Adapters: every catalogue provider sits behind one contract (integrations/)
// - Event-driven: state transitions and outcomes are published on the EventBus
// - Local-first: reconciled lists, progress and settings persist in a key-value store
// - Application Layer: wiring from an EngineConfig

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    validate_episode,
    validate_reconciled_list,
    AudioAvailability,
    AudioFlag,
    // Preferences
    AudioMode,
    AudioPreference,
    AudioType,
    CatalogKind,
    DisplayPreferences,
    DomainError,
    // Episode
    Episode,
    EpisodeNumber,
    EpisodeSet,
    EpisodeSource,
    FailureReason,
    MediaId,
    // Progress
    ProgressMark,
    ProgressOutcome,
    ProviderKind,
    ProviderPreference,
    ProviderRef,
    // Ranges
    Range,
    RangeLabel,
    RawEpisode,
    // Reconciled list
    ReconciledList,
    SearchCandidate,
    // Session
    SessionState,
    SortOrder,
    WatchMarkers,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult, FetchError, ProviderError};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus, CacheServed, DomainEvent, EpisodesReconciled, EventBus, EventLogEntry,
    ProgressRecorded, ProviderFailed, SessionStateChanged,
};

// ============================================================================
// PUBLIC API - Storage
// ============================================================================

pub use db::{create_connection_pool, create_connection_pool_at, initialize_database, ConnectionPool};

pub use repositories::{
    InMemoryKeyValueRepository, KeyValueRepository, SqliteKeyValueRepository,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    normalize_title,
    partition,
    range_index_of,
    resolve_title,
    EpisodeCache,
    // Orchestrator
    EpisodeEngine,
    // Reconciliation
    EpisodeReconciler,
    EpisodeSession,
    MatchTier,
    ProgressTracker,
    ReconcileHint,
    SessionSnapshot,
    SettingsService,
    TitleMatch,
};

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{
    AniListClient, CanonicalMedia, MetadataService, ProviderAdapter, ProviderEndpoints,
    ProviderRegistry, RateLimitedFetcher, RetryPolicy,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{AppState, EngineConfig, StorageLocation};
