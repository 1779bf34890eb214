// src/services/orchestrator.rs
//
// Episode Orchestrator - the engine's entry point
//
// Sequences cache → resolve → fetch → reconcile → cache → partition for one
// media session and publishes a single current snapshot for the UI.
//
// CRITICAL RULES:
// - Providers are reached only through `ProviderAdapter`; no branching on
//   provider names here
// - Provider calls fan out concurrently and are all awaited; individual
//   failures are reported, never fatal, unless every provider failed
// - The displayed list is swapped wholesale, never patched; the previous list
//   stays visible while a new pass runs and when it fails
// - Every pass takes a generation number; results of a superseded pass are
//   dropped without touching the snapshot or the cache
// - Preferences arrive as arguments; nothing here reads settings storage
//
// STATE MACHINE: see `domain::session`

use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::domain::{
    AudioMode, DisplayPreferences, EpisodeSet, FailureReason, MediaId, ProgressOutcome,
    ProviderKind, ProviderPreference, Range, ReconciledList, SessionState, WatchMarkers,
};
use crate::error::{AppResult, ProviderError};
use crate::events::{CacheServed, EpisodesReconciled, EventBus, ProviderFailed, SessionStateChanged};
use crate::integrations::{MetadataService, ProviderAdapter, ProviderRegistry};
use crate::services::episode_cache::EpisodeCache;
use crate::services::progress_tracker::ProgressTracker;
use crate::services::range_partitioner::partition;
use crate::services::reconciler::{EpisodeReconciler, ReconcileHint};

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Everything the presentation layer needs for one media item
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub media_id: MediaId,
    pub title: String,
    pub state: SessionState,
    /// Pass that produced this snapshot
    pub generation: u64,
    /// Currently displayed list (cached or fresh)
    pub list: Option<Arc<ReconciledList>>,
    pub ranges: Vec<Range>,
    pub progress: u32,
    pub markers: Option<WatchMarkers>,
    pub display: DisplayPreferences,
    pub preference: Option<ProviderPreference>,
    /// Set only in `Failed`
    pub failure: Option<FailureReason>,
    /// Providers that failed during the last completed pass
    pub provider_errors: Vec<ProviderError>,
}

impl SessionSnapshot {
    fn idle(media_id: MediaId, title: String, display: DisplayPreferences) -> Self {
        Self {
            media_id,
            title,
            state: SessionState::Idle,
            generation: 0,
            list: None,
            ranges: Vec::new(),
            progress: 0,
            markers: None,
            display,
            preference: None,
            failure: None,
            provider_errors: Vec::new(),
        }
    }

    pub fn episode_count(&self) -> usize {
        self.list.as_ref().map_or(0, |list| list.len())
    }

    /// Swap in a list and re-derive everything computed from it.
    fn show(&mut self, list: Arc<ReconciledList>) {
        self.list = Some(list);
        self.refresh_derived();
    }

    fn refresh_derived(&mut self) {
        match &self.list {
            Some(list) => {
                self.ranges = partition(list, self.display.page_size, self.display.sort_order);
                self.markers = Some(WatchMarkers::compute(list, self.progress));
            }
            None => {
                self.ranges.clear();
                self.markers = None;
            }
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct EpisodeEngine {
    registry: ProviderRegistry,
    reconciler: EpisodeReconciler,
    cache: EpisodeCache,
    progress: Arc<ProgressTracker>,
    metadata: Arc<dyn MetadataService>,
    event_bus: Arc<EventBus>,
    default_display: DisplayPreferences,
}

impl EpisodeEngine {
    pub fn new(
        registry: ProviderRegistry,
        cache: EpisodeCache,
        progress: Arc<ProgressTracker>,
        metadata: Arc<dyn MetadataService>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            registry,
            reconciler: EpisodeReconciler::new(),
            cache,
            progress,
            metadata,
            event_bus,
            default_display: DisplayPreferences::default(),
        }
    }

    pub fn with_display(mut self, display: DisplayPreferences) -> Self {
        self.default_display = display;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn open_session(self: &Arc<Self>, media_id: MediaId, title: impl Into<String>) -> EpisodeSession {
        let snapshot = SessionSnapshot::idle(media_id, title.into(), self.default_display);
        let (state_tx, _) = watch::channel(Arc::new(snapshot));
        EpisodeSession {
            inner: Arc::new(SessionInner {
                engine: Arc::clone(self),
                media_id,
                generation: AtomicU64::new(0),
                state_tx,
                transitions: Mutex::new(()),
                cache_writes: AsyncMutex::new(()),
            }),
        }
    }

    /// Resolve and fetch every provider of the pass concurrently.
    async fn fetch_sets(&self, media_id: MediaId, title: &str, preference: &ProviderPreference) -> PassOutcome {
        let providers = preference.providers_for_pass();
        let calls = providers.iter().enumerate().map(|(rank, kind)| {
            self.fetch_provider(media_id, title, *kind, rank as u32, preference)
        });
        let results = join_all(calls).await;

        let mut outcome = PassOutcome {
            sets: Vec::new(),
            failures: Vec::new(),
            last_provider: providers.last().copied(),
        };
        for result in results {
            match result {
                Ok(sets) => outcome.sets.extend(sets),
                Err(error) => {
                    self.report_failure(media_id, &error);
                    outcome.failures.push(error);
                }
            }
        }
        outcome
    }

    async fn fetch_provider(
        &self,
        media_id: MediaId,
        title: &str,
        kind: ProviderKind,
        trust_rank: u32,
        preference: &ProviderPreference,
    ) -> Result<Vec<EpisodeSet>, ProviderError> {
        // A provider missing from the registry never finds anything
        let adapter = self.registry.get(kind).ok_or_else(|| ProviderError::NotFound {
            provider: kind,
            title: title.to_string(),
        })?;

        let provider_media_id = adapter.resolve(title, Some(media_id)).await?;
        log::debug!("{} resolved '{}' to {}", kind, title, provider_media_id);

        match adapter.audio_mode() {
            AudioMode::Combined => {
                let episodes = adapter.get_episodes(&provider_media_id, None).await?;
                Ok(vec![EpisodeSet::new(kind, trust_rank, episodes)])
            }
            AudioMode::PerTrack => {
                Self::fetch_tracks(adapter.as_ref(), &provider_media_id, trust_rank, preference).await
            }
        }
    }

    /// Per-track providers: one call per preferred track, in parallel. The
    /// provider fails only if every track failed.
    async fn fetch_tracks(
        adapter: &dyn ProviderAdapter,
        provider_media_id: &str,
        trust_rank: u32,
        preference: &ProviderPreference,
    ) -> Result<Vec<EpisodeSet>, ProviderError> {
        let tracks = preference.preferred_audio.tracks();
        let calls = tracks
            .iter()
            .map(|track| adapter.get_episodes(provider_media_id, Some(*track)));
        let results = join_all(calls).await;

        let mut sets = Vec::new();
        let mut last_error = None;
        for (track, result) in tracks.into_iter().zip(results) {
            match result {
                Ok(episodes) => {
                    sets.push(EpisodeSet::new(adapter.kind(), trust_rank, episodes).with_audio(track));
                }
                Err(error) => {
                    log::warn!("{} {} track failed: {}", adapter.kind(), track, error);
                    last_error = Some(error);
                }
            }
        }

        match (sets.is_empty(), last_error) {
            (true, Some(error)) => Err(error),
            _ => Ok(sets),
        }
    }

    fn report_failure(&self, media_id: MediaId, error: &ProviderError) {
        if error.is_not_found() {
            log::debug!("{}", error);
        } else {
            log::warn!("Provider failure for media {}: {}", media_id, error);
        }
        self.event_bus.emit(ProviderFailed::new(
            media_id,
            error.provider(),
            error.to_string(),
            error.is_not_found(),
        ));
    }

    /// Canonical count as a merge hint; unavailable metadata means no hint.
    async fn reconcile_hint(&self, media_id: MediaId) -> ReconcileHint {
        match self.metadata.canonical_episode_count(media_id).await {
            Ok(count) => ReconcileHint::new(count),
            Err(e) => {
                log::warn!("No canonical episode count for media {}: {}", media_id, e);
                ReconcileHint::default()
            }
        }
    }

    /// Alternates the UI can offer: unused providers that are actually configured.
    fn alternates(&self, preference: &ProviderPreference) -> Vec<ProviderKind> {
        let configured = self.registry.kinds();
        preference
            .alternates()
            .into_iter()
            .filter(|kind| configured.contains(kind))
            .collect()
    }
}

struct PassOutcome {
    sets: Vec<EpisodeSet>,
    failures: Vec<ProviderError>,
    last_provider: Option<ProviderKind>,
}

// ============================================================================
// SESSION
// ============================================================================

struct SessionInner {
    engine: Arc<EpisodeEngine>,
    media_id: MediaId,
    generation: AtomicU64,
    state_tx: watch::Sender<Arc<SessionSnapshot>>,
    /// Serializes publish + event emission so events follow snapshot order
    transitions: Mutex<()>,
    /// Held across the generation check and the cache write
    cache_writes: AsyncMutex<()>,
}

/// One media item's episode view. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct EpisodeSession {
    inner: Arc<SessionInner>,
}

impl EpisodeSession {
    pub fn media_id(&self) -> MediaId {
        self.inner.media_id
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.inner.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.inner.state_tx.borrow())
    }

    /// Run one pass with `preference`. Returns the snapshot current when the
    /// pass ends; if the pass was superseded that is the newer pass's state.
    pub async fn load(&self, preference: &ProviderPreference) -> AppResult<Arc<SessionSnapshot>> {
        let engine = &self.inner.engine;
        let media_id = self.inner.media_id;
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let title = self.snapshot().title.clone();
        log::info!("Loading episodes for media {} (pass {})", media_id, generation);

        // Phase 1: instant display from cache, only when nothing is shown yet
        if self.snapshot().state == SessionState::Idle {
            match engine.cache.load(media_id).await {
                Ok(Some(cached)) => {
                    let count = cached.len();
                    let reconciled_at = cached.reconciled_at;
                    let cached = Arc::new(cached);
                    if self.advance(generation, SessionState::CacheHit, |s| s.show(cached)) {
                        engine.event_bus.emit(CacheServed::new(media_id, count, reconciled_at));
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Cache read for media {} failed: {}", media_id, e),
            }
        }

        let pref = preference.clone();
        if !self.advance(generation, SessionState::Resolving, |s| {
            s.preference = Some(pref);
            s.failure = None;
        }) {
            return Ok(self.snapshot());
        }

        // Phase 2: providers, progress and canonical count all in flight together
        let (outcome, progress, hint) = tokio::join!(
            engine.fetch_sets(media_id, &title, preference),
            engine.progress.fetch_progress(media_id),
            engine.reconcile_hint(media_id),
        );

        if !self.advance(generation, SessionState::Reconciling, |s| s.progress = progress) {
            log::debug!("Pass {} for media {} superseded, dropping results", generation, media_id);
            return Ok(self.snapshot());
        }

        // Phase 3: merge
        let order = self.snapshot().display.sort_order;
        let list = engine.reconciler.merge(media_id, hint, outcome.sets, order);

        if list.is_empty() {
            let reason = FailureReason::new(
                outcome.last_provider,
                outcome.failures.clone(),
                engine.alternates(preference),
            );
            log::warn!("No episodes for media {}: {}", media_id, reason);
            let failures = outcome.failures;
            self.advance(generation, SessionState::Failed, |s| {
                s.failure = Some(reason);
                s.provider_errors = failures;
            });
            return Ok(self.snapshot());
        }

        // A newer pass bumps the generation before it can reach this lock, so
        // a stale list is never written over a fresher one
        {
            let _write = self.inner.cache_writes.lock().await;
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return Ok(self.snapshot());
            }
            if let Err(e) = engine.cache.save(media_id, &list).await {
                log::warn!("Could not cache episodes for media {}: {}", media_id, e);
            }
        }

        let reconciled = EpisodesReconciled::new(
            media_id,
            list.len(),
            list.providers.clone(),
            list.gaps().len(),
        );
        let list = Arc::new(list);
        let failures = outcome.failures;
        if self.advance(generation, SessionState::Ready, |s| {
            s.show(list);
            s.provider_errors = failures;
        }) {
            engine.event_bus.emit(reconciled);
        }

        Ok(self.snapshot())
    }

    /// Re-enter resolution with new provider/audio parameters. The current
    /// list stays on screen until the new pass is ready.
    pub async fn switch_preference(&self, preference: &ProviderPreference) -> AppResult<Arc<SessionSnapshot>> {
        log::info!(
            "Switching media {} to {} ({:?})",
            self.inner.media_id,
            preference.default_provider,
            preference.preferred_audio
        );
        self.load(preference).await
    }

    pub async fn record_progress(&self, episode: u32) -> AppResult<ProgressOutcome> {
        let outcome = self
            .inner
            .engine
            .progress
            .record_progress(self.inner.media_id, episode)
            .await?;

        let progress = outcome.progress();
        self.inner.state_tx.send_if_modified(|current| {
            if current.progress == progress {
                return false;
            }
            let mut next = (**current).clone();
            next.progress = progress;
            next.refresh_derived();
            *current = Arc::new(next);
            true
        });
        Ok(outcome)
    }

    /// Change page size or sort order; ranges are re-derived immediately.
    pub fn set_display(&self, display: DisplayPreferences) {
        self.inner.state_tx.send_modify(|current| {
            let mut next = (**current).clone();
            next.display = display;
            next.refresh_derived();
            *current = Arc::new(next);
        });
    }

    /// Drop the cached list; the list on screen stays until the next pass.
    pub async fn invalidate_cache(&self) -> AppResult<()> {
        let _write = self.inner.cache_writes.lock().await;
        self.inner.engine.cache.invalidate(self.inner.media_id).await
    }

    /// Apply a state transition for pass `generation`. Returns false, leaving
    /// the snapshot untouched, if the pass has been superseded.
    fn advance<F>(&self, generation: u64, to: SessionState, update: F) -> bool
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        let _guard = self
            .inner
            .transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut from = None;
        self.inner.state_tx.send_if_modified(|current| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            if let Err(e) = current.state.transition(to) {
                log::error!("Session for media {} rejected transition: {}", self.inner.media_id, e);
                return false;
            }
            let mut next = (**current).clone();
            from = Some(next.state);
            next.state = to;
            next.generation = generation;
            update(&mut next);
            *current = Arc::new(next);
            true
        });

        match from {
            Some(from) => {
                log::debug!("Media {} session {} -> {}", self.inner.media_id, from, to);
                self.inner.engine.event_bus.emit(SessionStateChanged::new(
                    self.inner.media_id,
                    from,
                    to,
                    generation,
                ));
                true
            }
            None => false,
        }
    }
}
