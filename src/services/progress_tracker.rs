// src/services/progress_tracker.rs
//
// Progress Tracker
//
// CRITICAL RULES:
// - The metadata service is the source of truth; a successful remote read
//   overwrites the local checkpoint
// - Reads never surface an error: remote failure falls back to the local
//   checkpoint, then to 0
// - Writes are monotonic: a value not strictly above the last known one is
//   rejected without touching local or remote state
// - A failed remote write keeps the local checkpoint (SavedLocally)
// - Check and write run under one lock; concurrent records never regress

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{MediaId, ProgressMark, ProgressOutcome};
use crate::error::AppResult;
use crate::events::{EventBus, ProgressRecorded};
use crate::integrations::MetadataService;
use crate::repositories::{storage_keys, KeyValueRepository};
use crate::services::episode_cache::{load_json, save_json};

pub struct ProgressTracker {
    metadata: Arc<dyn MetadataService>,
    store: Arc<dyn KeyValueRepository>,
    event_bus: Arc<EventBus>,
    /// Guards every read-compare-write of a checkpoint
    writes: Mutex<()>,
}

impl ProgressTracker {
    pub fn new(
        metadata: Arc<dyn MetadataService>,
        store: Arc<dyn KeyValueRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            metadata,
            store,
            event_bus,
            writes: Mutex::new(()),
        }
    }

    /// Last locally checkpointed progress, if any
    pub async fn local_checkpoint(&self, media_id: MediaId) -> AppResult<Option<ProgressMark>> {
        load_json(&self.store, storage_keys::progress(media_id)).await
    }

    pub async fn fetch_progress(&self, media_id: MediaId) -> u32 {
        match self.metadata.fetch_progress(media_id).await {
            Ok(remote) => {
                let _write = self.writes.lock().await;
                if let Err(e) = self.checkpoint(media_id, remote).await {
                    log::warn!("Could not checkpoint progress for media {}: {}", media_id, e);
                }
                remote
            }
            Err(e) => {
                let local = self.last_known(media_id).await;
                log::warn!(
                    "Progress fetch for media {} failed ({}); using local value {}",
                    media_id,
                    e,
                    local
                );
                local
            }
        }
    }

    pub async fn record_progress(&self, media_id: MediaId, episode: u32) -> AppResult<ProgressOutcome> {
        let _write = self.writes.lock().await;
        let current = self.last_known(media_id).await;
        if episode <= current {
            log::debug!(
                "Ignoring progress {} for media {}: already at {}",
                episode,
                media_id,
                current
            );
            let outcome = ProgressOutcome::Rejected { current };
            self.event_bus.emit(ProgressRecorded::new(media_id, outcome));
            return Ok(outcome);
        }

        self.checkpoint(media_id, episode).await?;

        let outcome = match self.metadata.save_progress(media_id, episode).await {
            Ok(_) => ProgressOutcome::Recorded { progress: episode },
            Err(e) => {
                log::warn!(
                    "Remote progress save for media {} failed, kept locally: {}",
                    media_id,
                    e
                );
                ProgressOutcome::SavedLocally { progress: episode }
            }
        };

        self.event_bus.emit(ProgressRecorded::new(media_id, outcome));
        Ok(outcome)
    }

    async fn last_known(&self, media_id: MediaId) -> u32 {
        match self.local_checkpoint(media_id).await {
            Ok(mark) => mark.map(|m| m.progress).unwrap_or(0),
            Err(e) => {
                log::warn!("Could not read progress checkpoint for media {}: {}", media_id, e);
                0
            }
        }
    }

    async fn checkpoint(&self, media_id: MediaId, progress: u32) -> AppResult<()> {
        save_json(
            &self.store,
            storage_keys::progress(media_id),
            &ProgressMark::new(media_id, progress),
        )
        .await
    }
}
