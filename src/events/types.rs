// src/events/types.rs
//
// All domain events in the engine.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{MediaId, ProgressOutcome, ProviderKind, SessionState};

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// SESSION EVENTS
// ============================================================================

/// Emitted on every session state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStateChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub media_id: MediaId,
    pub from: SessionState,
    pub to: SessionState,
    /// Pass that caused the transition
    pub generation: u64,
}

impl SessionStateChanged {
    pub fn new(media_id: MediaId, from: SessionState, to: SessionState, generation: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            media_id,
            from,
            to,
            generation,
        }
    }
}

impl DomainEvent for SessionStateChanged {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "SessionStateChanged" }
}

/// Emitted when a cached list is shown before the fresh pass completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheServed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub media_id: MediaId,
    pub episode_count: usize,
    pub reconciled_at: DateTime<Utc>,
}

impl CacheServed {
    pub fn new(media_id: MediaId, episode_count: usize, reconciled_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            media_id,
            episode_count,
            reconciled_at,
        }
    }
}

impl DomainEvent for CacheServed {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "CacheServed" }
}

// ============================================================================
// RECONCILIATION EVENTS
// ============================================================================

/// Emitted when a fresh list replaces the previous one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodesReconciled {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub media_id: MediaId,
    pub episode_count: usize,
    pub providers: Vec<ProviderKind>,
    pub gap_count: usize,
}

impl EpisodesReconciled {
    pub fn new(
        media_id: MediaId,
        episode_count: usize,
        providers: Vec<ProviderKind>,
        gap_count: usize,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            media_id,
            episode_count,
            providers,
            gap_count,
        }
    }
}

impl DomainEvent for EpisodesReconciled {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "EpisodesReconciled" }
}

/// Emitted for each provider call that produced no episodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub media_id: MediaId,
    pub provider: ProviderKind,
    pub reason: String,
    pub not_found: bool,
}

impl ProviderFailed {
    pub fn new(media_id: MediaId, provider: ProviderKind, reason: String, not_found: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            media_id,
            provider,
            reason,
            not_found,
        }
    }
}

impl DomainEvent for ProviderFailed {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ProviderFailed" }
}

// ============================================================================
// PROGRESS EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecorded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub media_id: MediaId,
    pub outcome: ProgressOutcome,
}

impl ProgressRecorded {
    pub fn new(media_id: MediaId, outcome: ProgressOutcome) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            media_id,
            outcome,
        }
    }
}

impl DomainEvent for ProgressRecorded {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ProgressRecorded" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_get_distinct_ids() {
        let a = CacheServed::new(MediaId(1), 12, Utc::now());
        let b = CacheServed::new(MediaId(1), 12, Utc::now());
        assert_ne!(a.event_id(), b.event_id());
        assert_eq!(a.event_type(), "CacheServed");
    }

    #[test]
    fn test_progress_event_serializes_outcome() {
        let event = ProgressRecorded::new(MediaId(3), ProgressOutcome::Rejected { current: 5 });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"]["type"], "rejected");
        assert_eq!(json["outcome"]["current"], 5);
        assert_eq!(json["media_id"], 3);
    }
}
