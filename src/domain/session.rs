// src/domain/session.rs
//
// Per-media session lifecycle of the episode engine.
//
//   Idle ─▶ CacheHit ─▶ Resolving ─▶ Reconciling ─▶ Ready
//     └──────────────▶ Resolving          │            │
//                        ▲  └──▶ Failed ◀─┘            │
//                        └─────────────────────────────┘  (preference switch / retry)

use serde::{Deserialize, Serialize};

use super::{DomainError, DomainResult, ProviderKind};
use crate::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    /// Showing the cached list while a fresh pass runs
    CacheHit,
    Resolving,
    Reconciling,
    Ready,
    /// Every configured provider failed or found nothing
    Failed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::CacheHit => "cache_hit",
            SessionState::Resolving => "resolving",
            SessionState::Reconciling => "reconciling",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        }
    }

    /// A pass is in flight
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            SessionState::CacheHit | SessionState::Resolving | SessionState::Reconciling
        )
    }

    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Idle, CacheHit) | (Idle, Resolving) => true,
            (CacheHit, Resolving) => true,
            // A superseding pass restarts resolution from any in-flight state
            (Resolving, Resolving) | (Reconciling, Resolving) => true,
            (Resolving, Reconciling) | (Resolving, Failed) => true,
            (Reconciling, Ready) | (Reconciling, Failed) => true,
            (Ready, Resolving) | (Failed, Resolving) => true,
            _ => false,
        }
    }

    pub fn transition(self, next: SessionState) -> DomainResult<SessionState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidStateTransition(format!(
                "{} -> {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a pass ended with nothing to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReason {
    /// Last provider attempted in the pass
    pub last_provider: Option<ProviderKind>,
    pub message: String,
    /// Providers not tried in this pass, offered as a one-tap switch
    pub alternates: Vec<ProviderKind>,
    pub failures: Vec<ProviderError>,
}

impl FailureReason {
    pub fn new(
        last_provider: Option<ProviderKind>,
        failures: Vec<ProviderError>,
        alternates: Vec<ProviderKind>,
    ) -> Self {
        let message = match last_provider {
            Some(provider) if failures.iter().all(ProviderError::is_not_found) => {
                format!("No episodes found on {}", provider)
            }
            Some(provider) => format!("Could not load episodes from {}", provider),
            None => "No provider is configured".to_string(),
        };
        Self {
            last_provider,
            message,
            alternates,
            failures,
        }
    }

    pub fn can_switch_provider(&self) -> bool {
        !self.alternates.is_empty()
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_and_warm_paths() {
        let cold = SessionState::Idle
            .transition(SessionState::Resolving)
            .and_then(|s| s.transition(SessionState::Reconciling))
            .and_then(|s| s.transition(SessionState::Ready));
        assert_eq!(cold.unwrap(), SessionState::Ready);

        let warm = SessionState::Idle
            .transition(SessionState::CacheHit)
            .and_then(|s| s.transition(SessionState::Resolving));
        assert_eq!(warm.unwrap(), SessionState::Resolving);
    }

    #[test]
    fn test_ready_is_reentrant() {
        assert!(SessionState::Ready.can_transition_to(SessionState::Resolving));
        assert!(SessionState::Failed.can_transition_to(SessionState::Resolving));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(SessionState::Idle.transition(SessionState::Ready).is_err());
        assert!(SessionState::CacheHit.transition(SessionState::Failed).is_err());
        assert!(SessionState::Ready.transition(SessionState::CacheHit).is_err());
        assert!(matches!(
            SessionState::Idle.transition(SessionState::Failed),
            Err(DomainError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_failure_reason_names_last_provider() {
        let reason = FailureReason::new(
            Some(ProviderKind::Gogoanime),
            vec![ProviderError::NotFound {
                provider: ProviderKind::Gogoanime,
                title: "X".to_string(),
            }],
            vec![ProviderKind::AnimePahe],
        );
        assert!(reason.message.contains("gogoanime"));
        assert!(reason.can_switch_provider());

        let reason = FailureReason::new(
            Some(ProviderKind::HiAnime),
            vec![ProviderError::Unavailable {
                provider: ProviderKind::HiAnime,
                attempts: 3,
            }],
            Vec::new(),
        );
        assert_eq!(reason.to_string(), "Could not load episodes from hianime");
        assert!(!reason.can_switch_provider());
    }
}
