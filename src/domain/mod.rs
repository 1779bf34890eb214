// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod episode;
pub mod media;
pub mod preference;
pub mod progress;
pub mod provider;
pub mod range;
pub mod reconciled;
pub mod session;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Episode Domain
pub use episode::{
    validate_episode, AudioAvailability, AudioFlag, AudioType, Episode, EpisodeNumber,
    EpisodeSource, ProviderRef, RawEpisode,
};

// Media identity
pub use media::MediaId;

// Providers
pub use provider::{AudioMode, CatalogKind, ProviderKind, SearchCandidate};

// Reconciled List Domain
pub use reconciled::{validate_reconciled_list, EpisodeSet, ReconciledList, SortOrder};

// Session lifecycle
pub use session::{FailureReason, SessionState};

// Ranges (derived data)
pub use range::{Range, RangeLabel};

// Progress
pub use progress::{ProgressMark, ProgressOutcome, WatchMarkers};

// Preferences (pure configuration)
pub use preference::{AudioPreference, DisplayPreferences, ProviderPreference};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid episode number: {0}")]
    InvalidEpisodeNumber(String),

    #[error("Episode number {0} appears more than once")]
    DuplicateEpisodeNumber(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
