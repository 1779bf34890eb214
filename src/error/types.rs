// src/error/types.rs
use crate::domain::{DomainError, ProviderKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Metadata service error: {0}")]
    Metadata(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Other error: {0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Other(format!("Background task failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Outcome of the rate-limited fetcher when a request cannot produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Throttled on every attempt; the retry budget is spent.
    #[error("provider unavailable after {attempts} throttled attempts")]
    Unavailable { attempts: u32 },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Typed failure reported by a provider adapter. Adapters never panic or
/// leak transport errors past this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderError {
    #[error("{provider} is unavailable (rate limited after {attempts} attempts)")]
    Unavailable { provider: ProviderKind, attempts: u32 },

    #[error("{provider} failed: {reason}")]
    Failed { provider: ProviderKind, reason: String },

    #[error("{provider} has no entry matching '{title}'")]
    NotFound { provider: ProviderKind, title: String },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderKind {
        match self {
            ProviderError::Unavailable { provider, .. }
            | ProviderError::Failed { provider, .. }
            | ProviderError::NotFound { provider, .. } => *provider,
        }
    }

    /// `NotFound` is an expected outcome, not an anomaly worth a warning.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    /// Map a fetcher failure onto the adapter taxonomy.
    pub fn from_fetch(provider: ProviderKind, err: FetchError) -> Self {
        match err {
            FetchError::Unavailable { attempts } => ProviderError::Unavailable { provider, attempts },
            other => ProviderError::Failed {
                provider,
                reason: other.to_string(),
            },
        }
    }
}
