// src/application/config.rs
//
// Engine configuration
//
// CRITICAL RULES:
// - Every field has a default; a partial JSON file is valid
// - Configuration is read once at startup and passed down, never re-read

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::DisplayPreferences;
use crate::error::AppResult;
use crate::integrations::anilist::ANILIST_URL;
use crate::integrations::{ProviderEndpoints, RetryPolicy};

/// Where the key-value store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum StorageLocation {
    /// `{data_dir}/anisync/anisync.db`
    #[default]
    AppData,
    File(PathBuf),
    /// Nothing survives the process
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retry: RetryPolicy,
    pub http_timeout_secs: u64,
    /// Minimum spacing between AniList requests
    pub metadata_min_interval_ms: u64,
    pub anilist_url: String,
    pub anilist_token: Option<String>,
    pub providers: ProviderEndpoints,
    pub display: DisplayPreferences,
    pub storage: StorageLocation,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            http_timeout_secs: 30,
            metadata_min_interval_ms: 1000,
            anilist_url: ANILIST_URL.to_string(),
            anilist_token: None,
            providers: ProviderEndpoints::default(),
            display: DisplayPreferences::default(),
            storage: StorageLocation::default(),
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn in_memory() -> Self {
        Self {
            storage: StorageLocation::InMemory,
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: NonZeroUsize) -> Self {
        self.display.page_size = page_size;
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn metadata_min_interval(&self) -> Duration {
        Duration::from_millis(self.metadata_min_interval_ms)
    }
}
