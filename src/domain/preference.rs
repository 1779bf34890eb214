// src/domain/preference.rs
//
// User-chosen configuration. Pure values: persisted by the settings store and
// passed explicitly into every resolution pass.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use super::episode::AudioType;
use super::reconciled::SortOrder;
use super::ProviderKind;

/// Which audio tracks to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioPreference {
    #[default]
    Sub,
    Dub,
    /// Fetch both tracks (parallel calls on per-track providers)
    Both,
}

impl AudioPreference {
    /// Tracks to request, preferred first
    pub fn tracks(self) -> Vec<AudioType> {
        match self {
            AudioPreference::Sub => vec![AudioType::Sub],
            AudioPreference::Dub => vec![AudioType::Dub],
            AudioPreference::Both => vec![AudioType::Sub, AudioType::Dub],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPreference {
    pub default_provider: ProviderKind,
    pub preferred_audio: AudioPreference,
    /// Additional providers consulted after the default one, most trusted first
    #[serde(default)]
    pub provider_priority: Vec<ProviderKind>,
}

impl Default for ProviderPreference {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::HiAnime,
            preferred_audio: AudioPreference::Sub,
            provider_priority: Vec::new(),
        }
    }
}

impl ProviderPreference {
    pub fn new(default_provider: ProviderKind, preferred_audio: AudioPreference) -> Self {
        Self {
            default_provider,
            preferred_audio,
            provider_priority: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Vec<ProviderKind>) -> Self {
        self.provider_priority = priority;
        self
    }

    /// Providers queried in one pass, in trust order, without duplicates.
    pub fn providers_for_pass(&self) -> Vec<ProviderKind> {
        let mut providers = vec![self.default_provider];
        for kind in &self.provider_priority {
            if !providers.contains(kind) {
                providers.push(*kind);
            }
        }
        providers
    }

    /// Providers not consulted by this preference; offered as alternates on failure.
    pub fn alternates(&self) -> Vec<ProviderKind> {
        let used = self.providers_for_pass();
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| !used.contains(kind))
            .collect()
    }
}

const DEFAULT_PAGE_SIZE: usize = 24;

/// Presentation settings read by the range partitioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub column_count: u8,
    pub sort_order: SortOrder,
    pub page_size: NonZeroUsize,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            column_count: 2,
            sort_order: SortOrder::Ascending,
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}
