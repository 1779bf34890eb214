// src/domain/provider.rs
//
// Provider identity and catalogue search results.
//
// The set of providers is closed: adding a backend means adding a variant
// here and an adapter implementing `ProviderAdapter`, never branching on
// provider names inside the engine.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{DomainError, MediaId};

/// The streaming/scraping backends the engine knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    HiAnime,
    Gogoanime,
    AnimePahe,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::HiAnime,
        ProviderKind::Gogoanime,
        ProviderKind::AnimePahe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::HiAnime => "hianime",
            ProviderKind::Gogoanime => "gogoanime",
            ProviderKind::AnimePahe => "animepahe",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hianime" | "zoro" => Ok(ProviderKind::HiAnime),
            "gogoanime" | "gogo" => Ok(ProviderKind::Gogoanime),
            "animepahe" | "pahe" => Ok(ProviderKind::AnimePahe),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

/// How a provider exposes audio tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    /// One call returns both tracks with per-episode flags.
    Combined,
    /// Each call serves exactly one track (sub or dub).
    PerTrack,
}

/// Catalogue entry type as reported by a provider's search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Series,
    Movie,
    Ova,
    Special,
    Other,
}

impl CatalogKind {
    /// Providers label the same thing differently ("TV", "TV Series", "tv").
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "tv" | "tv series" | "series" | "tv_short" | "ona" => CatalogKind::Series,
            "movie" | "film" => CatalogKind::Movie,
            "ova" | "oad" => CatalogKind::Ova,
            "special" | "sp" => CatalogKind::Special,
            _ => CatalogKind::Other,
        }
    }
}

/// One row of a provider's search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Provider-native catalogue id
    pub id: String,
    pub title: String,
    pub kind: CatalogKind,
    /// Canonical id, when the provider cross-references the metadata service
    pub canonical_id: Option<MediaId>,
}

impl SearchCandidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: CatalogKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            canonical_id: None,
        }
    }

    pub fn with_canonical_id(mut self, canonical_id: MediaId) -> Self {
        self.canonical_id = Some(canonical_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_round_trips_through_str() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert_eq!("Zoro".parse::<ProviderKind>().unwrap(), ProviderKind::HiAnime);
        assert!("crunchyroll".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_catalog_kind_labels() {
        assert_eq!(CatalogKind::from_label("TV"), CatalogKind::Series);
        assert_eq!(CatalogKind::from_label("TV Series"), CatalogKind::Series);
        assert_eq!(CatalogKind::from_label("Movie"), CatalogKind::Movie);
        assert_eq!(CatalogKind::from_label("music"), CatalogKind::Other);
    }
}
