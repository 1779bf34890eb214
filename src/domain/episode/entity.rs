// src/domain/episode/entity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::domain::{DomainError, DomainResult, ProviderKind};

/// Canonical sequence position of an episode (1, 2, 12.5 ...).
/// Always finite and strictly positive; this is the reconciliation key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct EpisodeNumber(f64);

impl EpisodeNumber {
    pub fn new(value: f64) -> DomainResult<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidEpisodeNumber(value.to_string()))
        }
    }

    pub fn whole(value: u32) -> DomainResult<Self> {
        Self::new(f64::from(value))
    }

    /// Parse the textual number a provider reported ("12", " 7 ", "12.5").
    /// Anything else is not an episode number.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().and_then(|v| Self::new(v).ok())
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Integer form, when the number has no fractional part.
    pub fn as_whole(self) -> Option<u32> {
        if self.0.fract() == 0.0 && self.0 <= f64::from(u32::MAX) {
            Some(self.0 as u32)
        } else {
            None
        }
    }
}

impl PartialEq for EpisodeNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EpisodeNumber {}

impl PartialOrd for EpisodeNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EpisodeNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for EpisodeNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl TryFrom<f64> for EpisodeNumber {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EpisodeNumber> for f64 {
    fn from(number: EpisodeNumber) -> Self {
        number.0
    }
}

impl std::fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_whole() {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Audio track kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioType {
    Sub,
    Dub,
}

impl std::fmt::Display for AudioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioType::Sub => write!(f, "sub"),
            AudioType::Dub => write!(f, "dub"),
        }
    }
}

/// Tri-state knowledge about one audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioFlag {
    Available,
    Unavailable,
    #[default]
    Unknown,
}

impl AudioFlag {
    pub fn from_bool(value: bool) -> Self {
        if value {
            AudioFlag::Available
        } else {
            AudioFlag::Unavailable
        }
    }

    /// Union across sources: one source confirming the track is enough;
    /// "unavailable" only survives when every source knows it is absent.
    pub fn union(self, other: AudioFlag) -> AudioFlag {
        match (self, other) {
            (AudioFlag::Available, _) | (_, AudioFlag::Available) => AudioFlag::Available,
            (AudioFlag::Unknown, _) | (_, AudioFlag::Unknown) => AudioFlag::Unknown,
            _ => AudioFlag::Unavailable,
        }
    }
}

/// Sub/dub availability of one episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AudioAvailability {
    pub sub: AudioFlag,
    pub dub: AudioFlag,
}

impl AudioAvailability {
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Availability reported by a provider that serves exactly one track per call.
    pub fn only(track: AudioType) -> Self {
        match track {
            AudioType::Sub => Self {
                sub: AudioFlag::Available,
                dub: AudioFlag::Unavailable,
            },
            AudioType::Dub => Self {
                sub: AudioFlag::Unavailable,
                dub: AudioFlag::Available,
            },
        }
    }

    pub fn from_flags(sub: bool, dub: bool) -> Self {
        Self {
            sub: AudioFlag::from_bool(sub),
            dub: AudioFlag::from_bool(dub),
        }
    }

    pub fn union(self, other: AudioAvailability) -> AudioAvailability {
        AudioAvailability {
            sub: self.sub.union(other.sub),
            dub: self.dub.union(other.dub),
        }
    }

    pub fn flag(&self, track: AudioType) -> AudioFlag {
        match track {
            AudioType::Sub => self.sub,
            AudioType::Dub => self.dub,
        }
    }

    pub fn has(&self, track: AudioType) -> bool {
        self.flag(track) == AudioFlag::Available
    }
}

/// Who produced an episode record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "provider", rename_all = "snake_case")]
pub enum EpisodeSource {
    Provider(ProviderKind),
    MetadataService,
}

impl std::fmt::Display for EpisodeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeSource::Provider(kind) => write!(f, "{}", kind),
            EpisodeSource::MetadataService => write!(f, "metadata"),
        }
    }
}

/// A provider's native episode ids, per audio track.
/// Needed to request a playable source later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderRef {
    pub sub: Option<String>,
    pub dub: Option<String>,
}

impl ProviderRef {
    /// One id serving both tracks
    pub fn combined(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            sub: Some(id.clone()),
            dub: Some(id),
        }
    }

    pub fn for_track(track: AudioType, id: impl Into<String>) -> Self {
        match track {
            AudioType::Sub => Self {
                sub: Some(id.into()),
                dub: None,
            },
            AudioType::Dub => Self {
                sub: None,
                dub: Some(id.into()),
            },
        }
    }

    /// Fill tracks this ref does not know yet; known ids are never overwritten.
    pub fn absorb(&mut self, other: &ProviderRef) {
        if self.sub.is_none() {
            self.sub = other.sub.clone();
        }
        if self.dub.is_none() {
            self.dub = other.dub.clone();
        }
    }

    /// Id for the requested track, falling back to whichever is known.
    pub fn id_for(&self, track: AudioType) -> Option<&str> {
        let (wanted, other) = match track {
            AudioType::Sub => (&self.sub, &self.dub),
            AudioType::Dub => (&self.dub, &self.sub),
        };
        wanted.as_deref().or(other.as_deref())
    }
}

/// One canonical unit of watchable content inside a reconciled list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Identifier scoped to `source_provider`
    pub id: String,
    pub number: EpisodeNumber,
    pub title: Option<String>,
    pub aired_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub is_filler: bool,
    pub is_recap: bool,
    pub source_provider: EpisodeSource,
    pub audio: AudioAvailability,
    pub provider_refs: BTreeMap<ProviderKind, ProviderRef>,
}

impl Episode {
    pub fn new(id: impl Into<String>, number: EpisodeNumber, source_provider: EpisodeSource) -> Self {
        Self {
            id: id.into(),
            number,
            title: None,
            aired_at: None,
            duration_minutes: None,
            is_filler: false,
            is_recap: false,
            source_provider,
            audio: AudioAvailability::unknown(),
            provider_refs: BTreeMap::new(),
        }
    }

    /// Attach another provider's native ids; existing ids stay.
    pub fn attach_ref(&mut self, provider: ProviderKind, reference: &ProviderRef) {
        self.provider_refs
            .entry(provider)
            .and_modify(|existing| existing.absorb(reference))
            .or_insert_with(|| reference.clone());
    }

    /// Display title with the conventional fallback
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => format!("Episode {}", self.number),
        }
    }
}

/// An episode exactly as an adapter normalized it, before reconciliation.
/// The number is kept raw: malformed numbers are the reconciler's call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEpisode {
    pub id: String,
    pub raw_number: Option<String>,
    pub title: Option<String>,
    pub aired_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub is_filler: bool,
    pub is_recap: bool,
    pub source_provider: ProviderKind,
    pub audio: AudioAvailability,
    pub provider_ref: ProviderRef,
}

impl RawEpisode {
    pub fn new(
        source_provider: ProviderKind,
        id: impl Into<String>,
        raw_number: Option<String>,
        audio: AudioAvailability,
    ) -> Self {
        let id = id.into();
        Self {
            provider_ref: ProviderRef::combined(id.clone()),
            id,
            raw_number,
            title: None,
            aired_at: None,
            duration_minutes: None,
            is_filler: false,
            is_recap: false,
            source_provider,
            audio,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_provider_ref(mut self, provider_ref: ProviderRef) -> Self {
        self.provider_ref = provider_ref;
        self
    }

    /// Validate the number and build a canonical episode.
    pub fn into_episode(self) -> DomainResult<Episode> {
        let raw = self.raw_number.as_deref().unwrap_or("");
        let number = EpisodeNumber::parse(raw)
            .ok_or_else(|| DomainError::InvalidEpisodeNumber(format!("'{}'", raw)))?;

        let mut provider_refs = BTreeMap::new();
        provider_refs.insert(self.source_provider, self.provider_ref);

        Ok(Episode {
            id: self.id,
            number,
            title: self.title,
            aired_at: self.aired_at,
            duration_minutes: self.duration_minutes,
            is_filler: self.is_filler,
            is_recap: self.is_recap,
            source_provider: EpisodeSource::Provider(self.source_provider),
            audio: self.audio,
            provider_refs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_number_parse() {
        assert_eq!(EpisodeNumber::parse("12").unwrap().as_whole(), Some(12));
        assert_eq!(EpisodeNumber::parse(" 7 ").unwrap().as_whole(), Some(7));
        assert_eq!(EpisodeNumber::parse("12.5").unwrap().value(), 12.5);
        assert!(EpisodeNumber::parse("").is_none());
        assert!(EpisodeNumber::parse("OVA").is_none());
        assert!(EpisodeNumber::parse("0").is_none());
        assert!(EpisodeNumber::parse("-3").is_none());
        assert!(EpisodeNumber::parse("NaN").is_none());
    }

    #[test]
    fn test_episode_number_ordering_and_display() {
        let a = EpisodeNumber::whole(2).unwrap();
        let b = EpisodeNumber::new(2.5).unwrap();
        let c = EpisodeNumber::whole(10).unwrap();
        assert!(a < b && b < c);
        assert_eq!(a.to_string(), "2");
        assert_eq!(b.to_string(), "2.5");
    }

    #[test]
    fn test_episode_number_rejects_invalid_json() {
        assert!(serde_json::from_str::<EpisodeNumber>("0").is_err());
        assert_eq!(
            serde_json::from_str::<EpisodeNumber>("3").unwrap(),
            EpisodeNumber::whole(3).unwrap()
        );
    }

    #[test]
    fn test_audio_flag_union() {
        use AudioFlag::*;
        assert_eq!(Available.union(Unavailable), Available);
        assert_eq!(Unknown.union(Available), Available);
        assert_eq!(Unknown.union(Unavailable), Unknown);
        assert_eq!(Unavailable.union(Unavailable), Unavailable);
    }

    #[test]
    fn test_provider_ref_absorb_keeps_known_ids() {
        let mut reference = ProviderRef::for_track(AudioType::Sub, "ep-1");
        reference.absorb(&ProviderRef::combined("other"));
        assert_eq!(reference.sub.as_deref(), Some("ep-1"));
        assert_eq!(reference.dub.as_deref(), Some("other"));
        assert_eq!(
            ProviderRef::for_track(AudioType::Dub, "d").id_for(AudioType::Sub),
            Some("d")
        );
    }

    #[test]
    fn test_raw_episode_into_episode() {
        let raw = RawEpisode::new(
            ProviderKind::Gogoanime,
            "naruto-episode-3",
            Some("3".to_string()),
            AudioAvailability::only(AudioType::Sub),
        )
        .with_title(Some("  ".to_string()));

        let episode = raw.into_episode().unwrap();
        assert_eq!(episode.number.as_whole(), Some(3));
        assert_eq!(episode.title, None);
        assert_eq!(episode.display_title(), "Episode 3");
        assert_eq!(
            episode.source_provider,
            EpisodeSource::Provider(ProviderKind::Gogoanime)
        );
        assert!(episode.provider_refs.contains_key(&ProviderKind::Gogoanime));
    }

    #[test]
    fn test_raw_episode_without_number_is_rejected() {
        let raw = RawEpisode::new(
            ProviderKind::HiAnime,
            "x",
            None,
            AudioAvailability::unknown(),
        );
        assert!(matches!(
            raw.into_episode(),
            Err(DomainError::InvalidEpisodeNumber(_))
        ));
    }
}
