use super::entity::{Episode, EpisodeSource};
use crate::domain::{DomainError, DomainResult};

/// Validates all Episode invariants
pub fn validate_episode(episode: &Episode) -> DomainResult<()> {
    validate_identity(episode)?;
    validate_provider_refs(episode)?;
    Ok(())
}

fn validate_identity(episode: &Episode) -> DomainResult<()> {
    if episode.id.trim().is_empty() {
        return Err(DomainError::InvariantViolation(format!(
            "episode {} has an empty id",
            episode.number
        )));
    }
    Ok(())
}

/// An episode sourced from a provider must stay playable from that provider.
fn validate_provider_refs(episode: &Episode) -> DomainResult<()> {
    if let EpisodeSource::Provider(kind) = episode.source_provider {
        if !episode.provider_refs.contains_key(&kind) {
            return Err(DomainError::InvariantViolation(format!(
                "episode {} has no reference for its source provider {}",
                episode.number, kind
            )));
        }
    }
    Ok(())
}

/// Critical Episode Invariants:
///
/// 1. The episode number is finite and strictly positive (enforced by EpisodeNumber)
/// 2. `id` is unique within its source and never empty
/// 3. The source provider always has a matching entry in `provider_refs`
/// 4. Audio flags are tri-state; "unknown" is never coerced to a boolean

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::episode::{EpisodeNumber, ProviderRef};
    use crate::domain::ProviderKind;

    fn episode(id: &str) -> Episode {
        Episode::new(
            id,
            EpisodeNumber::whole(1).unwrap(),
            EpisodeSource::Provider(ProviderKind::HiAnime),
        )
    }

    #[test]
    fn test_valid_episode() {
        let mut ep = episode("ep-1");
        ep.attach_ref(ProviderKind::HiAnime, &ProviderRef::combined("ep-1"));
        assert!(validate_episode(&ep).is_ok());
    }

    #[test]
    fn test_missing_source_ref_fails() {
        assert!(validate_episode(&episode("ep-1")).is_err());
    }

    #[test]
    fn test_empty_id_fails() {
        let mut ep = episode(" ");
        ep.attach_ref(ProviderKind::HiAnime, &ProviderRef::combined("x"));
        assert!(validate_episode(&ep).is_err());
    }

    #[test]
    fn test_metadata_episode_needs_no_ref() {
        let ep = Episode::new(
            "anilist-1",
            EpisodeNumber::whole(1).unwrap(),
            EpisodeSource::MetadataService,
        );
        assert!(validate_episode(&ep).is_ok());
    }
}
