use std::collections::HashSet;

use super::entity::{ReconciledList, SortOrder};
use crate::domain::episode::validate_episode;
use crate::domain::{DomainError, DomainResult};

/// Validates all ReconciledList invariants
pub fn validate_reconciled_list(list: &ReconciledList) -> DomainResult<()> {
    validate_unique_numbers(list)?;
    validate_ordering(list)?;
    for episode in &list.episodes {
        validate_episode(episode)?;
    }
    Ok(())
}

/// At most one canonical episode per number.
fn validate_unique_numbers(list: &ReconciledList) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(list.episodes.len());
    for episode in &list.episodes {
        if !seen.insert(episode.number) {
            return Err(DomainError::DuplicateEpisodeNumber(episode.number.to_string()));
        }
    }
    Ok(())
}

fn validate_ordering(list: &ReconciledList) -> DomainResult<()> {
    let ordered = list.episodes.windows(2).all(|pair| match list.sort_order {
        SortOrder::Ascending => pair[0].number < pair[1].number,
        SortOrder::Descending => pair[0].number > pair[1].number,
    });
    if !ordered {
        return Err(DomainError::InvariantViolation(format!(
            "episodes of media {} are not in {:?} order",
            list.media_id, list.sort_order
        )));
    }
    Ok(())
}

/// Critical ReconciledList Invariants:
///
/// 1. No two episodes share a number
/// 2. Episodes follow `sort_order` strictly
/// 3. Every episode satisfies the Episode invariants
/// 4. The list is immutable once published; refreshes replace it

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::episode::{Episode, EpisodeNumber, EpisodeSource};
    use crate::domain::MediaId;

    fn episode(n: u32) -> Episode {
        Episode::new(
            format!("meta-{}", n),
            EpisodeNumber::whole(n).unwrap(),
            EpisodeSource::MetadataService,
        )
    }

    #[test]
    fn test_valid_list() {
        let mut list = ReconciledList::empty(MediaId(1));
        list.episodes = vec![episode(1), episode(2)];
        assert!(validate_reconciled_list(&list).is_ok());
    }

    #[test]
    fn test_duplicate_number_fails() {
        let mut list = ReconciledList::empty(MediaId(1));
        list.episodes = vec![episode(1), episode(1)];
        assert!(matches!(
            validate_reconciled_list(&list),
            Err(DomainError::DuplicateEpisodeNumber(_))
        ));
    }

    #[test]
    fn test_out_of_order_fails() {
        let mut list = ReconciledList::empty(MediaId(1));
        list.episodes = vec![episode(2), episode(1)];
        assert!(validate_reconciled_list(&list).is_err());

        list.sort_order = SortOrder::Descending;
        assert!(validate_reconciled_list(&list).is_ok());
    }
}
