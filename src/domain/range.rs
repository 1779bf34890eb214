// src/domain/range.rs
//
// Ranges are derived data: recomputed from a list and a sort order,
// never stored or mutated on their own.

use serde::{Deserialize, Serialize};

use super::episode::{Episode, EpisodeNumber};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RangeLabel {
    /// The whole list fits in one page
    All,
    /// First and last episode numbers, in display order
    Span {
        first: EpisodeNumber,
        last: EpisodeNumber,
    },
}

impl std::fmt::Display for RangeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeLabel::All => write!(f, "All"),
            RangeLabel::Span { first, last } if first == last => write!(f, "{}", first),
            RangeLabel::Span { first, last } => write!(f, "{} - {}", first, last),
        }
    }
}

/// A contiguous display page of a reconciled list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub label: RangeLabel,
    pub episodes: Vec<Episode>,
}

impl Range {
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn contains(&self, number: EpisodeNumber) -> bool {
        self.episodes.iter().any(|e| e.number == number)
    }
}
