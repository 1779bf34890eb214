// src/services/title_resolver.rs
//
// Title Resolution
//
// Picks the provider catalogue entry that corresponds to a canonical title.
//
// CRITICAL RULES:
// - Pure: no I/O, same candidates → same pick
// - Tiers are strictly ordered; the first tier with a hit wins and the first
//   candidate within that tier wins
// - A non-empty candidate list always yields a pick
// - An empty candidate list yields None

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::{CatalogKind, MediaId, SearchCandidate};

/// How a candidate was matched, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    /// Candidate carries the same canonical media id
    CanonicalId,
    /// Case-insensitive equality
    Exact,
    /// Equality after stripping punctuation and collapsing whitespace
    Normalized,
    /// Either title contains the other
    Substring,
    /// No title match; first full series in the results
    FirstSeries,
    /// No title match and no series; first result
    FirstResult,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleMatch<'a> {
    pub candidate: &'a SearchCandidate,
    pub tier: MatchTier,
}

fn punctuation() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\s]+").expect("literal pattern"))
}

/// Lowercase, punctuation replaced by spaces, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = punctuation().replace_all(&lowered, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn resolve_title<'a>(
    title: &str,
    canonical_id: Option<MediaId>,
    candidates: &'a [SearchCandidate],
) -> Option<TitleMatch<'a>> {
    let first = candidates.first()?;
    let found = |candidate: &'a SearchCandidate, tier| Some(TitleMatch { candidate, tier });

    if let Some(id) = canonical_id {
        if let Some(c) = candidates.iter().find(|c| c.canonical_id == Some(id)) {
            return found(c, MatchTier::CanonicalId);
        }
    }

    let wanted = title.trim().to_lowercase();
    if let Some(c) = candidates
        .iter()
        .find(|c| c.title.trim().to_lowercase() == wanted)
    {
        return found(c, MatchTier::Exact);
    }

    let wanted_norm = normalize_title(title);
    let normalized: Vec<String> = candidates.iter().map(|c| normalize_title(&c.title)).collect();

    if !wanted_norm.is_empty() {
        if let Some(i) = normalized.iter().position(|n| *n == wanted_norm) {
            return found(&candidates[i], MatchTier::Normalized);
        }

        if let Some(i) = normalized
            .iter()
            .position(|n| !n.is_empty() && (n.contains(&wanted_norm) || wanted_norm.contains(n.as_str())))
        {
            return found(&candidates[i], MatchTier::Substring);
        }
    }

    if let Some(c) = candidates.iter().find(|c| c.kind == CatalogKind::Series) {
        log::debug!("No title match for '{}', taking first series '{}'", title, c.title);
        return found(c, MatchTier::FirstSeries);
    }

    log::debug!("No title match for '{}', taking first result '{}'", title, first.title);
    found(first, MatchTier::FirstResult)
}
