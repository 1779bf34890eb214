// src/services/range_partitioner.rs
//
// Range Partitioner: fixed-size display pages over a reconciled list.
// Ranges are derived data, recomputed whenever the list or order changes.

use std::num::NonZeroUsize;

use crate::domain::{EpisodeNumber, Range, RangeLabel, ReconciledList, SortOrder};

/// Split `list` into pages of `page_size` in `order`.
///
/// - An empty list has no ranges
/// - A list that fits in one page yields a single `All` range
/// - Otherwise each range is labelled by its first and last episode number,
///   as displayed (so descending pages read "24 - 13")
pub fn partition(list: &ReconciledList, page_size: NonZeroUsize, order: SortOrder) -> Vec<Range> {
    if list.is_empty() {
        return Vec::new();
    }

    let ordered;
    let episodes = if list.sort_order == order {
        &list.episodes
    } else {
        ordered = list.with_sort_order(order);
        &ordered.episodes
    };

    if episodes.len() <= page_size.get() {
        return vec![Range {
            label: RangeLabel::All,
            episodes: episodes.clone(),
        }];
    }

    episodes
        .chunks(page_size.get())
        .filter_map(|chunk| {
            let first = chunk.first()?.number;
            let last = chunk.last()?.number;
            Some(Range {
                label: RangeLabel::Span { first, last },
                episodes: chunk.to_vec(),
            })
        })
        .collect()
}

/// Index of the range holding `number`, for jumping to "continue watching".
pub fn range_index_of(ranges: &[Range], number: EpisodeNumber) -> Option<usize> {
    ranges.iter().position(|range| range.contains(number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Episode, EpisodeSource, MediaId};

    fn list(count: u32) -> ReconciledList {
        let mut list = ReconciledList::empty(MediaId(1));
        list.episodes = (1..=count)
            .map(|n| {
                Episode::new(
                    format!("e{}", n),
                    EpisodeNumber::whole(n).unwrap(),
                    EpisodeSource::MetadataService,
                )
            })
            .collect();
        list
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_concatenated_ranges_reproduce_the_list() {
        for count in [0, 1, 11, 12, 13, 25, 100] {
            let list = list(count);
            for page in [1, 2, 5, 12, 24, 200] {
                for order in [SortOrder::Ascending, SortOrder::Descending] {
                    let expected = list.with_sort_order(order).episodes;
                    let joined: Vec<Episode> = partition(&list, size(page), order)
                        .into_iter()
                        .flat_map(|r| r.episodes)
                        .collect();
                    assert_eq!(joined, expected, "count={} page={} order={:?}", count, page, order);
                }
            }
        }
    }

    #[test]
    fn test_single_page_is_all() {
        let ranges = partition(&list(12), size(12), SortOrder::Ascending);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].label, RangeLabel::All);
        assert_eq!(ranges[0].label.to_string(), "All");
    }

    #[test]
    fn test_labels_follow_display_order() {
        let asc = partition(&list(30), size(12), SortOrder::Ascending);
        let labels: Vec<String> = asc.iter().map(|r| r.label.to_string()).collect();
        assert_eq!(labels, vec!["1 - 12", "13 - 24", "25 - 30"]);

        let desc = partition(&list(25), size(12), SortOrder::Descending);
        let labels: Vec<String> = desc.iter().map(|r| r.label.to_string()).collect();
        assert_eq!(labels, vec!["25 - 14", "13 - 2", "1"]);
    }

    #[test]
    fn test_empty_list_has_no_ranges() {
        assert!(partition(&list(0), size(24), SortOrder::Ascending).is_empty());
    }

    #[test]
    fn test_range_index_of() {
        let ranges = partition(&list(30), size(12), SortOrder::Ascending);
        assert_eq!(range_index_of(&ranges, EpisodeNumber::whole(14).unwrap()), Some(1));
        assert_eq!(range_index_of(&ranges, EpisodeNumber::whole(31).unwrap()), None);
    }
}
