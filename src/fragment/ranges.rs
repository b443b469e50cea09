//! Coalesced set of received byte ranges.

use std::ops::Range;

/// Sorted, non-overlapping, non-adjacent half-open ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RangeSet {
    ranges: Vec<Range<usize>>,
}

impl RangeSet {
    /// Return the sub-ranges of `range` not yet covered, in ascending order.
    pub(crate) fn gaps(&self, range: Range<usize>) -> Vec<Range<usize>> {
        let mut gaps = Vec::new();
        let mut cursor = range.start;
        for held in &self.ranges {
            if held.end <= cursor {
                continue;
            }
            if held.start >= range.end {
                break;
            }
            if held.start > cursor {
                gaps.push(cursor..held.start);
            }
            cursor = cursor.max(held.end);
            if cursor >= range.end {
                break;
            }
        }
        if cursor < range.end {
            gaps.push(cursor..range.end);
        }
        gaps
    }

    /// Add `range`, merging it with any overlapping or adjacent ranges.
    pub(crate) fn insert(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let first = self.ranges.partition_point(|held| held.end < range.start);
        let last = self.ranges.partition_point(|held| held.start <= range.end);
        let merged = if first < last {
            self.ranges[first].start.min(range.start)..self.ranges[last - 1].end.max(range.end)
        } else {
            range
        };
        self.ranges.splice(first..last, std::iter::once(merged));
    }

    /// Report whether `[0, total)` is fully covered.
    pub(crate) fn covers_prefix(&self, total: usize) -> bool {
        total == 0 || self.ranges.first().is_some_and(|held| held.start == 0 && held.end >= total)
    }

    /// Highest covered offset, or zero when empty.
    pub(crate) fn end(&self) -> usize { self.ranges.last().map_or(0, |held| held.end) }

    /// Number of covered bytes.
    pub(crate) fn covered(&self) -> usize { self.ranges.iter().map(ExactSizeIterator::len).sum() }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::RangeSet;

    fn set(ranges: &[(usize, usize)]) -> RangeSet {
        let mut set = RangeSet::default();
        for &(start, end) in ranges {
            set.insert(start..end);
        }
        set
    }

    #[rstest]
    #[case::disjoint(&[(0, 4), (8, 12)], vec![0..4, 8..12])]
    #[case::adjacent(&[(0, 4), (4, 8)], vec![0..8])]
    #[case::overlapping(&[(4, 10), (0, 6)], vec![0..10])]
    #[case::bridging(&[(0, 2), (6, 8), (1, 7)], vec![0..8])]
    #[case::contained(&[(0, 10), (3, 5)], vec![0..10])]
    fn insert_coalesces(#[case] input: &[(usize, usize)], #[case] expected: Vec<std::ops::Range<usize>>) {
        assert_eq!(set(input).ranges, expected);
    }

    #[test]
    fn gaps_report_uncovered_parts() {
        let held = set(&[(4, 8), (12, 16)]);
        assert_eq!(held.gaps(0..20), vec![0..4, 8..12, 16..20]);
        assert_eq!(held.gaps(5..7), Vec::<std::ops::Range<usize>>::new());
        assert_eq!(held.gaps(6..14), vec![8..12]);
    }

    #[test]
    fn prefix_coverage_requires_start_at_zero() {
        assert!(set(&[(0, 8)]).covers_prefix(8));
        assert!(!set(&[(1, 8)]).covers_prefix(8));
        assert!(!set(&[(0, 4), (5, 8)]).covers_prefix(8));
        assert_eq!(set(&[(0, 4), (5, 8)]).covered(), 7);
        assert_eq!(set(&[(0, 4), (5, 8)]).end(), 8);
    }
}
