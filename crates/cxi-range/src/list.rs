use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::error::RangeSyntaxError;
use crate::parse::Parser;
use crate::range::{IdRange, RangeState};

/// Ordered chain of [`IdRange`]s consulted one after the other.
///
/// Only the current range sees pushed ids. When it reports
/// [`RangeState::AcceptedEnd`] the list moves on before returning, so the
/// next id is evaluated fresh; when it reports [`RangeState::After`] the
/// list moves on and re-evaluates the same id, which skips zero-width
/// ranges. Once every range is exhausted all ids are rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdRangeList<T> {
    ranges: Vec<IdRange<T>>,
    current: usize,
}

impl<T: PartialEq> IdRangeList<T> {
    /// Create a list from ranges in the order they are consulted.
    pub fn new(ranges: Vec<IdRange<T>>) -> Self {
        Self { ranges, current: 0 }
    }

    /// Feed the next id of the stream. Returns `true` if it is admitted.
    pub fn push_id(&mut self, id: &T) -> bool {
        while let Some(range) = self.ranges.get_mut(self.current) {
            match range.push_id(id) {
                RangeState::Accepted => return true,
                RangeState::AcceptedEnd => {
                    self.current += 1;
                    trace!(current = self.current, "range closed on inclusive bound");
                    return true;
                }
                RangeState::After => {
                    self.current += 1;
                    trace!(current = self.current, "range closed, re-evaluating id");
                }
                RangeState::Before | RangeState::RightBefore => return false,
            }
        }
        false
    }

    /// The id that would open the current range, if it is still waiting.
    pub fn next_id(&self) -> Option<&T> {
        self.ranges.get(self.current)?.next_id()
    }

    /// Returns `true` once every range has closed.
    pub fn is_exhausted(&self) -> bool {
        self.current >= self.ranges.len()
    }

    /// The ranges, in declared order.
    pub fn ranges(&self) -> &[IdRange<T>] {
        &self.ranges
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns `true` if the list holds no range.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl<T: fmt::Display> fmt::Display for IdRangeList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

impl<T: FromStr + Clone + PartialEq> FromStr for IdRangeList<T> {
    type Err = RangeSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new(s);
        let mut ranges = vec![parser.range()?];
        while parser.separator()? {
            ranges.push(parser.range()?);
        }
        Ok(Self::new(ranges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(s: &str) -> IdRangeList<i64> {
        s.parse().unwrap()
    }

    #[test]
    fn walks_through_ranges_in_arrival_order() {
        let mut ranges = list("[2,9],[10,7]");
        let ids = [1, 2, 5, 9, 10, 3, 7, 8];
        let admitted: Vec<bool> = ids.iter().map(|id| ranges.push_id(id)).collect();
        assert_eq!(admitted, [false, true, true, true, true, true, true, false]);
        assert!(ranges.is_exhausted());
    }

    #[test]
    fn exclusive_end_re_evaluates_id_on_next_range() {
        let mut ranges = list("[1,5),[5,6]");
        assert!(ranges.push_id(&1));
        assert!(ranges.push_id(&5));
        assert!(ranges.push_id(&6));
        assert!(!ranges.push_id(&7));
    }

    #[test]
    fn zero_width_ranges_are_skipped() {
        let mut ranges = list("(),[,)  , [3]");
        assert_eq!(ranges.len(), 3);
        assert!(!ranges.push_id(&1));
        assert_eq!(ranges.next_id(), Some(&3));
        assert!(ranges.push_id(&3));
        assert!(ranges.is_exhausted());
    }

    #[test]
    fn next_id_tracks_current_range() {
        let mut ranges = list("[2,9],[10,7]");
        assert_eq!(ranges.next_id(), Some(&2));
        ranges.push_id(&2);
        assert_eq!(ranges.next_id(), None);
        ranges.push_id(&9);
        assert_eq!(ranges.next_id(), Some(&10));
    }

    #[test]
    fn exhausted_list_rejects_everything() {
        let mut ranges = list("[1]");
        assert!(ranges.push_id(&1));
        assert!(!ranges.push_id(&1));
        assert!(!ranges.push_id(&2));
        assert_eq!(ranges.next_id(), None);
    }

    #[test]
    fn display_joins_ranges() {
        assert_eq!(list("[2,9], (10,7]").to_string(), "[2,9],(10,7]");
    }

    #[test]
    fn syntax_errors_carry_position() {
        let err = "[1,2];[3]".parse::<IdRangeList<i64>>().unwrap_err();
        assert_eq!(err, RangeSyntaxError::Unexpected { position: 5, found: ';' });
        let err = "[1,2],".parse::<IdRangeList<i64>>().unwrap_err();
        assert_eq!(err, RangeSyntaxError::ExpectedOpen { position: 6 });
    }

    fn bound() -> impl Strategy<Value = Option<u8>> {
        prop::option::of(0u8..6)
    }

    proptest! {
        #[test]
        fn rendered_range_behaves_like_original(
            from in bound(),
            from_inclusive in any::<bool>(),
            to in bound(),
            to_inclusive in any::<bool>(),
            ids in prop::collection::vec(0u8..6, 0..24),
        ) {
            let mut original = IdRange::new(from, from_inclusive, to, to_inclusive);
            let mut reparsed: IdRange<u8> = original.to_string().parse().unwrap();
            for id in &ids {
                prop_assert_eq!(original.push_id(id), reparsed.push_id(id));
            }
        }
    }
}
