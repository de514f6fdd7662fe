use std::fmt;
use std::str::FromStr;

use crate::error::RangeSyntaxError;
use crate::parse::Parser;

/// State of an [`IdRange`] after the last pushed id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeState {
    /// The lower bound has not been seen yet.
    Before,
    /// The exclusive lower bound was just seen; the next id is inside.
    RightBefore,
    /// Inside the range.
    Accepted,
    /// The inclusive upper bound was just seen: admitted, and the last one.
    AcceptedEnd,
    /// Past the range. Terminal.
    After,
}

impl RangeState {
    /// Returns `true` if the id that produced this state is admitted.
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedEnd)
    }
}

/// One interval over an id stream, matched by equality in arrival order.
///
/// Each id is expected once, in traversal order. The automaton is driven by
/// [`IdRange::push_id`] for the lifetime of one pass and never reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdRange<T> {
    from: Option<T>,
    from_inclusive: bool,
    to: Option<T>,
    to_inclusive: bool,
    state: RangeState,
}

impl<T: PartialEq> IdRange<T> {
    /// Create a range from its bounds.
    ///
    /// Without a lower bound the range starts inside, except for the empty
    /// interval (no bounds at all and an exclusive right side) which starts
    /// in [`RangeState::After`].
    pub fn new(from: Option<T>, from_inclusive: bool, to: Option<T>, to_inclusive: bool) -> Self {
        let state = match (&from, &to) {
            (Some(_), _) => RangeState::Before,
            (None, None) if !to_inclusive => RangeState::After,
            (None, _) => RangeState::Accepted,
        };
        Self {
            from,
            from_inclusive,
            to,
            to_inclusive,
            state,
        }
    }

    /// The closed interval `[from, to]`.
    pub fn closed(from: T, to: T) -> Self {
        Self::new(Some(from), true, Some(to), true)
    }

    /// A range admitting every id.
    pub fn unbounded() -> Self {
        Self::new(None, true, None, true)
    }

    /// Feed the next id of the stream and return the resulting state.
    ///
    /// The id is admitted iff the returned state
    /// [`is_accepted`](RangeState::is_accepted).
    pub fn push_id(&mut self, id: &T) -> RangeState {
        self.state = match self.state {
            RangeState::Before if self.from.as_ref() == Some(id) => {
                if self.from_inclusive {
                    self.enter(id)
                } else {
                    RangeState::RightBefore
                }
            }
            RangeState::Before => RangeState::Before,
            RangeState::RightBefore | RangeState::Accepted => self.enter(id),
            RangeState::AcceptedEnd | RangeState::After => RangeState::After,
        };
        self.state
    }

    /// State reached by an id inside the range, checking the upper bound.
    fn enter(&self, id: &T) -> RangeState {
        match &self.to {
            Some(to) if to == id && self.to_inclusive => RangeState::AcceptedEnd,
            Some(to) if to == id => RangeState::After,
            _ => RangeState::Accepted,
        }
    }

    /// Current state.
    pub fn state(&self) -> RangeState {
        self.state
    }

    /// Lower bound.
    pub fn from(&self) -> Option<&T> {
        self.from.as_ref()
    }

    /// Upper bound.
    pub fn to(&self) -> Option<&T> {
        self.to.as_ref()
    }

    pub fn is_from_inclusive(&self) -> bool {
        self.from_inclusive
    }

    pub fn is_to_inclusive(&self) -> bool {
        self.to_inclusive
    }

    /// The id that would move this range out of [`RangeState::Before`], if
    /// it is still waiting for it.
    pub fn next_id(&self) -> Option<&T> {
        match self.state {
            RangeState::Before => self.from.as_ref(),
            _ => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for IdRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.from_inclusive { "[" } else { "(" })?;
        if let Some(from) = &self.from {
            write!(f, "{from}")?;
        }
        f.write_str(",")?;
        if let Some(to) = &self.to {
            write!(f, "{to}")?;
        }
        f.write_str(if self.to_inclusive { "]" } else { ")" })
    }
}

impl<T: FromStr + Clone + PartialEq> FromStr for IdRange<T> {
    type Err = RangeSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new(s);
        let range = parser.range()?;
        parser.finish()?;
        Ok(range)
    }
}
