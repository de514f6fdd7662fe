//! Id range automata.
//!
//! An [`IdRange`] is one interval over a stream of ids, evaluated by order of
//! arrival: its bounds are matched by equality with the ids pushed into it,
//! never by comparing magnitudes. The stream does not need to be sorted, and
//! `[8,2]` is a valid range that opens when `8` is seen and closes at `2`.
//!
//! An [`IdRangeList`] chains several ranges, moving on to the next one as
//! soon as the current one closes.
//!
//! # Grammar
//!
//! ```text
//! list  := range ("," range)*
//! range := ("[" | "(") id? ("," id?)? ("]" | ")")
//! ```
//!
//! A single id without comma (`[42]`) sets both bounds to that id; an omitted
//! id leaves that side unbounded.
//!
//! ```
//! use cxi_range::IdRangeList;
//!
//! let mut ranges: IdRangeList<i64> = "[2,9],[10,7]".parse().unwrap();
//! assert!(!ranges.push_id(&1));
//! assert!(ranges.push_id(&2));
//! assert!(ranges.push_id(&9));
//! assert!(ranges.push_id(&10));
//! ```

pub mod error;
pub mod list;
mod parse;
pub mod range;

pub use error::RangeSyntaxError;
pub use list::IdRangeList;
pub use range::{IdRange, RangeState};
