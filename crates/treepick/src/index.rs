//! Index arguments accepted by [`Picker::extract`](crate::Picker::extract).
//!
//! An [`Index`] is a position, a slice, a single key or an ordered list of
//! keys (which produces one row per candidate). Integer and range types,
//! strings and key lists all convert into it:
//!
//! ```
//! use treepick::{Index, Slice};
//!
//! assert_eq!(Index::from(2), Index::Position(2));
//! assert_eq!(Index::from(-1), Index::Position(-1));
//! assert_eq!(Index::from(1..3), Index::Slice(Slice::new(Some(1), Some(3))));
//! assert_eq!(Index::from("city"), Index::Key("city".into()));
//! assert_eq!(
//!     Index::from(["city", "id"]),
//!     Index::Keys(vec!["city".into(), "id".into()])
//! );
//! ```

use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::error::{PickerError, Result};

/// Half-open slice bounds with an optional step. Negative bounds count from
/// the end; a negative step walks backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl Slice {
    pub fn new(start: Option<isize>, stop: Option<isize>) -> Self {
        Slice {
            start,
            stop,
            step: None,
        }
    }

    /// Takes every `step`-th element. Zero is rejected when the slice is
    /// resolved.
    pub fn step_by(mut self, step: isize) -> Self {
        self.step = Some(step);
        self
    }

    /// Everything from `start`.
    pub fn start_at(start: isize) -> Self {
        Slice::new(Some(start), None)
    }

    /// Everything before `stop`.
    pub fn stop_at(stop: isize) -> Self {
        Slice::new(None, Some(stop))
    }

    /// Resolves the slice against a sequence length into the selected
    /// positions, in selection order. Out-of-range bounds are clamped.
    pub fn indices(&self, len: usize) -> Result<Vec<usize>> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(PickerError::config("slice step cannot be zero"));
        }

        let len = len as isize;
        let adjust = |bound: isize, low: isize, high: isize| {
            let bound = if bound < 0 { bound + len } else { bound };
            bound.clamp(low, high)
        };

        let picked: Vec<isize> = if step > 0 {
            let start = self.start.map_or(0, |b| adjust(b, 0, len));
            let stop = self.stop.map_or(len, |b| adjust(b, 0, len));
            (start..stop).step_by(step.unsigned_abs()).collect()
        } else {
            // -1 stands for "before the first element".
            let start = self.start.map_or(len - 1, |b| adjust(b, -1, len - 1));
            let stop = self.stop.map_or(-1, |b| adjust(b, -1, len - 1));
            (stop + 1..=start).rev().step_by(step.unsigned_abs()).collect()
        };
        Ok(picked.into_iter().map(|idx| idx as usize).collect())
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_str(":")?;
        if let Some(stop) = self.stop {
            write!(f, "{stop}")?;
        }
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

/// An indexing argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Index {
    /// Position in a sequence (negative counts from the end).
    Position(isize),
    /// Sub-range of a sequence.
    Slice(Slice),
    /// Single key.
    Key(String),
    /// Ordered keys, producing a row.
    Keys(Vec<String>),
}

impl Index {
    /// Resolves a possibly negative position against `len`.
    pub(crate) fn resolve_position(pos: isize, len: usize) -> Option<usize> {
        let idx = if pos < 0 {
            len.checked_sub(pos.unsigned_abs())?
        } else {
            pos as usize
        };
        (idx < len).then_some(idx)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Position(pos) => write!(f, "position {pos}"),
            Index::Slice(slice) => write!(f, "slice [{slice}]"),
            Index::Key(key) => write!(f, "key `{key}`"),
            Index::Keys(keys) => write!(f, "keys ({})", keys.join(", ")),
        }
    }
}

macro_rules! position_from {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Index {
                fn from(pos: $ty) -> Self {
                    Index::Position(pos as isize)
                }
            }
        )+
    };
}

position_from!(i32, i64, isize, u32, usize);

impl From<Slice> for Index {
    fn from(slice: Slice) -> Self {
        Index::Slice(slice)
    }
}

impl From<Range<isize>> for Index {
    fn from(range: Range<isize>) -> Self {
        Index::Slice(Slice::new(Some(range.start), Some(range.end)))
    }
}

impl From<Range<i32>> for Index {
    fn from(range: Range<i32>) -> Self {
        Index::Slice(Slice::new(Some(range.start as isize), Some(range.end as isize)))
    }
}

impl From<RangeFrom<isize>> for Index {
    fn from(range: RangeFrom<isize>) -> Self {
        Index::Slice(Slice::start_at(range.start))
    }
}

impl From<RangeFrom<i32>> for Index {
    fn from(range: RangeFrom<i32>) -> Self {
        Index::Slice(Slice::start_at(range.start as isize))
    }
}

impl From<RangeTo<isize>> for Index {
    fn from(range: RangeTo<isize>) -> Self {
        Index::Slice(Slice::stop_at(range.end))
    }
}

impl From<RangeTo<i32>> for Index {
    fn from(range: RangeTo<i32>) -> Self {
        Index::Slice(Slice::stop_at(range.end as isize))
    }
}

impl From<RangeFull> for Index {
    fn from(_: RangeFull) -> Self {
        Index::Slice(Slice::default())
    }
}

impl From<&str> for Index {
    fn from(key: &str) -> Self {
        Index::Key(key.to_string())
    }
}

impl From<String> for Index {
    fn from(key: String) -> Self {
        Index::Key(key)
    }
}

impl From<Vec<String>> for Index {
    fn from(keys: Vec<String>) -> Self {
        Index::Keys(keys)
    }
}

impl From<Vec<&str>> for Index {
    fn from(keys: Vec<&str>) -> Self {
        Index::Keys(keys.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Index {
    fn from(keys: &[&str]) -> Self {
        Index::Keys(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Index {
    fn from(keys: [&str; N]) -> Self {
        Index::Keys(keys.iter().map(|k| k.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_resolution() {
        let picked = |slice: Slice, len| slice.indices(len).unwrap();
        assert_eq!(picked(Slice::new(Some(1), Some(3)), 5), vec![1, 2]);
        assert_eq!(picked(Slice::stop_at(-2), 5), vec![0, 1, 2]);
        assert_eq!(picked(Slice::start_at(-2), 5), vec![3, 4]);
        assert!(picked(Slice::new(Some(4), Some(2)), 5).is_empty());
        assert_eq!(picked(Slice::new(Some(-10), Some(10)), 5), vec![0, 1, 2, 3, 4]);
        assert!(picked(Slice::default(), 0).is_empty());
    }

    #[test]
    fn stepped_slices() {
        let picked = |slice: Slice, len| slice.indices(len).unwrap();
        assert_eq!(picked(Slice::default().step_by(2), 5), vec![0, 2, 4]);
        assert_eq!(picked(Slice::start_at(1).step_by(3), 8), vec![1, 4, 7]);
        assert_eq!(picked(Slice::default().step_by(-1), 4), vec![3, 2, 1, 0]);
        assert_eq!(picked(Slice::new(Some(-2), Some(0)).step_by(-1), 5), vec![3, 2, 1]);
        assert_eq!(picked(Slice::stop_at(1).step_by(-2), 6), vec![5, 3]);
        assert_eq!(picked(Slice::new(Some(10), None).step_by(-3), 5), vec![4, 1]);
        assert!(picked(Slice::new(Some(1), Some(3)).step_by(-1), 5).is_empty());
        assert!(picked(Slice::default().step_by(-1), 0).is_empty());
        assert!(matches!(
            Slice::default().step_by(0).indices(3),
            Err(PickerError::Config(_))
        ));
    }

    #[test]
    fn position_resolution() {
        assert_eq!(Index::resolve_position(0, 3), Some(0));
        assert_eq!(Index::resolve_position(-1, 3), Some(2));
        assert_eq!(Index::resolve_position(3, 3), None);
        assert_eq!(Index::resolve_position(-4, 3), None);
    }

    #[test]
    fn conversions() {
        assert_eq!(Index::from(..-2), Index::Slice(Slice::stop_at(-2)));
        assert_eq!(Index::from(2..), Index::Slice(Slice::start_at(2)));
        assert_eq!(Index::from(..), Index::Slice(Slice::default()));
        assert_eq!(
            Index::from(vec!["a", "b"]),
            Index::Keys(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn display() {
        assert_eq!(Index::Position(-1).to_string(), "position -1");
        assert_eq!(Index::Slice(Slice::stop_at(2)).to_string(), "slice [:2]");
        assert_eq!(
            Index::Slice(Slice::start_at(1).step_by(-1)).to_string(),
            "slice [1::-1]"
        );
        assert_eq!(Index::from(["a", "b"]).to_string(), "keys (a, b)");
    }
}
