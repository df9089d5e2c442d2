//! [`FieldSlice`]: a contiguous little-endian bit range of a [`Field`].

use crate::field::FieldId;
use serde::{Deserialize, Serialize};

/// A contiguous little-endian bit range `[lo, hi]` of a field, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSlice {
    pub field: FieldId,
    pub lo: u16,
    pub hi: u16,
}

impl FieldSlice {
    /// # Panics
    /// Panics if `lo > hi` or `hi >= size`.
    #[must_use]
    pub fn new(field: FieldId, lo: u16, hi: u16, size: u16) -> Self {
        assert!(lo <= hi, "slice range inverted: lo={lo} hi={hi}");
        assert!(hi < size, "slice range out of bounds: hi={hi} size={size}");
        Self { field, lo, hi }
    }

    /// A slice spanning the whole field.
    #[must_use]
    pub fn whole(field: FieldId, size: u16) -> Self {
        Self {
            field,
            lo: 0,
            hi: size.saturating_sub(1),
        }
    }

    #[must_use]
    pub fn is_whole(&self, size: u16) -> bool {
        self.lo == 0 && self.hi == size.saturating_sub(1)
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.hi - self.lo + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_slice_satisfies_full_range() {
        let s = FieldSlice::whole(FieldId(0), 12);
        assert!(s.is_whole(12));
        assert_eq!(s.width(), 12);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn rejects_out_of_bounds_hi() {
        FieldSlice::new(FieldId(0), 0, 12, 12);
    }
}
