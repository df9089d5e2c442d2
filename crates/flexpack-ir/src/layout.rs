//! [`RepackedLayout`]: the solved, padded bit layout for one struct-like type.

use crate::field::{FieldId, Gress};
use serde::{Deserialize, Serialize};

/// One positioned slot in a repacked layout: either a source field or a
/// synthetic padding run. Padding entries carry no source field, only a
/// width, per §3/§4.4.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutEntry {
    Field { field: FieldId, width: u16 },
    Padding { width: u16 },
}

impl LayoutEntry {
    #[must_use]
    pub fn width(&self) -> u16 {
        match self {
            LayoutEntry::Field { width, .. } | LayoutEntry::Padding { width } => *width,
        }
    }

    #[must_use]
    pub fn field_id(&self) -> Option<FieldId> {
        match self {
            LayoutEntry::Field { field, .. } => Some(*field),
            LayoutEntry::Padding { .. } => None,
        }
    }
}

/// The output of one repack target: an ordered list of positioned
/// field-slices and paddings forming one struct type.
///
/// `entries` is stored MSB-first (the order the caller should emit into the
/// rewritten struct); §4.4 builds it in offset order and reverses it once
/// before handing it back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepackedLayout {
    pub type_name: String,
    pub gress: Gress,
    pub entries: Vec<LayoutEntry>,
}

impl RepackedLayout {
    #[must_use]
    pub fn new(type_name: impl Into<String>, gress: Gress, entries: Vec<LayoutEntry>) -> Self {
        Self {
            type_name: type_name.into(),
            gress,
            entries,
        }
    }

    /// Sum of all entry widths, in bits.
    #[must_use]
    pub fn total_bits(&self) -> u16 {
        self.entries.iter().map(LayoutEntry::width).sum()
    }

    /// `§8` "Total size alignment": the struct's total width is a whole
    /// number of bytes.
    #[must_use]
    pub fn is_byte_aligned(&self) -> bool {
        self.total_bits() % 8 == 0
    }

    /// Re-derive each entry's offset from its position in `entries`, walking
    /// MSB-first order (i.e. entry 0 is the highest bits). Returns
    /// `(entry_index, offset_from_lsb, width)` triples.
    #[must_use]
    pub fn offsets_from_lsb(&self) -> Vec<(usize, u16, u16)> {
        let total = self.total_bits();
        let mut msb_cursor = total;
        let mut out = Vec::with_capacity(self.entries.len());
        for (idx, e) in self.entries.iter().enumerate() {
            let w = e.width();
            msb_cursor -= w;
            out.push((idx, msb_cursor, w));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_bits_sums_entries() {
        let layout = RepackedLayout::new(
            "hdr",
            Gress::Ingress,
            vec![
                LayoutEntry::Field {
                    field: FieldId(0),
                    width: 4,
                },
                LayoutEntry::Padding { width: 4 },
            ],
        );
        assert_eq!(layout.total_bits(), 8);
        assert!(layout.is_byte_aligned());
    }

    #[test]
    fn offsets_from_lsb_walk_msb_first_entries_downward() {
        let layout = RepackedLayout::new(
            "hdr",
            Gress::Ingress,
            vec![
                LayoutEntry::Field {
                    field: FieldId(0),
                    width: 3,
                },
                LayoutEntry::Padding { width: 5 },
            ],
        );
        let offs = layout.offsets_from_lsb();
        // entry 0 (field, msb-most) occupies the top 3 bits -> lsb offset 5
        assert_eq!(offs[0], (0, 5, 3));
        // entry 1 (padding) occupies the bottom 5 bits -> lsb offset 0
        assert_eq!(offs[1], (1, 0, 5));
    }
}
