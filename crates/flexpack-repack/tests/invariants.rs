//! Property tests over randomly generated sparse offset maps: whatever
//! [`reconstruct_flexible_layout`] produces must be fully padded to a byte
//! and must account for every field it was given, exactly once.

use proptest::prelude::*;

use flexpack_ir::{Field, FieldId, FieldKind, Gress, InMemoryFieldDb};
use flexpack_repack::reconstruct_flexible_layout;
use indexmap::IndexMap;

prop_compose! {
    /// `(width, gap)` pairs: `gap` is the slack inserted before that field,
    /// so fields are placed at strictly increasing, non-overlapping offsets
    /// by construction.
    fn arb_layout()(parts in prop::collection::vec((1u16..=9, 0u32..=5), 1..=8)) -> Vec<(u16, u32)> {
        parts
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn reconstructed_layout_is_byte_aligned_and_lossless(parts in arb_layout()) {
        let mut db = InMemoryFieldDb::new();
        let mut fields = Vec::new();
        let mut offsets = IndexMap::new();
        let mut cursor: u32 = 0;
        for (i, &(width, gap)) in parts.iter().enumerate() {
            let f = db.insert(Field::new(FieldId(0), &format!("f{i}"), Gress::Ingress, width, FieldKind::Metadata));
            cursor += gap;
            offsets.insert(f, cursor);
            cursor += u32::from(width);
            fields.push(f);
        }

        let entries = reconstruct_flexible_layout(&fields, &offsets, &db);

        let total: u16 = entries.iter().map(flexpack_ir::LayoutEntry::width).sum();
        prop_assert_eq!(total % 8, 0, "reconstructed layout must pad to a whole byte");

        let mut seen: Vec<FieldId> = entries.iter().filter_map(flexpack_ir::LayoutEntry::field_id).collect();
        seen.sort_by_key(|f| f.0);
        let mut expected = fields.clone();
        expected.sort_by_key(|f| f.0);
        prop_assert_eq!(seen, expected, "every input field must appear exactly once");
    }
}
