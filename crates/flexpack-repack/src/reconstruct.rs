//! Layout reconstruction (§4.4): turn a solved offset map into a padded,
//! MSB-first [`RepackedLayout`].

use flexpack_ir::{Field, FieldDatabase, FieldId, Gress, LayoutEntry, RepackedLayout, StructLikeType};
use indexmap::IndexMap;

/// Build the padded entry list for one target's flexible fields.
///
/// Sorts `fields` by their solved LSB offset, inserting a synthetic
/// [`LayoutEntry::Padding`] wherever the next field doesn't start exactly
/// where the previous one ended (including a leading pad if the lowest
/// offset isn't 0), then pads the trailing run to a whole byte. The result
/// is built walking LSB to MSB and reversed once before returning, matching
/// the MSB-first storage convention [`RepackedLayout`] documents.
///
/// Fields missing from `offsets` (the solver never declared them) are
/// skipped rather than treated as an error here; that mismatch is a caller
/// invariant violation the driver checks before calling this.
#[must_use]
pub fn reconstruct_flexible_layout(
    fields: &[FieldId],
    offsets: &IndexMap<FieldId, u32>,
    db: &impl FieldDatabase,
) -> Vec<LayoutEntry> {
    let mut sorted: Vec<(FieldId, u32, u16)> = fields
        .iter()
        .filter_map(|&f| {
            let offset = *offsets.get(&f)?;
            let size = db.field(f)?.size;
            Some((f, offset, size))
        })
        .collect();
    sorted.sort_by_key(|&(_, offset, _)| offset);

    let mut entries = Vec::with_capacity(sorted.len() + 2);
    let mut cursor: u32 = 0;
    for (field, offset, size) in sorted {
        if offset > cursor {
            entries.push(LayoutEntry::Padding {
                #[allow(clippy::cast_possible_truncation)]
                width: (offset - cursor) as u16,
            });
        }
        entries.push(LayoutEntry::Field { field, width: size });
        cursor = offset + u32::from(size);
    }
    let rem = cursor % 8;
    if rem != 0 {
        #[allow(clippy::cast_possible_truncation)]
        entries.push(LayoutEntry::Padding { width: (8 - rem) as u16 });
    }
    entries.reverse();
    entries
}

/// Build the full repacked layout for one struct-like type: its non-flexible
/// fields verbatim in declaration order, followed by its flexible fields
/// reconstructed with padding (§4.5: "non-flexible and non-padding fields
/// preserved verbatim, then repacked flexible fields with padding
/// inserted"). A flexible field whose solved offset happens to land on a
/// byte boundary needs no special casing: the same gap-filling walk that
/// pads a misaligned neighbour simply finds no gap to fill around it.
#[must_use]
pub fn build_repacked_layout(
    struct_type: &StructLikeType,
    offsets: &IndexMap<FieldId, u32>,
    db: &impl FieldDatabase,
) -> RepackedLayout {
    let flexible_ids: Vec<FieldId> = struct_type
        .fields
        .iter()
        .copied()
        .filter(|&f| db.field(f).is_some_and(Field::is_flexible))
        .collect();

    let mut entries: Vec<LayoutEntry> = struct_type
        .fields
        .iter()
        .copied()
        .filter(|&f| db.field(f).is_some_and(|field| !field.is_flexible()))
        .filter_map(|f| db.field(f).map(|field| LayoutEntry::Field { field: f, width: field.size }))
        .collect();

    entries.extend(reconstruct_flexible_layout(&flexible_ids, offsets, db));

    RepackedLayout::new(struct_type.name.clone(), struct_type.gress, entries)
}

#[must_use]
pub fn gress_of(struct_type: &StructLikeType) -> Gress {
    struct_type.gress
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexpack_ir::{FieldKind, InMemoryFieldDb};

    fn mk(db: &mut InMemoryFieldDb, name: &str, size: u16, kind: FieldKind) -> FieldId {
        db.insert(Field::new(FieldId(0), name, Gress::Ingress, size, kind))
    }

    #[test]
    fn contiguous_fields_need_no_padding() {
        let mut db = InMemoryFieldDb::new();
        let a = mk(&mut db, "a", 4, FieldKind::Metadata);
        let b = mk(&mut db, "b", 4, FieldKind::Metadata);
        let mut offsets = IndexMap::new();
        offsets.insert(a, 0);
        offsets.insert(b, 4);
        let entries = reconstruct_flexible_layout(&[a, b], &offsets, &db);
        assert_eq!(
            entries,
            vec![
                LayoutEntry::Field { field: b, width: 4 },
                LayoutEntry::Field { field: a, width: 4 },
            ]
        );
    }

    #[test]
    fn gap_between_fields_becomes_padding() {
        let mut db = InMemoryFieldDb::new();
        let a = mk(&mut db, "a", 2, FieldKind::Metadata);
        let b = mk(&mut db, "b", 2, FieldKind::Metadata);
        let mut offsets = IndexMap::new();
        offsets.insert(a, 0);
        offsets.insert(b, 4);
        let entries = reconstruct_flexible_layout(&[a, b], &offsets, &db);
        // a occupies [0,2), gap [2,4), b occupies [4,6), trailing pad [6,8).
        assert_eq!(
            entries,
            vec![
                LayoutEntry::Padding { width: 2 },
                LayoutEntry::Field { field: b, width: 2 },
                LayoutEntry::Padding { width: 2 },
                LayoutEntry::Field { field: a, width: 2 },
            ]
        );
        let total: u16 = entries.iter().map(LayoutEntry::width).sum();
        assert_eq!(total % 8, 0);
    }

    #[test]
    fn build_repacked_layout_keeps_non_flexible_first() {
        let mut db = InMemoryFieldDb::new();
        let hdr_field = mk(&mut db, "pov", 1, FieldKind::Pov);
        let flex = {
            let mut f = Field::new(FieldId(0), "flex", Gress::Ingress, 3, FieldKind::Metadata);
            f.flags |= flexpack_ir::FieldFlags::FLEXIBLE;
            db.insert(f)
        };
        let struct_type = StructLikeType {
            name: "bridge_md".into(),
            gress: Gress::Ingress,
            fields: vec![hdr_field, flex],
            fixed_width_bits: None,
        };
        let mut offsets = IndexMap::new();
        offsets.insert(flex, 0);
        let layout = build_repacked_layout(&struct_type, &offsets, &db);
        assert_eq!(layout.entries[0], LayoutEntry::Field { field: hdr_field, width: 1 });
        assert!(layout
            .entries
            .iter()
            .any(|e| e.field_id() == Some(flex)));
        assert!(layout.is_byte_aligned());
    }
}
