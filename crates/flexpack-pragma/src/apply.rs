//! Applying a validated [`Pragma`] to the field database, alias map, and
//! constraint bag.

use crate::byte_pack;
use crate::types::{BytePackEntry, ContainerKind, DeparserZeroMode, Pragma};
use flexpack_ir::{
    AliasMap, AliasOrigin, AllConstraints, ConstraintReason, ContainerSize, ErrorSink,
    FieldDatabase, FieldFlags, FieldId, FlexpackError,
};

/// Apply one pragma's effects. `byte_pack_target` names the repack target
/// (struct name) a `BytePack` pragma's copack constraints should be filed
/// under.
pub fn apply_pragma<D: FieldDatabase>(
    pragma: &Pragma,
    db: &mut D,
    aliases: &mut AliasMap,
    constraints: &mut AllConstraints,
    byte_pack_target: &str,
    sink: &mut ErrorSink,
) {
    match pragma {
        Pragma::Alias { source, dest } => {
            if let Err(e) = aliases.insert(*source, *dest, None, AliasOrigin::Pragma) {
                sink.push(e);
            }
        }
        Pragma::NoOverlay { fields } => {
            for &f in fields {
                if let Some(field) = db.field_mut(f) {
                    field.flags |= FieldFlags::NO_OVERLAY;
                }
                constraints.mark_solitary(f, ConstraintReason::PRAGMA);
            }
        }
        Pragma::MutuallyExclusive { fields: _ } => {
            // Container-overlay eligibility across mutually-exclusive fields
            // is downstream PHV allocation's concern (§1 Non-goals); this
            // core only validates and records the pragma (already done at
            // parse time), it has no packing effect here.
        }
        Pragma::ContainerSize { field, sizes } => {
            let total: u16 = sizes.iter().map(|&s| u16::from(s)).sum();
            if let Some(cs) = ContainerSize::smallest_containing(total) {
                constraints.mark_no_split(*field, cs);
                if let Some(f) = db.field_mut(*field) {
                    f.flags |= FieldFlags::NO_SPLIT;
                    f.no_split_container_size = Some(cs);
                }
            } else {
                sink.push(FlexpackError::ConfigWarning(format!(
                    "pa_container_size on {field}: total size {total} exceeds 32 bits"
                )));
            }
        }
        Pragma::ContainerType { field, kind } => {
            // Container kind selection (normal/mocha/dark) is downstream PHV
            // allocation's concern; validated above, no-op here beyond a
            // trace breadcrumb.
            tracing::debug!(?field, ?kind, "pa_container_type recorded (no packing effect)");
            let _ = matches!(kind, ContainerKind::Dark | ContainerKind::Mocha | ContainerKind::Normal);
        }
        Pragma::NoInit { field } => {
            if let Some(f) = db.field_mut(*field) {
                f.flags |= FieldFlags::NO_INIT;
            }
        }
        Pragma::Solitary { field } => {
            constraints.mark_solitary(*field, ConstraintReason::PRAGMA);
            if let Some(f) = db.field_mut(*field) {
                f.flags |= FieldFlags::SOLITARY;
            }
        }
        Pragma::Atomic { field } => {
            let size = db.field(*field).map_or(0, |f| f.size);
            if let Some(cs) = ContainerSize::smallest_containing(size) {
                constraints.mark_no_split(*field, cs);
                if let Some(f) = db.field_mut(*field) {
                    f.flags |= FieldFlags::NO_SPLIT;
                    f.no_split_container_size = Some(cs);
                }
            }
        }
        Pragma::NoPack { fields } => {
            for i in 0..fields.len() {
                for j in (i + 1)..fields.len() {
                    constraints.add_no_pack(
                        flexpack_ir::FieldPair::new(fields[i], fields[j]),
                        ConstraintReason::PRAGMA,
                    );
                    db.add_no_pack_pair(fields[i], fields[j]);
                }
            }
        }
        Pragma::BytePack { entries } => {
            let widths: Vec<(FieldId, u16)> = entries
                .iter()
                .filter_map(|e| match e {
                    BytePackEntry::Field(f) => db.field(*f).map(|field| (*f, field.size)),
                    BytePackEntry::Pad(_) => None,
                })
                .collect();
            let width_of = |f: FieldId| -> u16 {
                widths
                    .iter()
                    .find(|(id, _)| *id == f)
                    .map_or(0, |(_, w)| *w)
            };
            byte_pack::apply_to_constraints(entries, width_of, byte_pack_target, constraints);
        }
        Pragma::DeparserZero { field, mode } => {
            if let Some(f) = db.field_mut(*field) {
                match mode {
                    DeparserZeroMode::Mark => f.flags |= FieldFlags::DEPARSER_ZERO_CANDIDATE,
                    DeparserZeroMode::NotParsed
                    | DeparserZeroMode::NotDeparsed
                    | DeparserZeroMode::Disable => {
                        f.flags.remove(FieldFlags::DEPARSER_ZERO_CANDIDATE);
                        f.flags |= FieldFlags::DEPARSER_ZERO_EXCLUDED;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexpack_ir::{Field, FieldKind, Gress, InMemoryFieldDb};

    #[test]
    fn solitary_pragma_sets_flag_and_constraint() {
        let mut db = InMemoryFieldDb::new();
        let f = db.insert(Field::new(FieldId(0), "f", Gress::Ingress, 4, FieldKind::Metadata));
        let mut aliases = AliasMap::new();
        let mut constraints = AllConstraints::new();
        let mut sink = ErrorSink::new();
        apply_pragma(
            &Pragma::Solitary { field: f },
            &mut db,
            &mut aliases,
            &mut constraints,
            "hdr",
            &mut sink,
        );
        assert!(db.field(f).unwrap().flags.contains(FieldFlags::SOLITARY));
        assert!(constraints.solitary.contains_key(&f));
    }

    #[test]
    fn no_pack_pragma_marks_all_pairs() {
        let mut db = InMemoryFieldDb::new();
        let a = db.insert(Field::new(FieldId(0), "a", Gress::Ingress, 4, FieldKind::Metadata));
        let b = db.insert(Field::new(FieldId(0), "b", Gress::Ingress, 4, FieldKind::Metadata));
        let c = db.insert(Field::new(FieldId(0), "c", Gress::Ingress, 4, FieldKind::Metadata));
        let mut aliases = AliasMap::new();
        let mut constraints = AllConstraints::new();
        let mut sink = ErrorSink::new();
        apply_pragma(
            &Pragma::NoPack { fields: vec![a, b, c] },
            &mut db,
            &mut aliases,
            &mut constraints,
            "hdr",
            &mut sink,
        );
        assert!(db.is_no_pack(a, b));
        assert!(db.is_no_pack(a, c));
        assert!(db.is_no_pack(b, c));
        assert_eq!(constraints.no_pack.len(), 3);
    }
}
