//! Layout reconstruction (§4.4): turns a solved per-target offset map into
//! padded, MSB-first [`flexpack_ir::RepackedLayout`] values ready for
//! `flexpack-rewrite` to splice into the IR.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod fixed;
pub mod reconstruct;

pub use fixed::pad_to_fixed_width;
pub use reconstruct::{build_repacked_layout, reconstruct_flexible_layout};

use flexpack_ir::{ErrorSink, FieldDatabase, FieldId, ProgramIr, RepackedLayout};
use indexmap::IndexMap;

/// Build a [`RepackedLayout`] for every struct-like type the solver
/// produced offsets for, then pad any fixed-width header among them.
///
/// Struct types absent from `solved` (no flexible fields, never a solver
/// target) are skipped; `flexpack-driver` handles those separately since
/// they may still need [`pad_to_fixed_width`] with no solving at all.
#[must_use]
pub fn build_all_layouts(
    ir: &ProgramIr,
    solved: &IndexMap<String, IndexMap<FieldId, u32>>,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
) -> IndexMap<String, RepackedLayout> {
    let mut out = IndexMap::new();
    for (name, offsets) in solved {
        let Some(struct_type) = ir.struct_type(name) else {
            continue;
        };
        let mut layout = build_repacked_layout(struct_type, offsets, db);
        if let Some(fixed_bits) = struct_type.fixed_width_bits {
            pad_to_fixed_width(&mut layout, fixed_bits, sink);
        }
        out.insert(name.clone(), layout);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexpack_ir::{Field, FieldFlags, FieldKind, Gress, InMemoryFieldDb, StructLikeType};

    #[test]
    fn build_all_layouts_skips_unsolved_types_and_pads_fixed_ones() {
        let mut db = InMemoryFieldDb::new();
        let mut flex = Field::new(FieldId(0), "flex", Gress::Ingress, 8, FieldKind::Metadata);
        flex.flags |= FieldFlags::FLEXIBLE;
        let flex = db.insert(flex);

        let mut ir = ProgramIr::new();
        ir.struct_types.push(StructLikeType {
            name: "bridge_md".into(),
            gress: Gress::Ingress,
            fields: vec![flex],
            fixed_width_bits: Some(16),
        });
        ir.struct_types.push(StructLikeType {
            name: "untouched".into(),
            gress: Gress::Ingress,
            fields: vec![],
            fixed_width_bits: None,
        });

        let mut solved = IndexMap::new();
        let mut offsets = IndexMap::new();
        offsets.insert(flex, 0);
        solved.insert("bridge_md".to_string(), offsets);

        let mut sink = ErrorSink::new();
        let layouts = build_all_layouts(&ir, &solved, &db, &mut sink);
        assert!(layouts.contains_key("bridge_md"));
        assert!(!layouts.contains_key("untouched"));
        assert_eq!(layouts["bridge_md"].total_bits(), 16);
    }
}
