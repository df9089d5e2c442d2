//! `pa_byte_pack` layout derivation.
//!
//! The pragma "only introduces co-pack constraints within bytes... relative
//! order between bytes is not constrained" (original `pa_byte_pack.cpp`
//! doc-comment): it does not pin an absolute offset, only each field's
//! alignment modulo 8 and which other fields/padding share its byte. We
//! derive both by filling a pseudo-header from its **last** declared entry
//! down to its first (the worked example in SPEC_FULL.md's grounding
//! confirms this direction), accumulating a bit cursor from 0.

use crate::types::BytePackEntry;
use flexpack_ir::{AllConstraints, ConstraintReason, FieldId};

/// One derived fact: a field's low-bit alignment within its byte, and the
/// byte index (within the pseudo-header, 0-based from the LSB end) it falls
/// in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BytePackPlacement {
    pub field: FieldId,
    pub align: u8,
    pub byte_index: u32,
}

/// Apply a `pa_byte_pack` sequence to `constraints`: every field gets an
/// [`flexpack_ir::AlignmentConstraint`] with reason `BYTE_PACK`, and every
/// pair of fields whose placements land in the same pseudo-header byte gets
/// a copack constraint keyed under `target`.
pub fn apply_to_constraints(
    entries: &[BytePackEntry],
    field_width: impl Fn(FieldId) -> u16,
    target: &str,
    constraints: &mut AllConstraints,
) {
    let mut cursor: u32 = 0;
    let mut placements = Vec::new();
    for entry in entries.iter().rev() {
        match entry {
            BytePackEntry::Pad(p) => cursor += u32::from(*p),
            BytePackEntry::Field(field) => {
                placements.push(BytePackPlacement {
                    field: *field,
                    align: (cursor % 8) as u8,
                    byte_index: cursor / 8,
                });
                cursor += u32::from(field_width(*field));
            }
        }
    }

    for p in &placements {
        constraints.add_alignment_candidate(flexpack_ir::AlignmentConstraint {
            field: p.field,
            value: p.align,
            reason: ConstraintReason::BYTE_PACK,
            required_container_size: None,
        });
    }
    for i in 0..placements.len() {
        for j in (i + 1)..placements.len() {
            if placements[i].byte_index == placements[j].byte_index {
                constraints.add_copack(target, placements[i].field, placements[j].field);
            }
        }
    }
}
