//! Rank function (§4.2, last paragraph): collapse the per-field alignment
//! candidate set to the one value written back onto the field entity.

use flexpack_ir::{Alignment, AlignmentConstraint, AllConstraints, FieldDatabase, FieldId};

/// Pick the winning candidate: highest [`flexpack_ir::ConstraintReason::rank`]
/// wins; ties broken by the smallest numeric value, so the choice is
/// deterministic regardless of collection order.
#[must_use]
pub fn choose_alignment(candidates: &[AlignmentConstraint]) -> Option<Alignment> {
    candidates
        .iter()
        .max_by(|a, b| {
            a.reason
                .rank()
                .cmp(&b.reason.rank())
                .then(b.value.cmp(&a.value))
        })
        .map(|c| Alignment::new(c.value, c.reason))
}

/// For every field in `fields`, collapse its alignment candidates and write
/// the result (or `None`, erasing any prior alignment) onto the field
/// database.
pub fn apply_alignment_choices(
    fields: impl IntoIterator<Item = FieldId>,
    db: &mut impl FieldDatabase,
    constraints: &AllConstraints,
) {
    for f in fields {
        let chosen = constraints
            .alignment_candidates
            .get(&f)
            .and_then(|cands| choose_alignment(cands));
        if let Some(field) = db.field_mut(f) {
            field.alignment = chosen;
        }
    }
}
