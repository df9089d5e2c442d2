//! Digest-field-list rewrite (§4.5): reorders a digest's source expressions
//! to match a repacked type's new field order, inserting constant-zero
//! entries for padding slots. The `mirror` digest's entry 0 (the session id)
//! is never touched.

use crate::plan::RewritePlan;
use flexpack_ir::{DigestEntry, DigestFieldList, FieldId};

/// `old_fields` is the struct-like type's field list *before* rewriting.
/// For a non-`mirror` digest, `digest.entries` is assumed positionally
/// aligned with `old_fields` one-for-one. For `mirror`, `entries[0]` is the
/// session id — a digest-level slot with no corresponding struct field —
/// and `entries[1..]` align with `old_fields`.
pub fn rewrite_digest_list(digest: &mut DigestFieldList, old_fields: &[FieldId], plan: &RewritePlan) {
    let pinned_session = digest.is_mirror && !digest.entries.is_empty();
    let offset = usize::from(pinned_session);
    let mut new_entries = vec![DigestEntry::ConstZero; plan.ordered_ids.len() + offset];

    if pinned_session {
        new_entries[0] = digest.entries[0].clone();
    }

    for (pos, &old_field) in old_fields.iter().enumerate() {
        let Some(entry @ DigestEntry::Source(_)) = digest.entries.get(pos + offset) else {
            continue;
        };
        if let Some(&new_pos) = plan.position_of.get(&old_field) {
            new_entries[new_pos + offset] = entry.clone();
        }
    }

    digest.entries = new_entries;
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexpack_ir::{Gress, LayoutEntry, RepackedLayout};
    use indexmap::{IndexMap, IndexSet};

    fn plan_from(entries: Vec<LayoutEntry>) -> RewritePlan {
        let mut position_of = IndexMap::new();
        let mut padding_positions = IndexSet::new();
        let mut ordered_ids = Vec::new();
        for (idx, e) in entries.iter().enumerate() {
            match e.field_id() {
                Some(f) => {
                    ordered_ids.push(f);
                    position_of.insert(f, idx);
                }
                None => {
                    ordered_ids.push(FieldId(1000 + idx as u32));
                    padding_positions.insert(idx);
                }
            }
        }
        RewritePlan { ordered_ids, position_of, padding_positions }
    }

    #[test]
    fn non_mirror_digest_reorders_and_zero_fills_padding() {
        let a = FieldId(0);
        let b = FieldId(1);
        // Old order: a, b. New layout (MSB-first): padding, b, a.
        let plan = plan_from(vec![
            LayoutEntry::Padding { width: 2 },
            LayoutEntry::Field { field: b, width: 4 },
            LayoutEntry::Field { field: a, width: 4 },
        ]);
        let mut digest = DigestFieldList {
            name: "d".into(),
            type_name: "hdr".into(),
            gress: Gress::Ingress,
            is_mirror: false,
            entries: vec![DigestEntry::Source(a), DigestEntry::Source(b)],
        };
        rewrite_digest_list(&mut digest, &[a, b], &plan);
        assert_eq!(digest.entries[0], DigestEntry::ConstZero);
        assert_eq!(digest.entries[1], DigestEntry::Source(b));
        assert_eq!(digest.entries[2], DigestEntry::Source(a));
    }

    #[test]
    fn mirror_digest_keeps_session_id_pinned_at_zero() {
        let session = FieldId(0);
        let a = FieldId(1);
        // Struct itself only has field `a`; the session id is a digest-only
        // slot with no struct-field counterpart.
        let plan = plan_from(vec![
            LayoutEntry::Padding { width: 4 },
            LayoutEntry::Field { field: a, width: 4 },
        ]);
        let mut digest = DigestFieldList {
            name: "mirror".into(),
            type_name: "hdr".into(),
            gress: Gress::Ingress,
            is_mirror: true,
            entries: vec![DigestEntry::Source(session), DigestEntry::Source(a)],
        };
        rewrite_digest_list(&mut digest, &[a], &plan);
        assert_eq!(digest.entries[0], DigestEntry::Source(session));
        assert_eq!(digest.entries[1], DigestEntry::ConstZero);
        assert_eq!(digest.entries[2], DigestEntry::Source(a));
    }
}
