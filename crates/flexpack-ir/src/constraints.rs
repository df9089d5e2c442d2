//! Primitive constraint kinds synthesized by the collectors (§4.2) and
//! consumed by the solver wrapper (§4.3). `AllConstraints` is the per-run bag
//! that accumulates them; it is created empty, grown monotonically by the
//! collectors, handed to the solver, then discarded.

use crate::field::{ContainerSize, FieldId};
use crate::reason::ConstraintReason;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// An unordered pair of fields, normalized so `(a, b)` and `(b, a)` compare
/// and hash identically. Used for every symmetric relation in this module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPair(pub FieldId, pub FieldId);

impl FieldPair {
    #[must_use]
    pub fn new(a: FieldId, b: FieldId) -> Self {
        if a.0 <= b.0 {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// Required little-endian bit offset within a byte for a field.
///
/// Reasons union-accumulate; setting a *conflicting* `value` after one is
/// already recorded is a [`crate::error::FlexpackError::ConstraintConflict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentConstraint {
    pub field: FieldId,
    pub value: u8,
    pub reason: ConstraintReason,
    pub required_container_size: Option<ContainerSize>,
}

/// Symmetric: `align(a) mod 8 == align(b) mod 8`, exact value left to the
/// solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutualAlignmentConstraint {
    pub pair: FieldPair,
    pub reason: ConstraintReason,
}

/// Ordered pair: both fields must land in the same byte of the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CopackConstraint {
    pub first: FieldId,
    pub second: FieldId,
}

/// Symmetric: the two fields must land in distinct bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoPackConstraint {
    pub pair: FieldPair,
    pub reason: ConstraintReason,
}

/// A field may share a byte only with overlaid/mutually-exclusive fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolitaryConstraint {
    pub field: FieldId,
    pub reason: ConstraintReason,
}

/// A field must fit inside a single container of the indicated size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoSplitConstraint {
    pub field: FieldId,
    pub container_size: ContainerSize,
}

/// A field must occupy the lowest bits of its container (`size <= 8`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeparsedToTmConstraint {
    pub field: FieldId,
}

/// The mutable per-run bag of every constraint fact discovered by the
/// collectors, keyed where relevant by the repack target (struct name) so
/// the solver wrapper (one call per target, plus one cross-target mutual
/// alignment pass) can look things up without re-scanning.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AllConstraints {
    /// Candidate alignments per field; the rank function (see
    /// `flexpack-collect::align::choose_alignment`) collapses these to the
    /// one written back onto the field.
    pub alignment_candidates: IndexMap<FieldId, Vec<AlignmentConstraint>>,
    pub mutual_alignment: IndexSet<MutualAlignmentConstraint>,
    /// Keyed by repack-target name: copack pairs discovered within that
    /// target only.
    pub copack: IndexMap<String, IndexSet<CopackConstraint>>,
    pub no_pack: IndexSet<NoPackConstraint>,
    pub solitary: IndexMap<FieldId, SolitaryConstraint>,
    pub no_split: IndexMap<FieldId, NoSplitConstraint>,
    pub deparsed_to_tm: IndexSet<DeparsedToTmConstraint>,
}

impl AllConstraints {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_alignment_candidate(&mut self, c: AlignmentConstraint) {
        self.alignment_candidates.entry(c.field).or_default().push(c);
    }

    pub fn add_mutual_alignment(&mut self, pair: FieldPair, reason: ConstraintReason) {
        match self.mutual_alignment.iter().position(|m| m.pair == pair) {
            Some(idx) => {
                let mut existing = self.mutual_alignment[idx];
                existing.reason |= reason;
                self.mutual_alignment.shift_remove_index(idx);
                self.mutual_alignment.insert(existing);
            }
            None => {
                self.mutual_alignment
                    .insert(MutualAlignmentConstraint { pair, reason });
            }
        }
    }

    pub fn add_copack(&mut self, target: &str, first: FieldId, second: FieldId) {
        self.copack
            .entry(target.to_string())
            .or_default()
            .insert(CopackConstraint { first, second });
    }

    pub fn add_no_pack(&mut self, pair: FieldPair, reason: ConstraintReason) {
        match self.no_pack.iter().position(|n| n.pair == pair) {
            Some(idx) => {
                let mut existing = self.no_pack[idx];
                existing.reason |= reason;
                self.no_pack.shift_remove_index(idx);
                self.no_pack.insert(existing);
            }
            None => {
                self.no_pack.insert(NoPackConstraint { pair, reason });
            }
        }
    }

    pub fn mark_solitary(&mut self, field: FieldId, reason: ConstraintReason) {
        self.solitary
            .entry(field)
            .and_modify(|s| s.reason |= reason)
            .or_insert(SolitaryConstraint { field, reason });
    }

    pub fn mark_no_split(&mut self, field: FieldId, container_size: ContainerSize) {
        self.no_split
            .entry(field)
            .and_modify(|s| {
                if container_size > s.container_size {
                    s.container_size = container_size;
                }
            })
            .or_insert(NoSplitConstraint { field, container_size });
    }

    pub fn mark_deparsed_to_tm(&mut self, field: FieldId) {
        self.deparsed_to_tm.insert(DeparsedToTmConstraint { field });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_pair_normalizes_order() {
        let a = FieldId(3);
        let b = FieldId(1);
        assert_eq!(FieldPair::new(a, b), FieldPair::new(b, a));
    }

    #[test]
    fn mutual_alignment_reasons_union() {
        let mut all = AllConstraints::new();
        let pair = FieldPair::new(FieldId(0), FieldId(1));
        all.add_mutual_alignment(pair, ConstraintReason::PARSER);
        all.add_mutual_alignment(pair, ConstraintReason::DIGEST);
        let entry = all.mutual_alignment.iter().find(|m| m.pair == pair).unwrap();
        assert!(entry.reason.contains(ConstraintReason::PARSER));
        assert!(entry.reason.contains(ConstraintReason::DIGEST));
    }

    #[test]
    fn no_split_keeps_largest_container() {
        use crate::field::ContainerSize;
        let mut all = AllConstraints::new();
        all.mark_no_split(FieldId(0), ContainerSize::Bits8);
        all.mark_no_split(FieldId(0), ContainerSize::Bits16);
        assert_eq!(all.no_split[&FieldId(0)].container_size, ContainerSize::Bits16);
    }
}
