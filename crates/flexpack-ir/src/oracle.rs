//! External-collaborator traits (§6): the action-constraints oracle and the
//! PHV-field database. Both are owned and populated outside this core (by
//! the frontend / MAU analysis passes); this crate only specifies the shape
//! of the query surface collectors and the driver depend on, plus one
//! reference in-memory implementation of the field database for tests and
//! the harness.

use crate::field::{ContainerSize, Field, FieldId, FieldKind, Gress};
use crate::slice::FieldSlice;
use indexmap::{IndexMap, IndexSet};

/// Queries over MAU action read/write/operand structure, independent of any
/// particular action representation. Implemented by the external MAU
/// analysis pass; this core never inspects action bodies directly.
pub trait ActionConstraintsOracle {
    /// Actions that write any slice of `f`.
    fn actions_writing(&self, f: FieldId) -> Vec<String>;
    /// Actions that read any slice of `f`.
    fn actions_reading(&self, f: FieldId) -> Vec<String>;
    /// For a write to `slice`, the set of fields whose slices feed it as an
    /// ALU source.
    fn slices_sources(&self, f: FieldId, slice: FieldSlice) -> Vec<FieldSlice>;
    /// For a read of `slice`, the set of fields whose slices it is written
    /// into as an ALU destination.
    fn slices_destinations(&self, f: FieldId, slice: FieldSlice) -> Vec<FieldSlice>;
    /// Whether `f` has a "speciality" read (checksum engine, meter/counter
    /// result, or other non-ALU consumer).
    fn has_speciality_reads(&self, f: FieldId) -> bool;
    /// Whether `f` is written by a compile-time action-data constant in
    /// `action`.
    fn written_by_ad_constant(&self, f: FieldId, action: &str) -> bool;
}

/// Lookup + mutable-constraint-state surface over the PHV field universe.
///
/// Collectors mutate per-field flags (alignment, solitary, no-split) and the
/// no-pack matrix through this trait under single-threaded discipline (§5);
/// there is no interior locking because the whole pipeline runs on one call
/// stack.
pub trait FieldDatabase {
    fn field(&self, id: FieldId) -> Option<&Field>;
    fn field_mut(&mut self, id: FieldId) -> Option<&mut Field>;
    fn by_name(&self, gress: Gress, name: &str) -> Option<FieldId>;
    fn ids_in_gress(&self, gress: Gress) -> Vec<FieldId>;
    fn all_ids(&self) -> Vec<FieldId>;

    /// The symmetric no-pack matrix: every recorded `(a, b)` pair that must
    /// not share a byte.
    fn no_pack_pairs(&self) -> &IndexSet<(FieldId, FieldId)>;
    fn add_no_pack_pair(&mut self, a: FieldId, b: FieldId);
    fn is_no_pack(&self, a: FieldId, b: FieldId) -> bool;

    /// Allocate a fresh synthetic padding field of `size` bits, used by the
    /// rewrite transform (§4.5) when a [`crate::layout::LayoutEntry::Padding`]
    /// needs a real field id to put in a struct's field list. Always
    /// `padding` and `overlayable` (see [`Field::new`]'s `FieldKind::Padding`
    /// default flags).
    fn insert_padding(&mut self, gress: Gress, size: u16, name: &str) -> FieldId;
}

/// Reference, in-process [`FieldDatabase`] implementation: a flat table
/// keyed by [`FieldId`] plus a `(gress, name) -> id` index. This stands in
/// for the frontend's real PHV info when running tests or the harness.
#[derive(Clone, Debug, Default)]
pub struct InMemoryFieldDb {
    fields: IndexMap<FieldId, Field>,
    by_name: IndexMap<(Gress, String), FieldId>,
    no_pack: IndexSet<(FieldId, FieldId)>,
    next_id: u32,
}

impl InMemoryFieldDb {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh field and insert it; returns its id.
    pub fn insert(&mut self, mut field: Field) -> FieldId {
        let id = FieldId(self.next_id);
        self.next_id += 1;
        field.id = id;
        self.by_name
            .insert((field.gress, field.name.clone()), id);
        self.fields.insert(id, field);
        id
    }

    #[must_use]
    pub fn container_size_hint(&self, id: FieldId) -> Option<ContainerSize> {
        self.fields.get(&id).and_then(|f| f.no_split_container_size)
    }

    fn normalize(a: FieldId, b: FieldId) -> (FieldId, FieldId) {
        if a.0 <= b.0 {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl FieldDatabase for InMemoryFieldDb {
    fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(&id)
    }

    fn field_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.fields.get_mut(&id)
    }

    fn by_name(&self, gress: Gress, name: &str) -> Option<FieldId> {
        self.by_name.get(&(gress, name.to_string())).copied()
    }

    fn ids_in_gress(&self, gress: Gress) -> Vec<FieldId> {
        self.fields
            .values()
            .filter(|f| f.gress == gress)
            .map(|f| f.id)
            .collect()
    }

    fn all_ids(&self) -> Vec<FieldId> {
        self.fields.keys().copied().collect()
    }

    fn no_pack_pairs(&self) -> &IndexSet<(FieldId, FieldId)> {
        &self.no_pack
    }

    fn add_no_pack_pair(&mut self, a: FieldId, b: FieldId) {
        self.no_pack.insert(Self::normalize(a, b));
    }

    fn is_no_pack(&self, a: FieldId, b: FieldId) -> bool {
        self.no_pack.contains(&Self::normalize(a, b))
    }

    fn insert_padding(&mut self, gress: Gress, size: u16, name: &str) -> FieldId {
        self.insert(Field::new(FieldId(0), name, gress, size, FieldKind::Padding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_ids_and_indexes_by_name() {
        let mut db = InMemoryFieldDb::new();
        let id = db.insert(Field::new(FieldId(0), "f1", Gress::Ingress, 8, FieldKind::Metadata));
        assert_eq!(db.by_name(Gress::Ingress, "f1"), Some(id));
        assert!(db.field(id).is_some());
    }

    #[test]
    fn no_pack_matrix_is_symmetric() {
        let mut db = InMemoryFieldDb::new();
        let a = db.insert(Field::new(FieldId(0), "a", Gress::Ingress, 8, FieldKind::Metadata));
        let b = db.insert(Field::new(FieldId(0), "b", Gress::Ingress, 8, FieldKind::Metadata));
        db.add_no_pack_pair(a, b);
        assert!(db.is_no_pack(a, b));
        assert!(db.is_no_pack(b, a));
    }

    #[test]
    fn insert_padding_is_flagged_padding_and_overlayable() {
        use crate::field::FieldFlags;
        let mut db = InMemoryFieldDb::new();
        let pad = db.insert_padding(Gress::Ingress, 4, "__pad_hdr_0");
        let field = db.field(pad).unwrap();
        assert_eq!(field.kind, FieldKind::Padding);
        assert!(field.flags.contains(FieldFlags::PADDING));
        assert!(field.flags.contains(FieldFlags::OVERLAYABLE));
    }
}
