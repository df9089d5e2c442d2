//! The related-fields walk (§4.2): `R(f)`, `R_down(f)`, `R_up(f)`, and the
//! copack projection `R_copack(f)`.

use crate::bridge::BridgeContext;
use flexpack_ir::{ActionConstraintsOracle, FieldDatabase, FieldId, FieldKind, FieldSlice, ProgramIr};
use indexmap::IndexSet;

fn twin_of(f: FieldId, db: &impl FieldDatabase) -> Option<FieldId> {
    let field = db.field(f)?;
    db.by_name(field.gress.opposite(), &field.name)
}

/// Fields reached by following ALU-write destinations, forward bridge edges
/// (orig -> bridged), and the symmetric parser-extract/twin relations (which
/// have no inherent direction and so appear in both walks).
fn down_edges(
    f: FieldId,
    db: &impl FieldDatabase,
    oracle: &impl ActionConstraintsOracle,
    ctx: &BridgeContext,
) -> Vec<FieldId> {
    let mut out = Vec::new();
    if let Some(field) = db.field(f) {
        let whole = FieldSlice::whole(f, field.size);
        out.extend(oracle.slices_destinations(f, whole).into_iter().map(|s| s.field));
    }
    for (dest, orig) in &ctx.ingress_bridge {
        if *orig == f {
            out.push(*dest);
        }
    }
    for (dest, src) in &ctx.egress_bridge {
        if *src == f {
            out.push(*dest);
        }
    }
    if let Some(peers) = ctx.parser_extract_pairs.get(&f) {
        out.extend(peers.iter().copied());
    }
    out.extend(twin_of(f, db));
    out
}

/// Fields reached by following ALU-read sources, backward bridge edges
/// (bridged -> orig), and the same symmetric relations as [`down_edges`].
fn up_edges(
    f: FieldId,
    db: &impl FieldDatabase,
    oracle: &impl ActionConstraintsOracle,
    ctx: &BridgeContext,
) -> Vec<FieldId> {
    let mut out = Vec::new();
    if let Some(field) = db.field(f) {
        let whole = FieldSlice::whole(f, field.size);
        out.extend(oracle.slices_sources(f, whole).into_iter().map(|s| s.field));
    }
    if let Some(orig) = ctx.ingress_bridge.get(&f) {
        out.push(*orig);
    }
    if let Some(src) = ctx.egress_bridge.get(&f) {
        out.push(*src);
    }
    if let Some(peers) = ctx.parser_extract_pairs.get(&f) {
        out.extend(peers.iter().copied());
    }
    out.extend(twin_of(f, db));
    out
}

fn bfs(
    start: FieldId,
    mut neighbors: impl FnMut(FieldId) -> Vec<FieldId>,
) -> IndexSet<FieldId> {
    let mut visited = IndexSet::new();
    let mut queue = std::collections::VecDeque::new();
    visited.insert(start);
    queue.push_back(start);
    while let Some(cur) = queue.pop_front() {
        for next in neighbors(cur) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited.shift_remove(&start);
    visited
}

/// The full related-fields set: breadth-first over the union of `down` and
/// `up` edges from every visited node.
#[must_use]
pub fn r_all(
    f: FieldId,
    db: &impl FieldDatabase,
    oracle: &impl ActionConstraintsOracle,
    ctx: &BridgeContext,
) -> IndexSet<FieldId> {
    bfs(f, |cur| {
        let mut edges = down_edges(cur, db, oracle, ctx);
        edges.extend(up_edges(cur, db, oracle, ctx));
        edges
    })
}

/// Reaching fields only: breadth-first over `down` edges.
#[must_use]
pub fn r_down(
    f: FieldId,
    db: &impl FieldDatabase,
    oracle: &impl ActionConstraintsOracle,
    ctx: &BridgeContext,
) -> IndexSet<FieldId> {
    bfs(f, |cur| down_edges(cur, db, oracle, ctx))
}

/// Sourcing fields only: breadth-first over `up` edges.
#[must_use]
pub fn r_up(
    f: FieldId,
    db: &impl FieldDatabase,
    oracle: &impl ActionConstraintsOracle,
    ctx: &BridgeContext,
) -> IndexSet<FieldId> {
    bfs(f, |cur| up_edges(cur, db, oracle, ctx))
}

fn byte_interval(offset_bits: u16, size_bits: u16) -> (u16, u16) {
    let lo = offset_bits / 8;
    let hi = (offset_bits + size_bits.saturating_sub(1)) / 8;
    (lo, hi)
}

fn intervals_overlap(a: (u16, u16), b: (u16, u16)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

/// Whether `a` and `b` are declared in the same struct type and their byte
/// intervals (derived from `offset_in_parent`/`size`) overlap.
#[must_use]
pub fn shares_header_byte(a: FieldId, b: FieldId, ir: &ProgramIr, db: &impl FieldDatabase) -> bool {
    let Some(owner) = ir.struct_types.iter().find(|t| t.fields.contains(&a)) else {
        return false;
    };
    if !owner.fields.contains(&b) {
        return false;
    }
    let (Some(fa), Some(fb)) = (db.field(a), db.field(b)) else {
        return false;
    };
    intervals_overlap(
        byte_interval(fa.offset_in_parent, fa.size),
        byte_interval(fb.offset_in_parent, fb.size),
    )
}

/// Every other field in `field`'s own declared struct type whose byte
/// interval (derived from `offset_in_parent`/`size`) overlaps `field`'s.
fn fields_sharing_header_byte(field: FieldId, ir: &ProgramIr, db: &impl FieldDatabase) -> Vec<FieldId> {
    let Some(owner) = ir.struct_types.iter().find(|t| t.fields.contains(&field)) else {
        return Vec::new();
    };
    let Some(this) = db.field(field) else {
        return Vec::new();
    };
    let this_iv = byte_interval(this.offset_in_parent, this.size);
    owner
        .fields
        .iter()
        .copied()
        .filter(|&other| {
            if other == field {
                return false;
            }
            db.field(other).is_some_and(|o| {
                intervals_overlap(this_iv, byte_interval(o.offset_in_parent, o.size))
            })
        })
        .collect()
}

/// `R_copack(f)`: project `R(f)` to packet fields of other headers, then for
/// each such field union `R` over every field sharing its header byte.
#[must_use]
pub fn r_copack(
    f: FieldId,
    ir: &ProgramIr,
    db: &impl FieldDatabase,
    oracle: &impl ActionConstraintsOracle,
    ctx: &BridgeContext,
) -> IndexSet<FieldId> {
    let related = r_all(f, db, oracle, ctx);
    let mut out = IndexSet::new();
    for g in related.iter().copied().filter(|&g| {
        db.field(g).is_some_and(|field| matches!(field.kind, FieldKind::Packet))
    }) {
        for sharer in fields_sharing_header_byte(g, ir, db) {
            out.extend(r_all(sharer, db, oracle, ctx));
            out.insert(sharer);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexpack_ir::{Field, FieldSlice as Slice, Gress, InMemoryFieldDb, StructLikeType};

    struct NullOracle;
    impl ActionConstraintsOracle for NullOracle {
        fn actions_writing(&self, _f: FieldId) -> Vec<String> {
            Vec::new()
        }
        fn actions_reading(&self, _f: FieldId) -> Vec<String> {
            Vec::new()
        }
        fn slices_sources(&self, _f: FieldId, _slice: Slice) -> Vec<Slice> {
            Vec::new()
        }
        fn slices_destinations(&self, _f: FieldId, _slice: Slice) -> Vec<Slice> {
            Vec::new()
        }
        fn has_speciality_reads(&self, _f: FieldId) -> bool {
            false
        }
        fn written_by_ad_constant(&self, _f: FieldId, _action: &str) -> bool {
            false
        }
    }

    #[test]
    fn twin_fields_are_related_both_ways() {
        let mut db = InMemoryFieldDb::new();
        let a = db.insert(Field::new(
            FieldId(0),
            "x",
            Gress::Ingress,
            8,
            flexpack_ir::FieldKind::Metadata,
        ));
        let b = db.insert(Field::new(
            FieldId(0),
            "x",
            Gress::Egress,
            8,
            flexpack_ir::FieldKind::Metadata,
        ));
        let ctx = BridgeContext::default();
        let oracle = NullOracle;
        assert!(r_all(a, &db, &oracle, &ctx).contains(&b));
        assert!(r_all(b, &db, &oracle, &ctx).contains(&a));
    }

    #[test]
    fn copack_unions_byte_sharing_fields() {
        let mut db = InMemoryFieldDb::new();
        let flex = db.insert(Field::new(
            FieldId(0),
            "flex",
            Gress::Ingress,
            4,
            flexpack_ir::FieldKind::Metadata,
        ));
        let pkt = db.insert(Field::new(
            FieldId(0),
            "pkt",
            Gress::Ingress,
            4,
            FieldKind::Packet,
        ));
        let mut sharer = Field::new(FieldId(0), "sharer", Gress::Ingress, 4, FieldKind::Packet);
        sharer.offset_in_parent = 4;
        let sharer = db.insert(sharer);
        db.field_mut(pkt).unwrap().offset_in_parent = 0;

        let mut ctx = BridgeContext::default();
        ctx.parser_extract_pairs.entry(flex).or_default().insert(pkt);
        ctx.parser_extract_pairs.entry(pkt).or_default().insert(flex);

        let mut ir = ProgramIr::new();
        ir.struct_types.push(StructLikeType {
            name: "hdr".into(),
            gress: Gress::Ingress,
            fields: vec![pkt, sharer],
            fixed_width_bits: None,
        });

        let oracle = NullOracle;
        let result = r_copack(flex, &ir, &db, &oracle, &ctx);
        assert!(result.contains(&sharer));
    }
}
