//! The solver wrapper (§4.3): translates an [`AllConstraints`] bag into the
//! nine constraint families over one declared variable per field, runs
//! conflict pruning on copack hints, then asks the oracle to solve.

use crate::expr::{BoolExpr, BvExpr};
use crate::oracle::{CheckResult, SolverOracle};
use flexpack_ir::{AllConstraints, ErrorSink, FieldDatabase, FieldId, FlexpackError};
use indexmap::{IndexMap, IndexSet};

/// One repack target: a struct name and the flexible fields being laid out
/// for it.
#[derive(Clone, Debug)]
pub struct TargetSpec {
    pub name: String,
    pub fields: Vec<FieldId>,
}

fn target_upper_bound(fields: &[FieldId], db: &impl FieldDatabase) -> u32 {
    fields
        .iter()
        .filter_map(|f| db.field(*f))
        .map(|f| u32::from(f.effective_width_bits()))
        .sum::<u32>()
        .max(1)
}

/// `v1`'s byte-interval and `v2`'s byte-interval do not intersect, given bit
/// widths `w1`/`w2`. Used for solitary (vs. every other field), no-split
/// keep-out, and no-pack — all three are the same byte-disjointness shape
/// (§3's `NoPackConstraint` invariant), so one helper covers all of them
/// instead of hand-writing the two "next byte / one after" disjuncts §4.3
/// point 5 describes for the straddling case.
fn byte_disjoint(v1: BvExpr, w1: u16, v2: BvExpr, w2: u16) -> BoolExpr {
    let start1 = v1.clone().div_const(8);
    let end1 = v1.plus(i64::from(w1) - 1).div_const(8);
    let start2 = v2.clone().div_const(8);
    let end2 = v2.plus(i64::from(w2) - 1).div_const(8);
    BoolExpr::Or(vec![BoolExpr::Lt(end1, start2), BoolExpr::Lt(end2, start1)])
}

fn nonoverlap(v1: BvExpr, w1: u16, v2: BvExpr, w2: u16) -> BoolExpr {
    BoolExpr::Or(vec![
        BoolExpr::Ge(v2.clone().minus(v1.clone()), BvExpr::konst(i64::from(w1))),
        BoolExpr::Ge(v1.minus(v2), BvExpr::konst(i64::from(w2))),
    ])
}

struct NameGen(u64);
impl NameGen {
    fn next(&mut self, prefix: &str) -> String {
        self.0 += 1;
        format!("{prefix}_{}", self.0)
    }
}

/// Solve every target in one oracle session, emitting the nine constraint
/// families and running copack conflict pruning before the final check.
///
/// # Errors
/// Returns [`FlexpackError::Unsat`] if the combined problem (after pruning)
/// has no satisfying assignment.
pub fn solve_all(
    targets: &[TargetSpec],
    db: &impl FieldDatabase,
    constraints: &AllConstraints,
    oracle: &mut impl SolverOracle,
    sink: &mut ErrorSink,
) -> Result<IndexMap<String, IndexMap<FieldId, u32>>, FlexpackError> {
    let mut names = NameGen(0);
    let mut active: Vec<String> = Vec::new();
    let mut declared: IndexSet<FieldId> = IndexSet::new();

    for target in targets {
        let upper = target_upper_bound(&target.fields, db);
        for &f in &target.fields {
            oracle.declare_var(f, upper);
            declared.insert(f);
        }

        // Point 2: alignment.
        for &f in &target.fields {
            if let Some(align) = db.field(f).and_then(|field| field.alignment) {
                let name = names.next("align");
                oracle.add(
                    &name,
                    BoolExpr::Eq(BvExpr::var(f).mod_const(8), BvExpr::konst(i64::from(align.value))),
                );
                active.push(name);
                oracle.minimize(BvExpr::var(f));
            }
        }

        // Point 3: pairwise non-overlap.
        let mut nonoverlap_by_field: IndexMap<FieldId, Vec<String>> = IndexMap::new();
        for i in 0..target.fields.len() {
            for j in (i + 1)..target.fields.len() {
                let (f1, f2) = (target.fields[i], target.fields[j]);
                let (Some(w1), Some(w2)) = (
                    db.field(f1).map(|f| f.size),
                    db.field(f2).map(|f| f.size),
                ) else {
                    continue;
                };
                let name = names.next("nonoverlap");
                oracle.add(&name, nonoverlap(BvExpr::var(f1), w1, BvExpr::var(f2), w2));
                active.push(name.clone());
                nonoverlap_by_field.entry(f1).or_default().push(name.clone());
                nonoverlap_by_field.entry(f2).or_default().push(name);
            }
        }

        // Point 4: copack, with per-field conflict pruning. The isolation
        // check includes each field's already-established non-overlap facts
        // alongside its copack hints — pure byte-equalities never conflict
        // among themselves, so without the bit-capacity facts this check
        // could never find anything to prune.
        if let Some(pairs) = constraints.copack.get(&target.name) {
            let mut per_field: IndexMap<FieldId, Vec<String>> = IndexMap::new();
            let mut candidates = Vec::new();
            for pair in pairs {
                let name = names.next("copack");
                oracle.add(
                    &name,
                    BoolExpr::Eq(
                        BvExpr::var(pair.first).div_const(8),
                        BvExpr::var(pair.second).div_const(8),
                    ),
                );
                per_field.entry(pair.first).or_default().push(name.clone());
                per_field.entry(pair.second).or_default().push(name.clone());
                candidates.push(name);
            }
            let mut dropped: IndexSet<String> = IndexSet::new();
            for (field, copack_names) in &per_field {
                if copack_names.len() < 2 {
                    continue;
                }
                let mut probe = copack_names.clone();
                if let Some(extra) = nonoverlap_by_field.get(field) {
                    probe.extend(extra.iter().cloned());
                }
                if oracle.check_assuming(&probe) == CheckResult::Unsat {
                    sink.push(FlexpackError::ConfigWarning(format!(
                        "dropping incompatible copack hints for field {field} in target {}",
                        target.name
                    )));
                    dropped.extend(copack_names.iter().cloned());
                }
            }
            active.extend(candidates.into_iter().filter(|n| !dropped.contains(n)));
        }

        // Point 5: solitary.
        for (&f1, _) in &constraints.solitary {
            if !target.fields.contains(&f1) {
                continue;
            }
            let Some(w1) = db.field(f1).map(|f| f.size) else {
                continue;
            };
            for &f2 in &target.fields {
                if f2 == f1 {
                    continue;
                }
                let Some(w2) = db.field(f2).map(|f| f.size) else {
                    continue;
                };
                let name = names.next("solitary");
                oracle.add(&name, byte_disjoint(BvExpr::var(f1), w1, BvExpr::var(f2), w2));
                active.push(name);
            }
        }

        // Points 6/7: deparsed-to-TM and no-split containment, generalised
        // to "start and end fall in the same container_size-bit block" per
        // the `NoSplitConstraint` invariant (§3), which subsumes both the
        // <=8-bit and (8,16]-bit worked formulas in §4.3.
        for &f in &target.fields {
            let Some(field) = db.field(f) else { continue };
            if field.size <= 8 && constraints.deparsed_to_tm.iter().any(|d| d.field == f) {
                let name = names.next("deparsed_tm");
                oracle.add(
                    &name,
                    BoolExpr::Eq(
                        BvExpr::var(f).div_const(8),
                        BvExpr::var(f).plus(i64::from(field.size) - 1).div_const(8),
                    ),
                );
                active.push(name);
            }
            if let Some(ns) = constraints.no_split.get(&f) {
                let cs_bits = u32::from(ns.container_size.bits());
                let name = names.next("no_split_contain");
                oracle.add(
                    &name,
                    BoolExpr::Eq(
                        BvExpr::var(f).div_const(cs_bits),
                        BvExpr::var(f).plus(i64::from(field.size) - 1).div_const(cs_bits),
                    ),
                );
                active.push(name);
                for &f2 in &target.fields {
                    if f2 == f {
                        continue;
                    }
                    let Some(w2) = db.field(f2).map(|fd| fd.size) else {
                        continue;
                    };
                    let name2 = names.next("no_split_keepout");
                    #[allow(clippy::cast_possible_truncation)]
                    oracle.add(
                        &name2,
                        byte_disjoint(BvExpr::var(f), cs_bits as u16, BvExpr::var(f2), w2),
                    );
                    active.push(name2);
                }
            }
        }

        // Point 8: no-pack.
        for pair in &constraints.no_pack {
            let (a, b) = (pair.pair.0, pair.pair.1);
            if !target.fields.contains(&a) || !target.fields.contains(&b) {
                continue;
            }
            let (Some(w1), Some(w2)) = (db.field(a).map(|f| f.size), db.field(b).map(|f| f.size)) else {
                continue;
            };
            let name = names.next("no_pack");
            oracle.add(&name, byte_disjoint(BvExpr::var(a), w1, BvExpr::var(b), w2));
            active.push(name);
        }
    }

    // Point 9: mutual alignment, once across every target.
    for m in &constraints.mutual_alignment {
        let (a, b) = (m.pair.0, m.pair.1);
        if !declared.contains(&a) || !declared.contains(&b) {
            continue;
        }
        let name = names.next("mutual_align");
        oracle.add(
            &name,
            BoolExpr::Eq(BvExpr::var(a).mod_const(8), BvExpr::var(b).mod_const(8)),
        );
        active.push(name);
    }

    match oracle.check_assuming(&active) {
        CheckResult::Sat => {
            let model = oracle
                .model()
                .ok_or_else(|| FlexpackError::Internal("solver reported SAT with no model".into()))?;
            let mut per_target = IndexMap::new();
            for target in targets {
                let offsets: IndexMap<FieldId, u32> = target
                    .fields
                    .iter()
                    .filter_map(|f| model.get(f).map(|v| (*f, *v)))
                    .collect();
                per_target.insert(target.name.clone(), offsets);
            }
            Ok(per_target)
        }
        CheckResult::Unsat => Err(FlexpackError::Unsat {
            target: targets.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(","),
            core: oracle.unsat_core().join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceOracle;
    use flexpack_ir::{Alignment, ConstraintReason, Field, FieldId as Fid, FieldKind, FieldPair, Gress, InMemoryFieldDb};

    #[test]
    fn two_unaligned_fields_solve_without_overlap() {
        let mut db = InMemoryFieldDb::new();
        let a = db.insert(Field::new(Fid(0), "a", Gress::Ingress, 4, FieldKind::Metadata));
        let b = db.insert(Field::new(Fid(0), "b", Gress::Ingress, 6, FieldKind::Metadata));
        let constraints = AllConstraints::new();
        let targets = vec![TargetSpec { name: "hdr".into(), fields: vec![a, b] }];
        let mut oracle = ReferenceOracle::new();
        let mut sink = ErrorSink::new();
        let result = solve_all(&targets, &db, &constraints, &mut oracle, &mut sink).unwrap();
        let offsets = &result["hdr"];
        let (oa, ob) = (offsets[&a], offsets[&b]);
        assert!(oa.abs_diff(ob) >= 4 || ob.abs_diff(oa) >= 6);
    }

    #[test]
    fn alignment_constraint_is_respected() {
        let mut db = InMemoryFieldDb::new();
        let mut f = Field::new(Fid(0), "f", Gress::Ingress, 4, FieldKind::Metadata);
        f.alignment = Some(Alignment::new(3, ConstraintReason::BRIDGE));
        let f = db.insert(f);
        let constraints = AllConstraints::new();
        let targets = vec![TargetSpec { name: "hdr".into(), fields: vec![f] }];
        let mut oracle = ReferenceOracle::new();
        let mut sink = ErrorSink::new();
        let result = solve_all(&targets, &db, &constraints, &mut oracle, &mut sink).unwrap();
        assert_eq!(result["hdr"][&f] % 8, 3);
    }

    #[test]
    fn no_pack_pair_lands_in_distinct_bytes() {
        let mut db = InMemoryFieldDb::new();
        let a = db.insert(Field::new(Fid(0), "a", Gress::Ingress, 4, FieldKind::Metadata));
        let b = db.insert(Field::new(Fid(0), "b", Gress::Ingress, 4, FieldKind::Metadata));
        let mut constraints = AllConstraints::new();
        constraints.add_no_pack(FieldPair::new(a, b), ConstraintReason::PRAGMA);
        let targets = vec![TargetSpec { name: "hdr".into(), fields: vec![a, b] }];
        let mut oracle = ReferenceOracle::new();
        let mut sink = ErrorSink::new();
        let result = solve_all(&targets, &db, &constraints, &mut oracle, &mut sink).unwrap();
        let offsets = &result["hdr"];
        assert_ne!(offsets[&a] / 8, offsets[&b] / 8);
    }

    #[test]
    fn incompatible_copack_triangle_is_pruned_not_fatal() {
        let mut db = InMemoryFieldDb::new();
        let a = db.insert(Field::new(Fid(0), "a", Gress::Ingress, 8, FieldKind::Metadata));
        let b = db.insert(Field::new(Fid(0), "b", Gress::Ingress, 8, FieldKind::Metadata));
        let c = db.insert(Field::new(Fid(0), "c", Gress::Ingress, 8, FieldKind::Metadata));
        let mut constraints = AllConstraints::new();
        constraints.add_copack("hdr", a, b);
        // a 8-bit field can only ever share a byte with itself; pairing it
        // with two distinct 8-bit fields in the same byte is infeasible,
        // forcing the pruning pass to drop at least one hint.
        constraints.add_copack("hdr", a, c);
        constraints.add_no_pack(FieldPair::new(b, c), ConstraintReason::PRAGMA);
        let targets = vec![TargetSpec { name: "hdr".into(), fields: vec![a, b, c] }];
        let mut oracle = ReferenceOracle::new();
        let mut sink = ErrorSink::new();
        let result = solve_all(&targets, &db, &constraints, &mut oracle, &mut sink);
        assert!(result.is_ok());
        assert!(!sink.entries().is_empty());
    }
}
