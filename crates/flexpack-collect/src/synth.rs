//! Constraint synthesis (§4.2, the seven primitive rules).

use crate::bridge::BridgeContext;
use crate::related::{r_all, r_copack, shares_header_byte};
use flexpack_ir::{
    ActionConstraintsOracle, AllConstraints, ConstraintReason, ContainerSize, FieldDatabase,
    FieldFlags, FieldId, FieldKind, FieldPair, ProgramIr,
};
use indexmap::IndexSet;

/// Emit the alignment candidate / mutual-alignment rule for one flexible
/// field: non-flexible packet relatives with a set alignment become
/// candidates on `f`; flexible relatives with no alignment yet become mutual
/// alignment constraints.
pub fn synthesize_alignment(
    f: FieldId,
    related: &IndexSet<FieldId>,
    db: &impl FieldDatabase,
    constraints: &mut AllConstraints,
) {
    for &g in related {
        let Some(gf) = db.field(g) else { continue };
        if matches!(gf.kind, FieldKind::Packet) && !gf.is_flexible() {
            if let Some(align) = gf.alignment {
                constraints.add_alignment_candidate(flexpack_ir::AlignmentConstraint {
                    field: f,
                    value: align.value,
                    reason: align.reason,
                    required_container_size: None,
                });
            }
        } else if gf.is_flexible() && gf.alignment.is_none() {
            constraints.add_mutual_alignment(FieldPair::new(f, g), ConstraintReason::ARCH);
        }
    }
}

/// Must-pack (§4.2 rule 2): for the unordered pair `(f1, f2)`, if some action
/// both reads the pair and writes a byte-sharing pair of their non-bridged
/// relatives, emit a copack constraint keyed under `target`.
pub fn synthesize_must_pack(
    f1: FieldId,
    f2: FieldId,
    related1: &IndexSet<FieldId>,
    related2: &IndexSet<FieldId>,
    ir: &ProgramIr,
    db: &impl FieldDatabase,
    oracle: &impl ActionConstraintsOracle,
    target: &str,
    constraints: &mut AllConstraints,
) {
    let common_reads: IndexSet<String> = oracle
        .actions_reading(f1)
        .into_iter()
        .collect::<IndexSet<_>>()
        .intersection(&oracle.actions_reading(f2).into_iter().collect())
        .cloned()
        .collect();
    if common_reads.is_empty() {
        return;
    }
    for &g1 in related1 {
        if db.field(g1).is_some_and(|f| f.flags.contains(FieldFlags::BRIDGED)) {
            continue;
        }
        for &g2 in related2 {
            if db.field(g2).is_some_and(|f| f.flags.contains(FieldFlags::BRIDGED)) {
                continue;
            }
            let common_writes: IndexSet<String> = oracle
                .actions_writing(g1)
                .into_iter()
                .collect::<IndexSet<_>>()
                .intersection(&oracle.actions_writing(g2).into_iter().collect())
                .cloned()
                .collect();
            if common_writes.is_empty() {
                continue;
            }
            if common_reads.intersection(&common_writes).next().is_some()
                && shares_header_byte(g1, g2, ir, db)
            {
                constraints.add_copack(target, f1, f2);
                return;
            }
        }
    }
}

/// No-pack (intrinsic), (digest use): if any related field is intrinsic /
/// digest-used, mark `f` no-pack with every other flexible field in
/// `all_flexible`.
pub fn synthesize_no_pack_whole_set(
    f: FieldId,
    related: &IndexSet<FieldId>,
    all_flexible: &[FieldId],
    db: &impl FieldDatabase,
    constraints: &mut AllConstraints,
) {
    let f_digest_used = db.field(f).is_some_and(|field| field.flags.contains(FieldFlags::DIGEST_USED));
    let any_intrinsic = related.iter().any(|&g| crate::bridge::is_intrinsic_packet(g, db));
    let any_digest_used = f_digest_used
        || related
            .iter()
            .any(|&g| db.field(g).is_some_and(|field| field.flags.contains(FieldFlags::DIGEST_USED)));

    if !any_intrinsic && !any_digest_used {
        return;
    }
    for &other in all_flexible {
        if other == f {
            continue;
        }
        let reason = if any_intrinsic {
            ConstraintReason::INTRINSIC
        } else {
            ConstraintReason::DIGEST
        };
        constraints.add_no_pack(FieldPair::new(f, other), reason);
    }
}

/// No-pack (action-data constant) and (speciality-read): both rules key off
/// pairwise shared write actions between `f` and every other flexible field.
pub fn synthesize_no_pack_pairwise(
    f: FieldId,
    all_flexible: &[FieldId],
    oracle: &impl ActionConstraintsOracle,
    constraints: &mut AllConstraints,
) {
    let f_writes: IndexSet<String> = oracle.actions_writing(f).into_iter().collect();
    let f_speciality = oracle.has_speciality_reads(f);
    for &g in all_flexible {
        if g == f {
            continue;
        }
        let g_writes: IndexSet<String> = oracle.actions_writing(g).into_iter().collect();
        let shared: Vec<&String> = f_writes.intersection(&g_writes).collect();
        if shared.is_empty() {
            continue;
        }
        if f_speciality {
            constraints.add_no_pack(FieldPair::new(f, g), ConstraintReason::ALU);
        }
        for action in shared {
            let f_const = oracle.written_by_ad_constant(f, action);
            let g_const = oracle.written_by_ad_constant(g, action);
            if f_const != g_const {
                constraints.add_no_pack(FieldPair::new(f, g), ConstraintReason::ALU);
            }
        }
    }
}

/// No-split propagation (§4.2 rule 7): if any related or copack-related
/// field has the no-split flag, propagate it to `f` with a container size
/// sized to the largest triggering field (rounded up to 8/16/32).
pub fn synthesize_no_split(
    f: FieldId,
    related: &IndexSet<FieldId>,
    copack_related: &IndexSet<FieldId>,
    db: &impl FieldDatabase,
    constraints: &mut AllConstraints,
) {
    let triggers: Vec<FieldId> = related
        .iter()
        .chain(copack_related.iter())
        .copied()
        .filter(|&g| db.field(g).is_some_and(flexpack_ir::Field::is_no_split))
        .collect();
    if triggers.is_empty() {
        return;
    }
    let f_size = db.field(f).map_or(0, |field| field.size);
    let max_size = triggers
        .iter()
        .filter_map(|&g| db.field(g).map(|field| field.size))
        .chain(std::iter::once(f_size))
        .max()
        .unwrap_or(f_size);
    if let Some(cs) = ContainerSize::smallest_containing(max_size) {
        constraints.mark_no_split(f, cs);
    }
}

/// Run every per-field rule for one flexible field `f`, given its
/// precomputed related-field sets.
#[allow(clippy::too_many_arguments)]
pub fn synthesize_for_field(
    f: FieldId,
    all_flexible: &[FieldId],
    ir: &ProgramIr,
    db: &impl FieldDatabase,
    oracle: &impl ActionConstraintsOracle,
    ctx: &BridgeContext,
    target: &str,
    constraints: &mut AllConstraints,
) {
    let related = r_all(f, db, oracle, ctx);
    let copack_related = r_copack(f, ir, db, oracle, ctx);

    synthesize_alignment(f, &related, db, constraints);
    synthesize_no_pack_whole_set(f, &related, all_flexible, db, constraints);
    synthesize_no_pack_pairwise(f, all_flexible, oracle, constraints);
    synthesize_no_split(f, &related, &copack_related, db, constraints);
}

/// Run the whole-program synthesis pass: per-field rules for every flexible
/// field, the pairwise must-pack rule across all flexible pairs, then
/// collapse alignment candidates via [`crate::align::apply_alignment_choices`].
pub fn synthesize_all(
    all_flexible: &[FieldId],
    ir: &ProgramIr,
    db: &mut impl FieldDatabase,
    oracle: &impl ActionConstraintsOracle,
    ctx: &BridgeContext,
    target: &str,
    constraints: &mut AllConstraints,
) {
    for &f in all_flexible {
        synthesize_for_field(f, all_flexible, ir, db, oracle, ctx, target, constraints);
    }
    for (i, &f1) in all_flexible.iter().enumerate() {
        for &f2 in &all_flexible[i + 1..] {
            let r1 = r_all(f1, db, oracle, ctx);
            let r2 = r_all(f2, db, oracle, ctx);
            synthesize_must_pack(f1, f2, &r1, &r2, ir, db, oracle, target, constraints);
        }
    }
    crate::align::apply_alignment_choices(all_flexible.iter().copied(), db, constraints);
}
