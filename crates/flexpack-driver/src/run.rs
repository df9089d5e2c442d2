//! Per-pipe driver orchestration (§4.6).
//!
//! Step-by-step: discover bridge uses, synthesize pipelines, collect
//! constraints per target, solve every target in one pass (cross-pipeline
//! conflict pruning falls out of `flexpack-solver` handling every target in
//! one oracle session), reconstruct layouts, pad fixed-size headers.

use crate::discover::{bridged_type_names, discover_bridge_pairs};
use flexpack_collect::collect;
use flexpack_ir::{
    ActionConstraintsOracle, AliasMap, AllConstraints, ErrorSink, Field, FieldDatabase,
    FlexpackError, FlexpackOptions, ProgramIr, RepackedLayout,
};
use flexpack_solver::{solve_all, SolverOracle, TargetSpec};
use indexmap::IndexMap;

/// Run the first driver (§4.6 steps 1-6): discover bridge pairs, collect
/// constraints per target, solve, and build every target's
/// [`RepackedLayout`], including fixed-width headers with no flexible
/// fields at all.
///
/// # Errors
/// Returns [`FlexpackError::Unsat`] if the combined packing problem across
/// every target is infeasible.
pub fn run_collection_phase(
    ir: &ProgramIr,
    options: &FlexpackOptions,
    db: &mut impl FieldDatabase,
    action_oracle: &impl ActionConstraintsOracle,
    solver_oracle: &mut impl SolverOracle,
    sink: &mut ErrorSink,
) -> Result<IndexMap<String, RepackedLayout>, FlexpackError> {
    let pairs = discover_bridge_pairs(&ir.method_calls);
    let bridged_types = bridged_type_names(&pairs);
    for pair in &pairs {
        tracing::debug!(target = %pair.synthetic_pipeline_name(), "discovered bridge use");
    }

    let mut aliases = AliasMap::new();
    let mut constraints = AllConstraints::new();
    let byte_pack_target = bridged_types.first().map_or("", String::as_str);
    flexpack_pragma::apply_all_pragmas(options, db, &mut aliases, &mut constraints, byte_pack_target, sink);

    let mut targets = Vec::new();
    for type_name in &bridged_types {
        let Some(struct_type) = ir.struct_type(type_name) else {
            continue;
        };
        collect(ir, db, &aliases, action_oracle, type_name, &mut constraints);
        let fields: Vec<_> = struct_type
            .fields
            .iter()
            .copied()
            .filter(|&f| db.field(f).is_some_and(Field::is_flexible))
            .collect();
        if !fields.is_empty() {
            targets.push(TargetSpec { name: type_name.clone(), fields });
        }
    }

    let solved = if targets.is_empty() {
        IndexMap::new()
    } else {
        solve_all(&targets, db, &constraints, solver_oracle, sink)?
    };

    let mut layouts = flexpack_repack::build_all_layouts(ir, &solved, db, sink);

    for struct_type in &ir.struct_types {
        if layouts.contains_key(&struct_type.name) {
            continue;
        }
        let Some(fixed_bits) = struct_type.fixed_width_bits else {
            continue;
        };
        let empty = IndexMap::new();
        let mut layout = flexpack_repack::build_repacked_layout(struct_type, &empty, db);
        flexpack_repack::pad_to_fixed_width(&mut layout, fixed_bits, sink);
        layouts.insert(struct_type.name.clone(), layout);
    }

    Ok(layouts)
}

/// Run the second driver (§4.6 step 7): re-parse the program from
/// `source` and apply the rewrite transform using the layouts the first
/// driver produced.
pub fn run_rewrite_phase(
    source: &impl crate::source::ProgramSource,
    layouts: &IndexMap<String, RepackedLayout>,
    db: &mut impl FieldDatabase,
) -> ProgramIr {
    let mut fresh = source.reparse();
    flexpack_rewrite::rewrite_program(&mut fresh, layouts, db);
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticProgramSource;
    use flexpack_ir::{
        Extract, ExtractSource, FieldFlags, FieldId, FieldKind, FieldSlice, Gress,
        InMemoryFieldDb, MethodCall, MethodKind, ParserState, StructLikeType,
    };

    struct NullOracle;
    impl ActionConstraintsOracle for NullOracle {
        fn actions_writing(&self, _f: FieldId) -> Vec<String> {
            Vec::new()
        }
        fn actions_reading(&self, _f: FieldId) -> Vec<String> {
            Vec::new()
        }
        fn slices_sources(&self, _f: FieldId, _slice: FieldSlice) -> Vec<FieldSlice> {
            Vec::new()
        }
        fn slices_destinations(&self, _f: FieldId, _slice: FieldSlice) -> Vec<FieldSlice> {
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
    fn end_to_end_single_bridge_type_produces_a_rewritten_layout() {
        let mut db = InMemoryFieldDb::new();
        let mut a = Field::new(FieldId(0), "a", Gress::Ingress, 4, FieldKind::Metadata);
        a.flags |= FieldFlags::FLEXIBLE;
        let a = db.insert(a);
        let mut b = Field::new(FieldId(0), "b", Gress::Ingress, 6, FieldKind::Metadata);
        b.flags |= FieldFlags::FLEXIBLE;
        let b = db.insert(b);

        let mut ir = ProgramIr::new();
        ir.struct_types.push(StructLikeType {
            name: "bridge_md".into(),
            gress: Gress::Ingress,
            fields: vec![a, b],
            fixed_width_bits: None,
        });
        ir.method_calls.push(MethodCall {
            pipe: "p0".into(),
            gress: Gress::Egress,
            type_name: "bridge_md".into(),
            method: MethodKind::Emit,
        });
        ir.method_calls.push(MethodCall {
            pipe: "p0".into(),
            gress: Gress::Ingress,
            type_name: "bridge_md".into(),
            method: MethodKind::Extract,
        });
        ir.parser_states.push(ParserState {
            name: "start".into(),
            gress: Gress::Ingress,
            extracts: vec![Extract { dest: a, source: ExtractSource::Packet }],
        });

        let options = FlexpackOptions::new();
        let oracle = NullOracle;
        let mut solver = flexpack_solver::ReferenceOracle::new();
        let mut sink = ErrorSink::new();
        let layouts = run_collection_phase(&ir, &options, &mut db, &oracle, &mut solver, &mut sink).unwrap();
        assert!(layouts.contains_key("bridge_md"));
        assert!(layouts["bridge_md"].is_byte_aligned());

        let source = StaticProgramSource(ir);
        let rewritten = run_rewrite_phase(&source, &layouts, &mut db);
        let new_fields = &rewritten.struct_type("bridge_md").unwrap().fields;
        assert_eq!(new_fields.len(), layouts["bridge_md"].entries.len());
    }
}
