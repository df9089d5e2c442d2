//! flexpack-harness
//!
//! Runs the full bridged/flexible header packing pipeline end to end on a
//! small synthetic program (no real P4 frontend involved) and prints the
//! resulting layout. Useful as a smoke test and as a worked example of how
//! the driver wires the other crates together.
//!
//! Usage:
//!   cargo run -p flexpack-harness -- --pipe p0

use std::time::Instant;

use anyhow::Result;
use flexpack_driver::{run_collection_phase, run_rewrite_phase, StaticProgramSource};
use flexpack_ir::{
    ActionConstraintsOracle, ErrorSink, Field, FieldFlags, FieldId, FieldKind, FieldSlice,
    FlexpackOptions, Gress, InMemoryFieldDb, MethodCall, MethodKind, ProgramIr, StructLikeType,
};
use flexpack_solver::ReferenceOracle;

struct NoopActionOracle;

impl ActionConstraintsOracle for NoopActionOracle {
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

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

/// One `bridge_md` header with three `@flexible` fields of uneven width, a
/// bridge from egress back to ingress, and one `pa_no_pack` pragma keeping
/// two of them apart.
fn synthetic_program(db: &mut InMemoryFieldDb, pipe: &str) -> ProgramIr {
    let mut f1 = Field::new(FieldId(0), "f1", Gress::Ingress, 5, FieldKind::Metadata);
    f1.flags |= FieldFlags::FLEXIBLE;
    let f1 = db.insert(f1);

    let mut f2 = Field::new(FieldId(0), "f2", Gress::Ingress, 11, FieldKind::Metadata);
    f2.flags |= FieldFlags::FLEXIBLE;
    let f2 = db.insert(f2);

    let mut f3 = Field::new(FieldId(0), "f3", Gress::Ingress, 4, FieldKind::Metadata);
    f3.flags |= FieldFlags::FLEXIBLE;
    let f3 = db.insert(f3);

    let mut ir = ProgramIr::new();
    ir.struct_types.push(StructLikeType {
        name: "bridge_md".into(),
        gress: Gress::Ingress,
        fields: vec![f1, f2, f3],
        fixed_width_bits: None,
    });
    ir.method_calls.push(MethodCall {
        pipe: pipe.to_string(),
        gress: Gress::Egress,
        type_name: "bridge_md".into(),
        method: MethodKind::Emit,
    });
    ir.method_calls.push(MethodCall {
        pipe: pipe.to_string(),
        gress: Gress::Ingress,
        type_name: "bridge_md".into(),
        method: MethodKind::Extract,
    });
    ir
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::try_init().ok();

    let pipe = parse_flag("pipe", "p0");
    let mut db = InMemoryFieldDb::new();
    let ir = synthetic_program(&mut db, &pipe);

    let mut options = FlexpackOptions::new();
    options.restrict_pipelines.push(pipe.clone());

    let oracle = NoopActionOracle;
    let mut solver = ReferenceOracle::new();
    let mut sink = ErrorSink::new();

    let t0 = Instant::now();
    let layouts = run_collection_phase(&ir, &options, &mut db, &oracle, &mut solver, &mut sink)
        .map_err(|e| anyhow::anyhow!("collection phase failed: {e}"))?;
    let t_collect = t0.elapsed();

    let source = StaticProgramSource(ir);
    let t0 = Instant::now();
    let rewritten = run_rewrite_phase(&source, &layouts, &mut db);
    let t_rewrite = t0.elapsed();

    println!("pipe={pipe} collect+solve={t_collect:?} rewrite={t_rewrite:?}");
    for warning in sink.warnings() {
        println!("  warning: {warning}");
    }

    for (name, layout) in &layouts {
        println!("layout {name} ({} bits):", layout.total_bits());
        for entry in &layout.entries {
            match entry.field_id() {
                Some(field) => println!("  field {field} width={}", entry.width()),
                None => println!("  padding width={}", entry.width()),
            }
        }
    }

    let rewritten_type = rewritten
        .struct_type("bridge_md")
        .expect("bridge_md survives rewrite");
    println!(
        "rewritten bridge_md field list: {:?}",
        rewritten_type.fields
    );

    Ok(())
}
