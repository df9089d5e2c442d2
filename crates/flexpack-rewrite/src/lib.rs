//! IR rewrite transform (§4.5): given `name → repacked-type`, rewrites every
//! struct-like type, digest-field-list, and struct-literal referring to it.
//!
//! This crate owns no layout-reconstruction logic (`flexpack-repack`'s job)
//! and no traversal-ordering policy across driver invocations
//! (`flexpack-driver`'s); it only applies an already-built
//! [`flexpack_ir::RepackedLayout`] map to one [`flexpack_ir::ProgramIr`].

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod digest;
pub mod literal;
pub mod plan;

pub use digest::rewrite_digest_list;
pub use literal::rewrite_struct_literal;
pub use plan::{build_rewrite_plan, RewritePlan};

use flexpack_ir::{FieldDatabase, FieldId, ProgramIr, RepackedLayout};
use indexmap::IndexMap;

/// Apply every repacked layout in `layouts` to `ir`: rewrite each matching
/// struct-like type's field list, then every digest-field-list and
/// struct-literal that refers to it.
///
/// Struct types, digest-lists, and struct-literals whose name isn't in
/// `layouts` are left untouched.
pub fn rewrite_program(
    ir: &mut ProgramIr,
    layouts: &IndexMap<String, RepackedLayout>,
    db: &mut impl FieldDatabase,
) {
    let mut plans: IndexMap<String, RewritePlan> = IndexMap::new();
    let mut old_fields_by_type: IndexMap<String, Vec<FieldId>> = IndexMap::new();

    for struct_type in &mut ir.struct_types {
        let Some(layout) = layouts.get(&struct_type.name) else {
            continue;
        };
        old_fields_by_type.insert(struct_type.name.clone(), struct_type.fields.clone());
        let plan = build_rewrite_plan(layout, db);
        struct_type.fields = plan.ordered_ids.clone();
        plans.insert(struct_type.name.clone(), plan);
    }

    for list in &mut ir.digest_lists {
        let Some(plan) = plans.get(&list.type_name) else {
            continue;
        };
        let Some(old_fields) = old_fields_by_type.get(&list.type_name) else {
            continue;
        };
        rewrite_digest_list(list, old_fields, plan);
    }

    for lit in &mut ir.struct_literals {
        let Some(plan) = plans.get(&lit.type_name) else {
            continue;
        };
        rewrite_struct_literal(lit, plan);
    }
}
