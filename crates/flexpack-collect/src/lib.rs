//! Bridge discovery and constraint synthesis over the typed program IR.
//!
//! This crate is pure analysis: it only reads [`flexpack_ir::ProgramIr`] and
//! the external [`flexpack_ir::ActionConstraintsOracle`], and writes facts
//! into an [`flexpack_ir::AllConstraints`] bag plus per-field alignment on
//! the [`flexpack_ir::FieldDatabase`]. It never touches layout or rewrite —
//! those are `flexpack-solver`'s and `flexpack-rewrite`'s jobs.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod align;
pub mod bridge;
pub mod related;
pub mod synth;

pub use bridge::{egress_bridge_candidates, ingress_bridge_aliases, parser_extract_pairs, BridgeContext};
pub use related::{r_all, r_copack, r_down, r_up, shares_header_byte};
pub use synth::synthesize_all;

use flexpack_ir::{ActionConstraintsOracle, AliasMap, AllConstraints, Field, FieldDatabase, FieldId, ProgramIr};

/// Run bridge discovery and every synthesis rule over one synthetic
/// pipeline's worth of IR (§4.6 step 3), filing copack constraints under
/// `target`. Flexible fields are discovered by scanning `db` for the
/// `FLEXIBLE` flag; the driver is responsible for having populated `db` with
/// exactly the fields relevant to this synthetic pipeline before calling.
pub fn collect(
    ir: &ProgramIr,
    db: &mut impl FieldDatabase,
    aliases: &AliasMap,
    oracle: &impl ActionConstraintsOracle,
    target: &str,
    constraints: &mut AllConstraints,
) {
    let ctx = BridgeContext::discover(ir, db, aliases);
    let flexible: Vec<FieldId> = db
        .all_ids()
        .into_iter()
        .filter(|&id| db.field(id).is_some_and(Field::is_flexible))
        .collect();
    tracing::debug!(count = flexible.len(), target, "synthesizing constraints for flexible fields");
    synth::synthesize_all(&flexible, ir, db, oracle, &ctx, target, constraints);
}
