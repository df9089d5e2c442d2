//! Per-pipe driver orchestration (§4.6): wires `flexpack-pragma`,
//! `flexpack-collect`, `flexpack-solver`, `flexpack-repack`, and
//! `flexpack-rewrite` together behind the two-phase, re-parse-between-phases
//! sequence §4.6/§5 describe.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod discover;
pub mod run;
pub mod source;

pub use discover::{bridged_type_names, discover_bridge_pairs, BridgePair};
pub use run::{run_collection_phase, run_rewrite_phase};
pub use source::{ProgramSource, StaticProgramSource};
