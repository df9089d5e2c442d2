//! The re-parse boundary between the two drivers (§4.6, §5 ordering
//! guarantee 3): "the IR is re-parsed from the original source so that no
//! intermediate mutation leaks out." Re-parsing a real P4 program is an
//! external-frontend concern; this trait is the seam the rewrite driver
//! calls through instead of reusing the (already-mutated-by-collection)
//! in-memory IR.
use flexpack_ir::ProgramIr;

pub trait ProgramSource {
    /// Produce a fresh [`ProgramIr`], independent of whatever mutations a
    /// prior driver invocation made to a previously-returned one.
    fn reparse(&self) -> ProgramIr;
}

/// A [`ProgramSource`] backed by an in-memory snapshot, cloned on every
/// call. Stands in for a real frontend re-parse in tests and the harness.
#[derive(Clone, Debug)]
pub struct StaticProgramSource(pub ProgramIr);

impl ProgramSource for StaticProgramSource {
    fn reparse(&self) -> ProgramIr {
        self.0.clone()
    }
}
