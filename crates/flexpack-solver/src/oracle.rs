//! [`SolverOracle`]: the external optimising bit-vector oracle (§4.3,
//! "the wrapper owns an external optimising SMT context"). The concrete
//! backend is a collaborator outside this core's scope; `reference` ships a
//! pure-Rust adapter that implements this trait for tests and the harness.

use crate::expr::{BoolExpr, BvExpr};
use flexpack_ir::FieldId;
use indexmap::IndexMap;

/// Result of a `check`/`check_assuming` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckResult {
    Sat,
    Unsat,
}

/// A named, optimising bit-vector satisfiability oracle.
///
/// Assertions are named so the wrapper can re-check with a subset of
/// tracking assertions and extract an unsat core (§4.3: "it re-checks with
/// tracking assertions, extracts an unsatisfiable core").
pub trait SolverOracle {
    /// Declare a fresh variable ranging over `[0, upper_bound)`.
    fn declare_var(&mut self, field: FieldId, upper_bound: u32);

    /// Add a named assertion, always active for plain [`Self::check`].
    fn add(&mut self, name: &str, expr: BoolExpr);

    /// Register a term to minimise on a satisfying model. Later calls refine
    /// (the wrapper may minimise several variables across a target; the
    /// reference oracle treats this as lexicographic priority in call order).
    fn minimize(&mut self, expr: BvExpr);

    /// Check satisfiability of every assertion added via [`Self::add`].
    fn check(&mut self) -> CheckResult;

    /// Check satisfiability of only the named assertions in `names`, used
    /// for conflict pruning and unsat-core narrowing.
    fn check_assuming(&mut self, names: &[String]) -> CheckResult;

    /// The satisfying model from the most recent `Sat` check, one value per
    /// declared variable.
    fn model(&self) -> Option<IndexMap<FieldId, u32>>;

    /// The names of assertions implicated in the most recent `Unsat` result.
    fn unsat_core(&self) -> Vec<String>;
}
