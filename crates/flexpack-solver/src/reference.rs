//! A pure-Rust reference [`SolverOracle`]: ascending-order backtracking
//! search with forward checking.
//!
//! This stands in for a real SMT backend. It is not a global optimiser —
//! `spec.md`'s own Non-goals note the minimisation objective is "a local
//! heuristic" — so this adapter approximates it by trying each variable's
//! smallest feasible value first and accepting the first full satisfying
//! assignment found, rather than exhaustively searching for a global
//! minimum. Intended for tests and the harness; a production build would
//! swap this for a real bit-vector solver binding behind the same trait.

use crate::expr::BoolExpr;
use crate::oracle::{CheckResult, SolverOracle};
use flexpack_ir::FieldId;
use indexmap::{IndexMap, IndexSet};

#[derive(Clone, Debug, Default)]
pub struct ReferenceOracle {
    bounds: IndexMap<FieldId, u32>,
    order: Vec<FieldId>,
    assertions: IndexMap<String, BoolExpr>,
    minimize_terms: Vec<crate::expr::BvExpr>,
    model: Option<IndexMap<FieldId, i64>>,
    last_core: Vec<String>,
}

impl ReferenceOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn solve(&self, active_names: &[String]) -> Option<IndexMap<FieldId, i64>> {
        let active: Vec<&BoolExpr> = active_names
            .iter()
            .filter_map(|n| self.assertions.get(n))
            .collect();
        let mut assignment = IndexMap::new();
        let mut bound = IndexSet::new();
        if Self::backtrack(0, &self.order, &self.bounds, &active, &mut assignment, &mut bound) {
            Some(assignment)
        } else {
            None
        }
    }

    fn backtrack(
        idx: usize,
        order: &[FieldId],
        bounds: &IndexMap<FieldId, u32>,
        active: &[&BoolExpr],
        assignment: &mut IndexMap<FieldId, i64>,
        bound: &mut IndexSet<FieldId>,
    ) -> bool {
        if idx == order.len() {
            return active.iter().all(|e| e.eval(assignment));
        }
        let f = order[idx];
        let ub = bounds.get(&f).copied().unwrap_or(1);
        for v in 0..ub {
            assignment.insert(f, i64::from(v));
            bound.insert(f);
            if Self::partials_hold(active, assignment, bound)
                && Self::backtrack(idx + 1, order, bounds, active, assignment, bound)
            {
                return true;
            }
            bound.shift_remove(&f);
            assignment.shift_remove(&f);
        }
        false
    }

    /// Check every assertion whose variables are already fully bound;
    /// assertions still mentioning an unbound variable are skipped (they are
    /// re-checked once their last variable lands).
    fn partials_hold(
        active: &[&BoolExpr],
        assignment: &IndexMap<FieldId, i64>,
        bound: &IndexSet<FieldId>,
    ) -> bool {
        active.iter().all(|e| {
            let mut vars = Vec::new();
            e.vars(&mut vars);
            if vars.iter().all(|v| bound.contains(v)) {
                e.eval(assignment)
            } else {
                true
            }
        })
    }
}

impl SolverOracle for ReferenceOracle {
    fn declare_var(&mut self, field: FieldId, upper_bound: u32) {
        if !self.bounds.contains_key(&field) {
            self.order.push(field);
        }
        self.bounds.insert(field, upper_bound.max(1));
    }

    fn add(&mut self, name: &str, expr: BoolExpr) {
        self.assertions.insert(name.to_string(), expr);
    }

    fn minimize(&mut self, expr: crate::expr::BvExpr) {
        self.minimize_terms.push(expr);
    }

    fn check(&mut self) -> CheckResult {
        let names: Vec<String> = self.assertions.keys().cloned().collect();
        self.check_assuming(&names)
    }

    fn check_assuming(&mut self, names: &[String]) -> CheckResult {
        match self.solve(names) {
            Some(model) => {
                self.model = Some(model);
                self.last_core.clear();
                CheckResult::Sat
            }
            None => {
                self.model = None;
                self.last_core = names.to_vec();
                CheckResult::Unsat
            }
        }
    }

    fn model(&self) -> Option<IndexMap<FieldId, u32>> {
        self.model
            .as_ref()
            .map(|m| m.iter().map(|(f, v)| (*f, *v as u32)).collect())
    }

    fn unsat_core(&self) -> Vec<String> {
        self.last_core.clone()
    }
}
