//! A minimal bit-vector expression AST: just enough to state the nine
//! constraint families of §4.3 without committing to any particular SMT
//! crate's term representation.

use flexpack_ir::FieldId;
use indexmap::IndexMap;

/// An integer-valued term over field offset variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BvExpr {
    Var(FieldId),
    Const(i64),
    Add(Box<BvExpr>, Box<BvExpr>),
    Sub(Box<BvExpr>, Box<BvExpr>),
    /// Integer division by a positive constant.
    DivConst(Box<BvExpr>, u32),
    /// Modulo by a positive constant.
    ModConst(Box<BvExpr>, u32),
}

impl BvExpr {
    #[must_use]
    pub fn var(f: FieldId) -> Self {
        BvExpr::Var(f)
    }

    #[must_use]
    pub fn konst(v: i64) -> Self {
        BvExpr::Const(v)
    }

    #[must_use]
    pub fn plus(self, rhs: impl Into<BvExpr>) -> Self {
        BvExpr::Add(Box::new(self), Box::new(rhs.into()))
    }

    #[must_use]
    pub fn minus(self, rhs: impl Into<BvExpr>) -> Self {
        BvExpr::Sub(Box::new(self), Box::new(rhs.into()))
    }

    #[must_use]
    pub fn div_const(self, d: u32) -> Self {
        BvExpr::DivConst(Box::new(self), d)
    }

    #[must_use]
    pub fn mod_const(self, d: u32) -> Self {
        BvExpr::ModConst(Box::new(self), d)
    }

    /// Evaluate against a full variable assignment.
    ///
    /// # Panics
    /// Panics if a referenced variable is missing from `env` (an internal
    /// invariant: the wrapper never emits an expression over an undeclared
    /// variable).
    #[must_use]
    pub fn eval(&self, env: &IndexMap<FieldId, i64>) -> i64 {
        match self {
            BvExpr::Var(f) => *env.get(f).unwrap_or_else(|| panic!("unbound variable {f}")),
            BvExpr::Const(v) => *v,
            BvExpr::Add(a, b) => a.eval(env) + b.eval(env),
            BvExpr::Sub(a, b) => a.eval(env) - b.eval(env),
            BvExpr::DivConst(a, d) => a.eval(env).div_euclid(i64::from(*d)),
            BvExpr::ModConst(a, d) => a.eval(env).rem_euclid(i64::from(*d)),
        }
    }
}

impl From<i64> for BvExpr {
    fn from(v: i64) -> Self {
        BvExpr::Const(v)
    }
}

impl From<FieldId> for BvExpr {
    fn from(f: FieldId) -> Self {
        BvExpr::Var(f)
    }
}

/// A boolean constraint over [`BvExpr`] terms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoolExpr {
    Eq(BvExpr, BvExpr),
    Lt(BvExpr, BvExpr),
    Le(BvExpr, BvExpr),
    Ge(BvExpr, BvExpr),
    And(Vec<BoolExpr>),
    Or(Vec<BoolExpr>),
}

impl BoolExpr {
    #[must_use]
    pub fn eval(&self, env: &IndexMap<FieldId, i64>) -> bool {
        match self {
            BoolExpr::Eq(a, b) => a.eval(env) == b.eval(env),
            BoolExpr::Lt(a, b) => a.eval(env) < b.eval(env),
            BoolExpr::Le(a, b) => a.eval(env) <= b.eval(env),
            BoolExpr::Ge(a, b) => a.eval(env) >= b.eval(env),
            BoolExpr::And(xs) => xs.iter().all(|x| x.eval(env)),
            BoolExpr::Or(xs) => xs.iter().any(|x| x.eval(env)),
        }
    }

    /// Every field variable this expression mentions, for the reference
    /// oracle's forward-checking search order.
    pub fn vars(&self, out: &mut Vec<FieldId>) {
        fn bv_vars(e: &BvExpr, out: &mut Vec<FieldId>) {
            match e {
                BvExpr::Var(f) => out.push(*f),
                BvExpr::Const(_) => {}
                BvExpr::Add(a, b) | BvExpr::Sub(a, b) => {
                    bv_vars(a, out);
                    bv_vars(b, out);
                }
                BvExpr::DivConst(a, _) | BvExpr::ModConst(a, _) => bv_vars(a, out),
            }
        }
        match self {
            BoolExpr::Eq(a, b) | BoolExpr::Lt(a, b) | BoolExpr::Le(a, b) | BoolExpr::Ge(a, b) => {
                bv_vars(a, out);
                bv_vars(b, out);
            }
            BoolExpr::And(xs) | BoolExpr::Or(xs) => {
                for x in xs {
                    x.vars(out);
                }
            }
        }
    }
}
