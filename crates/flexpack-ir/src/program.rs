//! Typed facing IR: the shape of program data this core consumes from the
//! (external, out of scope) P4 frontend. Modelled as plain enums/structs so
//! collectors can walk it with explicit folds instead of a visitor
//! hierarchy (§9 design note).

use crate::field::{FieldId, Gress};
use crate::slice::FieldSlice;
use serde::{Deserialize, Serialize};

/// The right-hand side of a parser extract `dest := rval`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractSource {
    /// `dest := saved(src)`: a previously-extracted field feeds `dest`.
    Saved(FieldId),
    /// `dest := packet_rval`: bytes come straight off the wire.
    Packet,
    /// `dest := const_rval`: a compile-time constant.
    Const(u64),
}

/// One `dest := rval` extract statement inside a parser state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extract {
    pub dest: FieldId,
    pub source: ExtractSource,
}

/// A single parser state and the extracts it performs, in program order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParserState {
    pub name: String,
    pub gress: Gress,
    pub extracts: Vec<Extract>,
}

/// One MAU action operand: either a field slice or an action-data source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOperand {
    Slice(FieldSlice),
    /// Action-data source; `is_const` distinguishes a compile-time constant
    /// from a runtime action-data parameter.
    ActionData { is_const: bool },
    /// A "speciality" read per the external action-constraints oracle (e.g.
    /// reading a checksum engine result, a meter/counter value, ...).
    Speciality,
}

/// One instruction within a MAU action: `dest = op(sources...)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub dest: FieldSlice,
    pub sources: Vec<ActionOperand>,
}

/// A MAU action: a flat list of instructions executed together.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MauAction {
    pub name: String,
    pub gress: Gress,
    pub instructions: Vec<Instruction>,
}

/// Which deparser/parser method a block invoked on a header/metadata type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    /// A parser `extract<T>()` call.
    Extract,
    /// A deparser `emit<T>()` call.
    Emit,
}

/// One `emit`/`extract` method call recorded while walking parser/deparser
/// blocks (§4.6 step 1): `(pipe, gress, type, method)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCall {
    pub pipe: String,
    pub gress: Gress,
    pub type_name: String,
    pub method: MethodKind,
}

/// One entry of a digest field-list's source expression sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigestEntry {
    Source(FieldId),
    ConstZero,
}

/// A digest field-list (e.g. `mirror`, `resubmit`, a user-defined digest).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DigestFieldList {
    pub name: String,
    /// The struct-like type this field-list's entries are typed against.
    pub type_name: String,
    pub gress: Gress,
    /// `true` for the `mirror` digest specifically: entry 0 (the session id)
    /// is pinned and never reordered or replaced by padding (§4.5).
    pub is_mirror: bool,
    pub entries: Vec<DigestEntry>,
}

/// A header/metadata/digest struct-like type: an ordered field list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructLikeType {
    pub name: String,
    pub gress: Gress,
    /// Declaration order, as the frontend produced it.
    pub fields: Vec<FieldId>,
    /// `Some(bits)` for resubmit-like headers with a device-fixed width,
    /// independent of the solver (§4.5 "fixed-size headers").
    pub fixed_width_bits: Option<u16>,
}

/// One field-value pair inside a struct-literal expression
/// (`Type { field: value, ... }`), or the source list of a digest emit call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralValue {
    FieldRef(FieldId),
    ConstZero,
    /// Anything else the frontend can express (arithmetic, casts, ...); we
    /// only need to preserve and reorder these, never interpret them.
    Opaque(String),
}

/// A struct-literal expression of some struct-like type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructLiteral {
    pub type_name: String,
    pub gress: Gress,
    /// `(field, value)` pairs in declaration order matching the literal's
    /// *original* type.
    pub values: Vec<(FieldId, LiteralValue)>,
}

/// The full typed program IR this core operates over: one synthetic
/// pipeline's worth of parser states, actions, method calls, digests, and
/// struct types, or the whole program for the rewrite driver.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProgramIr {
    pub parser_states: Vec<ParserState>,
    pub actions: Vec<MauAction>,
    pub method_calls: Vec<MethodCall>,
    pub digest_lists: Vec<DigestFieldList>,
    pub struct_types: Vec<StructLikeType>,
    pub struct_literals: Vec<StructLiteral>,
}

impl ProgramIr {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn struct_type(&self, name: &str) -> Option<&StructLikeType> {
        self.struct_types.iter().find(|t| t.name == name)
    }

    #[must_use]
    pub fn struct_type_mut(&mut self, name: &str) -> Option<&mut StructLikeType> {
        self.struct_types.iter_mut().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_type_lookup_by_name() {
        let mut ir = ProgramIr::new();
        ir.struct_types.push(StructLikeType {
            name: "bridge_md".into(),
            gress: Gress::Ingress,
            fields: vec![FieldId(0)],
            fixed_width_bits: None,
        });
        assert!(ir.struct_type("bridge_md").is_some());
        assert!(ir.struct_type("nope").is_none());
    }
}
