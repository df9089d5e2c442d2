//! Core data model and external-interface traits for the bridged/flexible
//! header packing core.
//!
//! This crate owns no algorithm: it defines the entities every other crate
//! in the workspace shares ([`field::Field`], [`constraints::AllConstraints`],
//! [`layout::RepackedLayout`], [`alias::AliasMap`]), the typed facing IR
//! ([`program`]) this core consumes, and the external-collaborator traits
//! ([`oracle`]) those collectors and the solver wrapper depend on.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod alias;
pub mod constraints;
pub mod error;
pub mod field;
pub mod layout;
pub mod oracle;
pub mod options;
pub mod program;
pub mod reason;
pub mod slice;

pub use alias::{AliasEntry, AliasMap, AliasOrigin};
pub use constraints::{
    AlignmentConstraint, AllConstraints, CopackConstraint, DeparsedToTmConstraint, FieldPair,
    MutualAlignmentConstraint, NoPackConstraint, NoSplitConstraint, SolitaryConstraint,
};
pub use error::{ErrorSink, FlexpackError, Severity};
pub use field::{Alignment, ContainerSize, Field, FieldFlags, FieldId, FieldKind, Gress};
pub use layout::{LayoutEntry, RepackedLayout};
pub use oracle::{ActionConstraintsOracle, FieldDatabase, InMemoryFieldDb};
pub use options::{FlexpackOptions, RawPragma};
pub use program::{
    ActionOperand, DigestEntry, DigestFieldList, Extract, ExtractSource, Instruction,
    LiteralValue, MauAction, MethodCall, MethodKind, ParserState, ProgramIr, StructLikeType,
    StructLiteral,
};
pub use reason::ConstraintReason;
pub use slice::FieldSlice;
