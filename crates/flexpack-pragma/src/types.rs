//! Typed pragma records, one variant per row of the grammar table in §6.

use flexpack_ir::FieldId;

/// Which container kind `pa_container_type` pins a field to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    Normal,
    Mocha,
    Dark,
}

/// One entry of a `pa_byte_pack` sequence, in source declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BytePackEntry {
    Field(FieldId),
    Pad(u8),
}

/// How a field relates to the deparser-zero optimization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeparserZeroMode {
    /// `pa_deparser_zero`: explicitly mark as a candidate.
    Mark,
    /// `not_parsed`: exclude because the field is never parsed.
    NotParsed,
    /// `not_deparsed`: exclude because the field is never deparsed.
    NotDeparsed,
    /// `pa_disable_deparse_0_optimization`: disable globally for this field.
    Disable,
}

/// A validated pragma, ready to be applied to the field database / alias map
/// / constraint bag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pragma {
    Alias {
        source: FieldId,
        dest: FieldId,
    },
    NoOverlay {
        fields: Vec<FieldId>,
    },
    MutuallyExclusive {
        fields: Vec<FieldId>,
    },
    ContainerSize {
        field: FieldId,
        sizes: Vec<u8>,
    },
    ContainerType {
        field: FieldId,
        kind: ContainerKind,
    },
    NoInit {
        field: FieldId,
    },
    Solitary {
        field: FieldId,
    },
    Atomic {
        field: FieldId,
    },
    NoPack {
        fields: Vec<FieldId>,
    },
    BytePack {
        entries: Vec<BytePackEntry>,
    },
    DeparserZero {
        field: FieldId,
        mode: DeparserZeroMode,
    },
}
