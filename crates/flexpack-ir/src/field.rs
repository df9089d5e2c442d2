//! [`Field`]: a single named bit range in some header/metadata/digest instance.

use crate::reason::ConstraintReason;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle into a [`crate::fielddb::FieldDatabase`]. Stable for the
/// lifetime of one driver invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Which thread a field belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gress {
    Ingress,
    Egress,
    Ghost,
}

impl Gress {
    /// The thread a bridged field's counterpart lives in; `Ghost` has no
    /// opposite and maps to itself (ghost fields are not bridged).
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Gress::Ingress => Gress::Egress,
            Gress::Egress => Gress::Ingress,
            Gress::Ghost => Gress::Ghost,
        }
    }
}

impl fmt::Display for Gress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gress::Ingress => "ingress",
            Gress::Egress => "egress",
            Gress::Ghost => "ghost",
        };
        write!(f, "{s}")
    }
}

/// Coarse classification of a field; implies subsets of [`FieldFlags`] are
/// nonsensical (e.g. a `Pov` field is never `PACKET`, a `Padding` field is
/// always synthetic and never user-declared).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Packet,
    Metadata,
    Pov,
    Padding,
}

bitflags! {
    /// Per-field boolean attributes. Several are set by constraint
    /// collectors as a *result* of synthesis (e.g. `SOLITARY`, `NO_SPLIT`),
    /// not only declared by the frontend.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FieldFlags: u16 {
        const FLEXIBLE       = 1 << 0;
        const BRIDGED        = 1 << 1;
        const PADDING        = 1 << 2;
        const OVERLAYABLE    = 1 << 3;
        const SOLITARY       = 1 << 4;
        const NO_SPLIT       = 1 << 5;
        const DEPARSED_TO_TM = 1 << 6;
        const INTRINSIC      = 1 << 7;
        const DIGEST_USED    = 1 << 8;
        const NO_OVERLAY     = 1 << 9;
        const NO_INIT        = 1 << 10;
        /// Candidate for the deparser-zero optimization (`pa_deparser_zero`).
        const DEPARSER_ZERO_CANDIDATE = 1 << 11;
        /// Explicitly excluded from deparser-zero (`not_parsed`/`not_deparsed`).
        const DEPARSER_ZERO_EXCLUDED  = 1 << 12;
    }
}

/// A hardware container width, one of the three sizes the target PHV exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContainerSize {
    Bits8,
    Bits16,
    Bits32,
}

impl ContainerSize {
    #[must_use]
    pub const fn bits(self) -> u16 {
        match self {
            ContainerSize::Bits8 => 8,
            ContainerSize::Bits16 => 16,
            ContainerSize::Bits32 => 32,
        }
    }

    /// Smallest container size (of 8/16/32) that can hold `bits`, rounding up.
    ///
    /// # Errors
    /// Returns `None` if `bits` exceeds 32.
    #[must_use]
    pub fn smallest_containing(bits: u16) -> Option<Self> {
        if bits <= 8 {
            Some(ContainerSize::Bits8)
        } else if bits <= 16 {
            Some(ContainerSize::Bits16)
        } else if bits <= 32 {
            Some(ContainerSize::Bits32)
        } else {
            None
        }
    }
}

/// The little-endian bit offset within a byte a field's LSB is pinned to,
/// plus the union of reasons that pinned it there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    pub value: u8,
    pub reason: ConstraintReason,
}

impl Alignment {
    #[must_use]
    pub fn new(value: u8, reason: ConstraintReason) -> Self {
        debug_assert!(value < 8, "alignment value must be in [0,7]");
        Self {
            value: value & 0x7,
            reason,
        }
    }
}

/// A single named bit range in some header/metadata/digest instance.
///
/// Fields are born during IR construction and owned by the program IR for
/// the whole compilation; this core only observes and annotates them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub gress: Gress,
    /// Size in bits. Immutable once constructed.
    pub size: u16,
    /// Declared byte offset within the field's *own* header/metadata type
    /// (not to be confused with the repacked-layout offset the solver
    /// produces for `@flexible` fields).
    pub offset_in_parent: u16,
    pub kind: FieldKind,
    pub flags: FieldFlags,
    pub alignment: Option<Alignment>,
    pub no_split_container_size: Option<ContainerSize>,
}

impl Field {
    #[must_use]
    pub fn new(id: FieldId, name: impl Into<String>, gress: Gress, size: u16, kind: FieldKind) -> Self {
        let flags = match kind {
            FieldKind::Pov => FieldFlags::empty(),
            FieldKind::Padding => FieldFlags::PADDING | FieldFlags::OVERLAYABLE,
            FieldKind::Packet | FieldKind::Metadata => FieldFlags::empty(),
        };
        Self {
            id,
            name: name.into(),
            gress,
            size,
            offset_in_parent: 0,
            kind,
            flags,
            alignment: None,
            no_split_container_size: None,
        }
    }

    #[must_use]
    pub fn is_flexible(&self) -> bool {
        self.flags.contains(FieldFlags::FLEXIBLE)
    }

    #[must_use]
    pub fn is_solitary(&self) -> bool {
        self.flags.contains(FieldFlags::SOLITARY)
    }

    #[must_use]
    pub fn is_no_split(&self) -> bool {
        self.flags.contains(FieldFlags::NO_SPLIT)
    }

    #[must_use]
    pub fn is_intrinsic(&self) -> bool {
        self.flags.contains(FieldFlags::INTRINSIC)
    }

    #[must_use]
    pub fn is_packet(&self) -> bool {
        matches!(self.kind, FieldKind::Packet)
    }

    /// A byte-aligned no-split container size to use for the solver's
    /// search-space upper bound: the explicit hint if set, else the
    /// field's own size rounded up to a byte.
    #[must_use]
    pub fn effective_width_bits(&self) -> u16 {
        if let Some(cs) = self.no_split_container_size {
            cs.bits()
        } else {
            let rem = self.size % 8;
            if rem == 0 {
                self.size
            } else {
                self.size + (8 - rem)
            }
        }
    }
}
