//! Reason bitsets shared by every boolean/union-accumulated constraint kind.
//!
//! The original backend tracks *why* a constraint fired (so diagnostics can
//! explain a layout decision) by OR-ing reason bits into the constraint
//! instead of storing a single boolean. We keep that shape: each constraint
//! record carries a [`ConstraintReason`] that accumulates via `|=`.

use bitflags::bitflags;

bitflags! {
    /// Union-accumulated reason for an [`crate::constraints::AlignmentConstraint`],
    /// [`crate::constraints::SolitaryConstraint`], or [`crate::constraints::NoSplitConstraint`].
    ///
    /// `reason == NONE` means the constraint is absent; any other value means
    /// present, with the set bits explaining every contributing source.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
    pub struct ConstraintReason: u16 {
        const NONE          = 0;
        const PARSER        = 1 << 0;
        const DEPARSER      = 1 << 1;
        const BRIDGE        = 1 << 2;
        const TERNARY_MATCH = 1 << 3;
        const DIGEST        = 1 << 4;
        const INTRINSIC     = 1 << 5;
        const BYTE_PACK     = 1 << 6;
        const ALU           = 1 << 7;
        const CHECKSUM      = 1 << 8;
        const ARCH          = 1 << 9;
        const PRAGMA        = 1 << 10;
        const CONFLICT      = 1 << 11;
    }
}

impl ConstraintReason {
    /// True once any reason bit has been recorded.
    #[must_use]
    pub fn is_present(self) -> bool {
        !self.is_empty()
    }

    /// Rank used by the alignment tie-break: intrinsic beats bridge, both
    /// beat a plain parser/deparser/ternary-match origin. Higher is stronger.
    #[must_use]
    pub fn rank(self) -> u8 {
        if self.contains(Self::INTRINSIC) {
            3
        } else if self.contains(Self::BRIDGE) {
            2
        } else if self.is_empty() {
            0
        } else {
            1
        }
    }
}
