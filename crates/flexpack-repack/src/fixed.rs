//! Fixed-size header padding (§4.5/§4.6 step 6): a handful of struct-like
//! types (resubmit-style headers) have a device-fixed width independent of
//! the solver. This pads their already-built layout out to that width
//! rather than routing them through the solver at all.

use flexpack_ir::{ErrorSink, FlexpackError, LayoutEntry, RepackedLayout};

/// Pad `layout` with a trailing [`LayoutEntry::Padding`] so its total width
/// matches `fixed_width_bits`. A no-op if it's already exactly that width.
///
/// Pushes a [`FlexpackError::ConfigWarning`] to `sink` (non-fatal; the
/// layout is returned unpadded) if the declared fields already exceed the
/// fixed width — that's a frontend/user error this core can only report,
/// not repair.
pub fn pad_to_fixed_width(layout: &mut RepackedLayout, fixed_width_bits: u16, sink: &mut ErrorSink) {
    let total = layout.total_bits();
    if total > fixed_width_bits {
        sink.push(FlexpackError::ConfigWarning(format!(
            "fixed-size header {} already occupies {total} bits, exceeding its declared {fixed_width_bits}-bit width",
            layout.type_name
        )));
        return;
    }
    if total < fixed_width_bits {
        layout.entries.push(LayoutEntry::Padding {
            width: fixed_width_bits - total,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexpack_ir::{FieldId, Gress};

    #[test]
    fn pads_short_header_to_fixed_width() {
        let mut layout = RepackedLayout::new(
            "resubmit_hdr",
            Gress::Ingress,
            vec![LayoutEntry::Field { field: FieldId(0), width: 8 }],
        );
        let mut sink = ErrorSink::new();
        pad_to_fixed_width(&mut layout, 32, &mut sink);
        assert_eq!(layout.total_bits(), 32);
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn oversized_header_is_reported_not_truncated() {
        let mut layout = RepackedLayout::new(
            "resubmit_hdr",
            Gress::Ingress,
            vec![LayoutEntry::Field { field: FieldId(0), width: 40 }],
        );
        let mut sink = ErrorSink::new();
        pad_to_fixed_width(&mut layout, 32, &mut sink);
        assert_eq!(layout.total_bits(), 40);
        assert_eq!(sink.entries().len(), 1);
    }

    #[test]
    fn exact_width_is_a_no_op() {
        let mut layout = RepackedLayout::new(
            "resubmit_hdr",
            Gress::Ingress,
            vec![LayoutEntry::Field { field: FieldId(0), width: 32 }],
        );
        let mut sink = ErrorSink::new();
        pad_to_fixed_width(&mut layout, 32, &mut sink);
        assert_eq!(layout.entries.len(), 1);
    }
}
