//! Parsing [`RawPragma`] records into validated [`Pragma`]s.
//!
//! Any malformed pragma (unknown kind, wrong arity, unknown field reference,
//! bad gress token) is a [`FlexpackError::ConfigWarning`] pushed to the
//! sink; only the offending pragma is dropped, per §7 kind 1.

use crate::types::{BytePackEntry, ContainerKind, DeparserZeroMode, Pragma};
use flexpack_ir::{ErrorSink, FieldDatabase, FlexpackError, Gress, RawPragma};

fn gress_of(raw: &RawPragma) -> Option<Gress> {
    match raw.gress.as_deref() {
        Some("ingress") => Some(Gress::Ingress),
        Some("egress") => Some(Gress::Egress),
        Some("ghost") => Some(Gress::Ghost),
        _ => None,
    }
}

fn warn(sink: &mut ErrorSink, msg: impl Into<String>) {
    sink.push(FlexpackError::ConfigWarning(msg.into()));
}

fn resolve_field(
    raw: &RawPragma,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
    name: &str,
) -> Option<flexpack_ir::FieldId> {
    let Some(gress) = gress_of(raw) else {
        warn(sink, format!("{}: missing or unknown gress token", raw.kind));
        return None;
    };
    match db.by_name(gress, name) {
        Some(id) => Some(id),
        None => {
            warn(
                sink,
                format!("{}: unknown field reference '{name}'", raw.kind),
            );
            None
        }
    }
}

/// Parse and validate one [`RawPragma`]. Returns `None` (after pushing a
/// warning) if it is malformed or unrecognised.
pub fn parse_pragma(
    raw: &RawPragma,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
) -> Option<Pragma> {
    match raw.kind.as_str() {
        "pa_alias" => parse_alias(raw, db, sink),
        "pa_no_overlay" => parse_field_list(raw, db, sink).map(|fields| Pragma::NoOverlay { fields }),
        "pa_mutually_exclusive" => {
            parse_field_list(raw, db, sink).map(|fields| Pragma::MutuallyExclusive { fields })
        }
        "pa_container_size" => parse_container_size(raw, db, sink),
        "pa_container_type" => parse_container_type(raw, db, sink),
        "pa_no_init" => parse_single_field(raw, db, sink).map(|field| Pragma::NoInit { field }),
        "pa_solitary" => parse_single_field(raw, db, sink).map(|field| Pragma::Solitary { field }),
        "pa_atomic" => parse_single_field(raw, db, sink).map(|field| Pragma::Atomic { field }),
        "pa_no_pack" => parse_field_list(raw, db, sink).map(|fields| Pragma::NoPack { fields }),
        "pa_byte_pack" => parse_byte_pack(raw, db, sink),
        "pa_deparser_zero" => parse_deparser_zero(raw, db, sink, DeparserZeroMode::Mark),
        "not_parsed" => parse_deparser_zero(raw, db, sink, DeparserZeroMode::NotParsed),
        "not_deparsed" => parse_deparser_zero(raw, db, sink, DeparserZeroMode::NotDeparsed),
        "pa_disable_deparse_0_optimization" => {
            parse_deparser_zero(raw, db, sink, DeparserZeroMode::Disable)
        }
        other => {
            warn(sink, format!("unrecognised pragma '{other}'"));
            None
        }
    }
}

fn parse_single_field(
    raw: &RawPragma,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
) -> Option<flexpack_ir::FieldId> {
    if raw.args.len() != 1 {
        warn(sink, format!("{}: expected exactly one field argument", raw.kind));
        return None;
    }
    resolve_field(raw, db, sink, &raw.args[0])
}

fn parse_field_list(
    raw: &RawPragma,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
) -> Option<Vec<flexpack_ir::FieldId>> {
    if raw.args.is_empty() {
        warn(sink, format!("{}: expected at least one field argument", raw.kind));
        return None;
    }
    let mut fields = Vec::with_capacity(raw.args.len());
    for name in &raw.args {
        fields.push(resolve_field(raw, db, sink, name)?);
    }
    Some(fields)
}

fn parse_alias(
    raw: &RawPragma,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
) -> Option<Pragma> {
    if raw.args.len() != 2 {
        warn(sink, "pa_alias: expected exactly two field arguments");
        return None;
    }
    let a = resolve_field(raw, db, sink, &raw.args[0])?;
    let b = resolve_field(raw, db, sink, &raw.args[1])?;
    let (ka, kb) = (db.field(a)?.kind, db.field(b)?.kind);
    use flexpack_ir::FieldKind;
    // "the metadata field is the source unless both operands are metadata,
    // in which case the unused one is chosen as source" -- liveness is not
    // available to this core, so when both are metadata we deterministically
    // take the first-declared argument as source (documented in DESIGN.md).
    let (source, dest) = match (ka, kb) {
        (FieldKind::Metadata, FieldKind::Metadata) => (a, b),
        (FieldKind::Metadata, _) => (a, b),
        (_, FieldKind::Metadata) => (b, a),
        _ => (a, b),
    };
    Some(Pragma::Alias { source, dest })
}

fn parse_container_size(
    raw: &RawPragma,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
) -> Option<Pragma> {
    if raw.args.len() < 2 {
        warn(sink, "pa_container_size: expected a field and at least one size");
        return None;
    }
    let field = resolve_field(raw, db, sink, &raw.args[0])?;
    let mut sizes = Vec::with_capacity(raw.args.len() - 1);
    for tok in &raw.args[1..] {
        match tok.parse::<u8>() {
            Ok(v) if v == 8 || v == 16 || v == 32 => sizes.push(v),
            _ => {
                warn(
                    sink,
                    format!("pa_container_size: invalid size token '{tok}' (expected 8/16/32)"),
                );
                return None;
            }
        }
    }
    Some(Pragma::ContainerSize { field, sizes })
}

fn parse_container_type(
    raw: &RawPragma,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
) -> Option<Pragma> {
    if raw.args.len() != 2 {
        warn(sink, "pa_container_type: expected a field and a container kind");
        return None;
    }
    let field = resolve_field(raw, db, sink, &raw.args[0])?;
    let kind = match raw.args[1].as_str() {
        "normal" => ContainerKind::Normal,
        "mocha" => ContainerKind::Mocha,
        "dark" => ContainerKind::Dark,
        "tagalong" => {
            warn(sink, "pa_container_type: 'tagalong' containers are unsupported");
            return None;
        }
        other => {
            warn(sink, format!("pa_container_type: unknown container kind '{other}'"));
            return None;
        }
    };
    Some(Pragma::ContainerType { field, kind })
}

fn parse_byte_pack(
    raw: &RawPragma,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
) -> Option<Pragma> {
    if raw.args.is_empty() {
        warn(sink, "pa_byte_pack: expected at least one field or pad entry");
        return None;
    }
    let mut entries = Vec::with_capacity(raw.args.len());
    let mut total_bits: u32 = 0;
    for tok in &raw.args {
        if let Ok(pad) = tok.parse::<u8>() {
            if pad == 0 || pad >= 8 {
                warn(
                    sink,
                    format!("pa_byte_pack: padding entry '{pad}' must be in (0,8)"),
                );
                return None;
            }
            total_bits += u32::from(pad);
            entries.push(BytePackEntry::Pad(pad));
        } else {
            let field = resolve_field(raw, db, sink, tok)?;
            let Some(f) = db.field(field) else {
                warn(sink, format!("pa_byte_pack: unknown field '{tok}'"));
                return None;
            };
            if !matches!(f.kind, flexpack_ir::FieldKind::Metadata | flexpack_ir::FieldKind::Pov) {
                warn(
                    sink,
                    format!("pa_byte_pack: field '{tok}' must be metadata or pov"),
                );
                return None;
            }
            total_bits += u32::from(f.size);
            entries.push(BytePackEntry::Field(field));
        }
    }
    if total_bits % 8 != 0 {
        warn(
            sink,
            format!("pa_byte_pack: total bit count {total_bits} is not divisible by 8"),
        );
        return None;
    }
    Some(Pragma::BytePack { entries })
}

fn parse_deparser_zero(
    raw: &RawPragma,
    db: &impl FieldDatabase,
    sink: &mut ErrorSink,
    mode: DeparserZeroMode,
) -> Option<Pragma> {
    parse_single_field(raw, db, sink).map(|field| Pragma::DeparserZero { field, mode })
}
