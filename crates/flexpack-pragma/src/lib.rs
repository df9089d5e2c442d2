//! Parsing and application of `pa_*` placement pragmas.
//!
//! Pragmas are the only user-facing surface of this core: they seed the
//! constraint bag with facts the traversal-based collectors in
//! `flexpack-collect` cannot derive from program structure alone (explicit
//! aliasing, solitary/no-pack overrides, byte-pack layouts). Parsing
//! (validate + resolve field names) is separated from application (mutate
//! the field database / alias map / constraint bag) so a caller can inspect
//! warnings before committing effects, mirroring the original frontend's
//! "each pragma is independently fallible, one bad pragma doesn't abort the
//! rest" behaviour (§7 kind 1).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

mod apply;
mod byte_pack;
mod parse;
mod types;

pub use apply::apply_pragma;
pub use parse::parse_pragma;
pub use types::{BytePackEntry, ContainerKind, DeparserZeroMode, Pragma};

use flexpack_ir::{AliasMap, AllConstraints, ErrorSink, FieldDatabase, FlexpackOptions};

/// Parse and apply every pragma in `options`, in source order. Malformed
/// pragmas are dropped with a warning pushed to `sink`; well-formed ones are
/// applied immediately so later pragmas (e.g. a `pa_no_pack` naming a field
/// an earlier `pa_alias` just resolved) observe prior effects.
pub fn apply_all_pragmas<D: FieldDatabase>(
    options: &FlexpackOptions,
    db: &mut D,
    aliases: &mut AliasMap,
    constraints: &mut AllConstraints,
    byte_pack_target: &str,
    sink: &mut ErrorSink,
) {
    for raw in &options.pragmas {
        if let Some(pipe) = &raw.pipe {
            if !options.pipeline_is_selected(pipe) {
                continue;
            }
        }
        if let Some(pragma) = parse_pragma(raw, db, sink) {
            apply_pragma(&pragma, db, aliases, constraints, byte_pack_target, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexpack_ir::{Field, FieldKind, Gress, InMemoryFieldDb, RawPragma};

    #[test]
    fn pipeline_restriction_skips_other_pipes() {
        let mut db = InMemoryFieldDb::new();
        let a = db.insert(Field::new(
            flexpack_ir::FieldId(0),
            "a",
            Gress::Ingress,
            8,
            FieldKind::Metadata,
        ));
        let mut aliases = AliasMap::new();
        let mut constraints = AllConstraints::new();
        let mut sink = ErrorSink::new();
        let mut options = FlexpackOptions::new();
        options.restrict_pipelines.push("pipe0".into());
        options.pragmas.push(
            RawPragma::new("pa_solitary", vec!["a".into()])
                .with_gress("ingress")
                .with_pipe("pipe1"),
        );
        apply_all_pragmas(&options, &mut db, &mut aliases, &mut constraints, "hdr", &mut sink);
        assert!(constraints.solitary.is_empty());
        let _ = a;
    }

    #[test]
    fn malformed_pragma_does_not_block_later_ones() {
        let mut db = InMemoryFieldDb::new();
        let a = db.insert(Field::new(
            flexpack_ir::FieldId(0),
            "a",
            Gress::Ingress,
            8,
            FieldKind::Metadata,
        ));
        let mut aliases = AliasMap::new();
        let mut constraints = AllConstraints::new();
        let mut sink = ErrorSink::new();
        let mut options = FlexpackOptions::new();
        options
            .pragmas
            .push(RawPragma::new("pa_bogus", vec![]).with_gress("ingress"));
        options
            .pragmas
            .push(RawPragma::new("pa_solitary", vec!["a".into()]).with_gress("ingress"));
        apply_all_pragmas(&options, &mut db, &mut aliases, &mut constraints, "hdr", &mut sink);
        assert_eq!(sink.entries().len(), 1);
        assert!(constraints.solitary.contains_key(&a));
    }
}
