//! Alignment and bridge discovery (§4.1): three cooperating traversals that
//! locate bridged-field provenance before constraint synthesis runs.

use flexpack_ir::{
    Extract, ExtractSource, FieldDatabase, FieldId, FieldKind, Gress, ProgramIr,
};
use indexmap::{IndexMap, IndexSet};

/// `bridged -> orig`: every alias relation whose destination is a `@flexible`
/// field in the ingress thread. Built from the alias map rather than by
/// re-deriving assignment structure, since `pa_alias`/compiler-synthesized
/// aliases already *are* the `dest <- source` relation this traversal looks
/// for.
#[must_use]
pub fn ingress_bridge_aliases(
    aliases: &flexpack_ir::AliasMap,
    db: &impl FieldDatabase,
) -> IndexMap<FieldId, FieldId> {
    let mut out = IndexMap::new();
    for (source, entry) in aliases.iter() {
        let Some(dest_field) = db.field(entry.dest) else {
            continue;
        };
        if dest_field.gress == Gress::Ingress && dest_field.is_flexible() {
            out.insert(entry.dest, source);
        }
    }
    out
}

/// For every `dest := saved(src)` extract in an egress parser state where
/// `src` is `@flexible` and `dest` is not solitary, record `src` as a
/// candidate source of `dest` together with the states it was seen in.
/// Candidates that settle on exactly one source survive into the returned
/// `dest -> src` map.
#[must_use]
pub fn egress_bridge_candidates(
    ir: &ProgramIr,
    db: &impl FieldDatabase,
) -> IndexMap<FieldId, FieldId> {
    let mut candidates: IndexMap<FieldId, IndexSet<FieldId>> = IndexMap::new();
    let mut states_seen: IndexMap<FieldId, IndexSet<String>> = IndexMap::new();

    for state in &ir.parser_states {
        if state.gress != Gress::Egress {
            continue;
        }
        for extract in &state.extracts {
            let Extract { dest, source: ExtractSource::Saved(src) } = extract else {
                continue;
            };
            let Some(src_field) = db.field(*src) else {
                continue;
            };
            let Some(dest_field) = db.field(*dest) else {
                continue;
            };
            if !src_field.is_flexible() || dest_field.is_solitary() {
                continue;
            }
            candidates.entry(*dest).or_default().insert(*src);
            states_seen
                .entry(*dest)
                .or_default()
                .insert(state.name.clone());
        }
    }

    candidates
        .into_iter()
        .filter_map(|(dest, srcs)| {
            if srcs.len() == 1 {
                tracing::debug!(
                    ?dest,
                    states = ?states_seen.get(&dest),
                    "egress bridge candidate settled on a unique source"
                );
                srcs.into_iter().next().map(|src| (dest, src))
            } else {
                tracing::debug!(?dest, count = srcs.len(), "egress bridge candidate ambiguous, dropped");
                None
            }
        })
        .collect()
}

/// The symmetric `aligned(dest, src)` relation for every `dest := saved(src)`
/// extract in any parser state, represented as an undirected adjacency map
/// so the related-fields walk (`R`) can traverse it in either direction.
#[must_use]
pub fn parser_extract_pairs(ir: &ProgramIr) -> IndexMap<FieldId, IndexSet<FieldId>> {
    let mut adj: IndexMap<FieldId, IndexSet<FieldId>> = IndexMap::new();
    for state in &ir.parser_states {
        for extract in &state.extracts {
            if let ExtractSource::Saved(src) = extract.source {
                adj.entry(extract.dest).or_default().insert(src);
                adj.entry(src).or_default().insert(extract.dest);
            }
        }
    }
    adj
}

/// The inputs §4.2's related-fields walk needs, bundled so the driver builds
/// them once per synthetic pipeline and threads them through every
/// per-field synthesis call.
#[derive(Clone, Debug, Default)]
pub struct BridgeContext {
    pub ingress_bridge: IndexMap<FieldId, FieldId>,
    pub egress_bridge: IndexMap<FieldId, FieldId>,
    pub parser_extract_pairs: IndexMap<FieldId, IndexSet<FieldId>>,
}

impl BridgeContext {
    #[must_use]
    pub fn discover(
        ir: &ProgramIr,
        db: &impl FieldDatabase,
        aliases: &flexpack_ir::AliasMap,
    ) -> Self {
        Self {
            ingress_bridge: ingress_bridge_aliases(aliases, db),
            egress_bridge: egress_bridge_candidates(ir, db),
            parser_extract_pairs: parser_extract_pairs(ir),
        }
    }
}

/// Whether `f` is an intrinsic *packet* field per the data model (kind
/// implies flag subsets: padding fields are never intrinsic packet fields).
#[must_use]
pub fn is_intrinsic_packet(id: FieldId, db: &impl FieldDatabase) -> bool {
    db.field(id)
        .is_some_and(|f| f.is_intrinsic() && matches!(f.kind, FieldKind::Packet))
}
