//! Bridge-use discovery (§4.6 steps 1-2): find every `emit`/`extract` pair
//! on a struct-like type that crosses gress, and turn each into a synthetic
//! pipeline name to analyse.

use flexpack_ir::{Gress, MethodCall, MethodKind};
use indexmap::IndexSet;

/// One discovered bridge: an egress `emit` and an ingress (or cross-pipe)
/// `extract` of the same struct-like type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BridgePair {
    pub type_name: String,
    pub emit_pipe: String,
    pub emit_gress: Gress,
    pub extract_pipe: String,
    pub extract_gress: Gress,
}

impl BridgePair {
    /// A human-readable synthetic pipeline name for tracing/logging; not
    /// otherwise meaningful, since collection and solving both key off
    /// `type_name` alone.
    #[must_use]
    pub fn synthetic_pipeline_name(&self) -> String {
        format!("{}::{}->{}", self.type_name, self.emit_pipe, self.extract_pipe)
    }
}

/// `(pipe, gress, type, method)` tuples (§4.6 step 1) are already exactly
/// what [`MethodCall`] records; this just cross-joins emits against
/// extracts of the same type.
#[must_use]
pub fn discover_bridge_pairs(calls: &[MethodCall]) -> Vec<BridgePair> {
    let emits: Vec<&MethodCall> = calls.iter().filter(|c| c.method == MethodKind::Emit).collect();
    let extracts: Vec<&MethodCall> = calls.iter().filter(|c| c.method == MethodKind::Extract).collect();

    let mut pairs = Vec::new();
    for emit in &emits {
        for extract in &extracts {
            if emit.type_name != extract.type_name {
                continue;
            }
            if emit.pipe == extract.pipe && emit.gress == extract.gress {
                continue;
            }
            pairs.push(BridgePair {
                type_name: emit.type_name.clone(),
                emit_pipe: emit.pipe.clone(),
                emit_gress: emit.gress,
                extract_pipe: extract.pipe.clone(),
                extract_gress: extract.gress,
            });
        }
    }
    pairs
}

/// The distinct struct-like type names any [`BridgePair`] names, in
/// first-seen order — each becomes one solver/repack target.
#[must_use]
pub fn bridged_type_names(pairs: &[BridgePair]) -> Vec<String> {
    let mut seen = IndexSet::new();
    for p in pairs {
        seen.insert(p.type_name.clone());
    }
    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(pipe: &str, gress: Gress, type_name: &str, method: MethodKind) -> MethodCall {
        MethodCall { pipe: pipe.to_string(), gress, type_name: type_name.to_string(), method }
    }

    #[test]
    fn cross_gress_emit_extract_pair_is_discovered() {
        let calls = vec![
            call("p0", Gress::Egress, "bridge_md", MethodKind::Emit),
            call("p0", Gress::Ingress, "bridge_md", MethodKind::Extract),
        ];
        let pairs = discover_bridge_pairs(&calls);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].type_name, "bridge_md");
    }

    #[test]
    fn same_pipe_same_gress_emit_and_extract_is_not_a_bridge() {
        let calls = vec![
            call("p0", Gress::Ingress, "local_md", MethodKind::Emit),
            call("p0", Gress::Ingress, "local_md", MethodKind::Extract),
        ];
        assert!(discover_bridge_pairs(&calls).is_empty());
    }

    #[test]
    fn unrelated_types_do_not_cross_pair() {
        let calls = vec![
            call("p0", Gress::Egress, "a", MethodKind::Emit),
            call("p0", Gress::Ingress, "b", MethodKind::Extract),
        ];
        assert!(discover_bridge_pairs(&calls).is_empty());
    }

    #[test]
    fn bridged_type_names_dedups_across_multiple_pairs() {
        let calls = vec![
            call("p0", Gress::Egress, "bridge_md", MethodKind::Emit),
            call("p0", Gress::Ingress, "bridge_md", MethodKind::Extract),
            call("p1", Gress::Ingress, "bridge_md", MethodKind::Extract),
        ];
        let pairs = discover_bridge_pairs(&calls);
        assert_eq!(pairs.len(), 2);
        assert_eq!(bridged_type_names(&pairs), vec!["bridge_md".to_string()]);
    }
}
