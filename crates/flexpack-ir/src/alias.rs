//! [`AliasMap`]: `source -> destination` field aliasing.

use crate::error::FlexpackError;
use crate::field::FieldId;
use crate::slice::FieldSlice;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Who introduced an alias relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AliasOrigin {
    /// From a `pa_alias` pragma.
    Pragma,
    /// Synthesized by an earlier compiler pass (e.g. auto-alias for
    /// bridged-field coalescing).
    Compiler,
}

/// One alias relation: `source` field uses are rewritten to `dest`, optionally
/// restricted to a sub-range of `dest`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AliasEntry {
    pub dest: FieldId,
    pub range: Option<FieldSlice>,
    pub origin: AliasOrigin,
}

/// Maps an alias *source* field to its canonical *destination* field.
///
/// Invariants (§3): each source appears at most once; a source's destination
/// is never itself a source (no chaining — callers resolve a field through
/// exactly one lookup step).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AliasMap {
    entries: IndexMap<FieldId, AliasEntry>,
}

impl AliasMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `source -> dest`.
    ///
    /// # Errors
    /// Returns [`FlexpackError::ConstraintConflict`] if `source` already has
    /// an alias, or if `dest` is itself already used as an alias source
    /// (chaining would violate the no-chain invariant).
    pub fn insert(
        &mut self,
        source: FieldId,
        dest: FieldId,
        range: Option<FieldSlice>,
        origin: AliasOrigin,
    ) -> Result<(), FlexpackError> {
        if self.entries.contains_key(&source) {
            return Err(FlexpackError::ConstraintConflict {
                field: source.to_string(),
                detail: "field is already an alias source".into(),
            });
        }
        if self.entries.contains_key(&dest) {
            return Err(FlexpackError::ConstraintConflict {
                field: dest.to_string(),
                detail: "alias destination is itself an alias source (chaining not allowed)"
                    .into(),
            });
        }
        self.entries.insert(
            source,
            AliasEntry {
                dest,
                range,
                origin,
            },
        );
        Ok(())
    }

    /// Resolve `field` through one step of lookup; returns `field` itself if
    /// it is not an alias source.
    #[must_use]
    pub fn resolve(&self, field: FieldId) -> FieldId {
        self.entries.get(&field).map_or(field, |e| e.dest)
    }

    #[must_use]
    pub fn is_source(&self, field: FieldId) -> bool {
        self.entries.contains_key(&field)
    }

    #[must_use]
    pub fn get(&self, source: FieldId) -> Option<&AliasEntry> {
        self.entries.get(&source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &AliasEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldId;

    #[test]
    fn resolves_one_step() {
        let mut m = AliasMap::new();
        m.insert(FieldId(0), FieldId(1), None, AliasOrigin::Pragma).unwrap();
        assert_eq!(m.resolve(FieldId(0)), FieldId(1));
        assert_eq!(m.resolve(FieldId(1)), FieldId(1));
    }

    #[test]
    fn rejects_chained_alias() {
        let mut m = AliasMap::new();
        m.insert(FieldId(0), FieldId(1), None, AliasOrigin::Pragma).unwrap();
        let err = m.insert(FieldId(1), FieldId(2), None, AliasOrigin::Pragma);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_duplicate_source() {
        let mut m = AliasMap::new();
        m.insert(FieldId(0), FieldId(1), None, AliasOrigin::Pragma).unwrap();
        let err = m.insert(FieldId(0), FieldId(2), None, AliasOrigin::Pragma);
        assert!(err.is_err());
    }
}
