//! Builds the per-type rewrite plan: the final field-list order a
//! [`RepackedLayout`] implies, with real [`FieldId`]s allocated for every
//! synthetic padding slot.

use flexpack_ir::{FieldDatabase, FieldId, RepackedLayout};
use indexmap::{IndexMap, IndexSet};

/// Where every field (real or newly-allocated padding) lands in the
/// rewritten struct's field list, plus which positions are padding.
#[derive(Clone, Debug, Default)]
pub struct RewritePlan {
    pub ordered_ids: Vec<FieldId>,
    pub position_of: IndexMap<FieldId, usize>,
    pub padding_positions: IndexSet<usize>,
}

/// Walk `layout.entries` in order, allocating a padding field for each
/// [`flexpack_ir::LayoutEntry::Padding`] via [`FieldDatabase::insert_padding`].
pub fn build_rewrite_plan(layout: &RepackedLayout, db: &mut impl FieldDatabase) -> RewritePlan {
    let mut plan = RewritePlan::default();
    for (idx, entry) in layout.entries.iter().enumerate() {
        match entry.field_id() {
            Some(field) => {
                plan.ordered_ids.push(field);
                plan.position_of.insert(field, idx);
            }
            None => {
                let name = format!("__pad_{}_{idx}", layout.type_name);
                let pad = db.insert_padding(layout.gress, entry.width(), &name);
                plan.ordered_ids.push(pad);
                plan.padding_positions.insert(idx);
            }
        }
    }
    plan
}
