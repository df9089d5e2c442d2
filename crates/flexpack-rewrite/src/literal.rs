//! Struct-literal rewrite (§4.5): the same field-list reorder as a
//! struct-like type itself, applied to `Type { field: value, ... }`
//! expressions of that type.

use crate::plan::RewritePlan;
use flexpack_ir::{LiteralValue, StructLiteral};
use indexmap::IndexMap;

pub fn rewrite_struct_literal(lit: &mut StructLiteral, plan: &RewritePlan) {
    let old_values: IndexMap<_, _> = lit.values.drain(..).collect();
    lit.values = plan
        .ordered_ids
        .iter()
        .map(|&id| {
            let value = old_values.get(&id).cloned().unwrap_or(LiteralValue::ConstZero);
            (id, value)
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexpack_ir::{FieldId, Gress};

    #[test]
    fn literal_follows_new_field_order_and_zero_fills_padding() {
        let a = FieldId(0);
        let b = FieldId(1);
        let pad = FieldId(999);
        let plan = RewritePlan {
            ordered_ids: vec![pad, b, a],
            position_of: [(a, 2), (b, 1)].into_iter().collect(),
            padding_positions: [0].into_iter().collect(),
        };
        let mut lit = StructLiteral {
            type_name: "hdr".into(),
            gress: Gress::Ingress,
            values: vec![
                (a, LiteralValue::ConstZero),
                (b, LiteralValue::Opaque("x".into())),
            ],
        };
        rewrite_struct_literal(&mut lit, &plan);
        assert_eq!(lit.values[0], (pad, LiteralValue::ConstZero));
        assert_eq!(lit.values[1], (b, LiteralValue::Opaque("x".into())));
        assert_eq!(lit.values[2], (a, LiteralValue::ConstZero));
    }
}
