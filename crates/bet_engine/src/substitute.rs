//! Leaf substitution by variable identity.
//!
//! Used by shadow-execution instrumentation to swap secure leaves for their
//! revealed counterparts.

use bet_ast::traversal::collect_leaves;
use bet_ast::{Context, NodeId, VarKey};

/// Replace every variable leaf reading `key` with a deep copy of
/// `replacement`, in place. Returns the number of leaves replaced.
///
/// `replacement` must not belong to the tree rooted at `root`.
pub fn substitute_leaf(ctx: &mut Context, root: NodeId, key: VarKey, replacement: NodeId) -> usize {
    let targets: Vec<NodeId> = collect_leaves(ctx, root)
        .into_iter()
        .filter(|&leaf| ctx.get(leaf).variable_key() == Some(key))
        .collect();

    for &leaf in &targets {
        let copy = ctx.deep_copy(replacement);
        ctx.replace(leaf, copy);
    }

    if !targets.is_empty() {
        ctx.realize(root, true);
    }
    targets.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bet_ast::traversal::check_strict_tree;
    use bet_ast::{DisplayNode, SecurityKind, ValueId};

    #[test]
    fn replaces_every_occurrence_with_fresh_copies() {
        let mut ctx = Context::new();
        let x1 = ctx.variable(VarKey(1), "x", Some(ValueId(1)), SecurityKind::SecretShared);
        let x2 = ctx.variable(VarKey(1), "x", Some(ValueId(1)), SecurityKind::SecretShared);
        let y = ctx.variable(VarKey(2), "y", Some(ValueId(2)), SecurityKind::Plaintext);
        let xy = ctx.mul(x1, y);
        let root = ctx.add(xy, x2);
        assert_eq!(ctx.security(root), SecurityKind::SecretShared);

        let raw = ctx.variable(VarKey(7), "raw_x", Some(ValueId(7)), SecurityKind::Plaintext);
        assert_eq!(substitute_leaf(&mut ctx, root, VarKey(1), raw), 2);

        assert_eq!(DisplayNode::new(&ctx, root).to_string(), "raw_x * y + raw_x");
        assert_eq!(ctx.security(root), SecurityKind::Plaintext);
        assert!(check_strict_tree(&ctx, root).is_ok());
    }

    #[test]
    fn root_leaf_is_replaced_in_place() {
        let mut ctx = Context::new();
        let x = ctx.variable(VarKey(1), "x", Some(ValueId(1)), SecurityKind::SecretShared);
        let raw = ctx.variable(VarKey(7), "raw_x", Some(ValueId(7)), SecurityKind::Plaintext);
        assert_eq!(substitute_leaf(&mut ctx, x, VarKey(1), raw), 1);
        assert_eq!(ctx.get(x).variable_key(), Some(VarKey(7)));
    }

    #[test]
    fn missing_key_is_a_no_op() {
        let mut ctx = Context::new();
        let x = ctx.variable(VarKey(1), "x", Some(ValueId(1)), SecurityKind::SecretShared);
        let raw = ctx.variable(VarKey(7), "raw_x", Some(ValueId(7)), SecurityKind::Plaintext);
        assert_eq!(substitute_leaf(&mut ctx, x, VarKey(3), raw), 0);
        assert_eq!(ctx.get(x).variable_key(), Some(VarKey(1)));
    }
}
