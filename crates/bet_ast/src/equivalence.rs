//! Structural tree equivalence modulo commutativity.
//!
//! This is the only primitive used to detect repeated sub-expressions: two
//! subtrees are "the same factor" iff [`structurally_equal`] holds. It is a
//! deep comparison, never reference equality.

use crate::node::{Context, NodeId, NodeKind};

/// Deep structural equality.
///
/// - Leaves are equal when they are the same kind with equal literal or
///   variable identity. Opaque leaves only equal themselves.
/// - Operator nodes are equal when the operators match and the children are
///   equal in order, or (for commutative operators) swapped.
pub fn structurally_equal(ctx: &Context, a: NodeId, b: NodeId) -> bool {
    if a == b {
        return true;
    }

    match (*ctx.get(a).kind(), *ctx.get(b).kind()) {
        (NodeKind::Int(x), NodeKind::Int(y)) => x == y,
        (NodeKind::Float(x), NodeKind::Float(y)) => x == y,
        (NodeKind::Variable { key: k1, .. }, NodeKind::Variable { key: k2, .. }) => k1 == k2,
        (
            NodeKind::Operator { op: op1, left: l1, right: r1 },
            NodeKind::Operator { op: op2, left: l2, right: r2 },
        ) => {
            if op1 != op2 {
                return false;
            }
            if structurally_equal(ctx, l1, l2) && structurally_equal(ctx, r1, r2) {
                return true;
            }
            op1.is_commutative() && structurally_equal(ctx, l1, r2) && structurally_equal(ctx, r1, l2)
        }
        _ => false,
    }
}

/// True iff `id` is a commutative operator with at least one child under the
/// same operator. Precondition for a priority swap at this node.
pub fn is_consecutive_commutative(ctx: &Context, id: NodeId) -> bool {
    let Some(op) = ctx.operator_of(id) else {
        return false;
    };
    if !op.is_commutative() {
        return false;
    }
    let Some((left, right)) = ctx.children(id) else {
        return false;
    };
    ctx.is_op(left, op) || ctx.is_op(right, op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ValueId, VarKey};
    use crate::SecurityKind;

    fn leaf(ctx: &mut Context, key: u64, name: &str) -> NodeId {
        ctx.variable(VarKey(key), name, Some(ValueId(key as u32)), SecurityKind::SecretShared)
    }

    #[test]
    fn commutative_swap_is_equal() {
        let mut ctx = Context::new();
        let a = leaf(&mut ctx, 1, "a");
        let b = leaf(&mut ctx, 2, "b");
        let a2 = leaf(&mut ctx, 1, "a");
        let b2 = leaf(&mut ctx, 2, "b");
        let ab = ctx.mul(a, b);
        let ba = ctx.mul(b2, a2);
        assert!(structurally_equal(&ctx, ab, ba));
    }

    #[test]
    fn matmul_swap_is_not_equal() {
        let mut ctx = Context::new();
        let a = leaf(&mut ctx, 1, "a");
        let b = leaf(&mut ctx, 2, "b");
        let a2 = leaf(&mut ctx, 1, "a");
        let b2 = leaf(&mut ctx, 2, "b");
        let ab = ctx.matmul(a, b);
        let ba = ctx.matmul(b2, a2);
        assert!(!structurally_equal(&ctx, ab, ba));

        let ab2 = ctx.deep_copy(ab);
        assert!(structurally_equal(&ctx, ab, ab2));
    }

    #[test]
    fn different_operators_or_literals_differ() {
        let mut ctx = Context::new();
        let a = leaf(&mut ctx, 1, "a");
        let b = leaf(&mut ctx, 2, "b");
        let sum = ctx.add(a, b);
        let prod = ctx.mul(a, b);
        assert!(!structurally_equal(&ctx, sum, prod));

        let two = ctx.int(2, None);
        let two_f = ctx.float(2.0, None);
        let three = ctx.int(3, None);
        assert!(!structurally_equal(&ctx, two, two_f));
        assert!(!structurally_equal(&ctx, two, three));
        let two_again = ctx.int(2, None);
        assert!(structurally_equal(&ctx, two, two_again));
    }

    #[test]
    fn names_do_not_matter_only_keys() {
        let mut ctx = Context::new();
        let a = leaf(&mut ctx, 1, "a");
        let alias = leaf(&mut ctx, 1, "a_alias");
        let other = leaf(&mut ctx, 7, "a");
        assert!(structurally_equal(&ctx, a, alias));
        assert!(!structurally_equal(&ctx, a, other));
    }

    #[test]
    fn opaque_leaves_only_match_themselves() {
        let mut ctx = Context::new();
        let o1 = ctx.opaque("sqrt", ValueId(1), SecurityKind::Plaintext);
        let o2 = ctx.opaque("sqrt", ValueId(1), SecurityKind::Plaintext);
        assert!(structurally_equal(&ctx, o1, o1));
        assert!(!structurally_equal(&ctx, o1, o2));
    }

    #[test]
    fn consecutive_commutative_detection() {
        let mut ctx = Context::new();
        let a = leaf(&mut ctx, 1, "a");
        let b = leaf(&mut ctx, 2, "b");
        let c = leaf(&mut ctx, 3, "c");
        let ab = ctx.mul(a, b);
        let abc = ctx.mul(ab, c);
        assert!(is_consecutive_commutative(&ctx, abc));
        assert!(!is_consecutive_commutative(&ctx, ab));

        let sum = ctx.add(ab, c);
        assert!(!is_consecutive_commutative(&ctx, sum));

        let d = leaf(&mut ctx, 4, "d");
        let mm = ctx.matmul(a, d);
        let mm2 = ctx.matmul(mm, c);
        assert!(!is_consecutive_commutative(&ctx, mm2));
        assert!(!is_consecutive_commutative(&ctx, a));
    }
}
