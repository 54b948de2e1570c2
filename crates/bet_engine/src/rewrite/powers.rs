//! Power expansion: `x ^ n` into explicit multiplications.

use bet_ast::{Context, DisplayNode, NodeId, Operator};
use tracing::debug;

use crate::error::{BetError, BetResult};

/// Largest exponent [`expand_powers`] unrolls.
pub const MAX_POWER_EXPONENT: i64 = 1 << 12;

/// Rewrite every `x ^ n` into a left-associated chain of `n - 1`
/// multiplications over deep copies of `x`; `x ^ 1` becomes `x`.
///
/// Bases are expanded before their power, so `(a ^ 2) ^ 2` ends up as a
/// product of four `a`. The exponent must be a positive integer constant no
/// larger than [`MAX_POWER_EXPONENT`].
/// Returns the number of power nodes removed.
pub fn expand_powers(ctx: &mut Context, id: NodeId) -> BetResult<usize> {
    let Some((base, exp)) = ctx.children(id) else {
        return Ok(0);
    };
    if !ctx.is_op(id, Operator::Pow) {
        return Ok(expand_powers(ctx, base)? + expand_powers(ctx, exp)?);
    }

    let expanded = expand_powers(ctx, base)?;
    let n = ctx.get(exp).int_const().ok_or_else(|| {
        BetError::PreconditionViolation(format!(
            "exponent of a power must be an integer constant, found {}",
            DisplayNode::new(ctx, exp)
        ))
    })?;
    ensure_invariant!(n > 0, "exponent of a power must be positive, found {}", n);
    ensure_invariant!(
        n <= MAX_POWER_EXPONENT,
        "exponent {} exceeds the unrolling limit of {}",
        n,
        MAX_POWER_EXPONENT
    );

    if n == 1 {
        ctx.replace(id, base);
    } else {
        let mut chain = base;
        for _ in 1..n {
            let factor = ctx.deep_copy(base);
            chain = ctx.mul(chain, factor);
        }
        ctx.replace(id, chain);
    }
    debug!(exponent = n, "expanded power");
    Ok(expanded + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bet_ast::traversal::{check_strict_tree, count_nodes_matching, count_operators};
    use bet_ast::{SecurityKind, ValueId, VarKey};

    fn x_pow(ctx: &mut Context, n: i64) -> NodeId {
        let x = ctx.variable(VarKey(1), "x", Some(ValueId(1)), SecurityKind::SecretShared);
        let e = ctx.int(n, Some(ValueId(2)));
        ctx.pow(x, e)
    }

    #[test]
    fn power_of_one_is_the_base() {
        let mut ctx = Context::new();
        let root = x_pow(&mut ctx, 1);
        assert_eq!(expand_powers(&mut ctx, root).unwrap(), 1);
        assert_eq!(ctx.get(root).variable_key(), Some(VarKey(1)));
    }

    #[test]
    fn power_of_four_is_three_multiplications() {
        let mut ctx = Context::new();
        let root = x_pow(&mut ctx, 4);
        expand_powers(&mut ctx, root).unwrap();

        assert_eq!(count_operators(&ctx, root, Operator::Mul), 3);
        assert_eq!(count_operators(&ctx, root, Operator::Pow), 0);
        assert_eq!(
            count_nodes_matching(&ctx, root, |n| n.variable_key() == Some(VarKey(1))),
            4
        );
        assert_eq!(DisplayNode::new(&ctx, root).to_string(), "x * x * x * x");
        assert!(check_strict_tree(&ctx, root).is_ok());
    }

    #[test]
    fn nested_powers_expand_base_first() {
        let mut ctx = Context::new();
        let inner = x_pow(&mut ctx, 2);
        let two = ctx.int(2, Some(ValueId(3)));
        let root = ctx.pow(inner, two);

        assert_eq!(expand_powers(&mut ctx, root).unwrap(), 2);
        assert_eq!(count_operators(&ctx, root, Operator::Mul), 3);
        assert!(check_strict_tree(&ctx, root).is_ok());
    }

    #[test]
    fn non_positive_exponent_is_a_precondition_violation() {
        let mut ctx = Context::new();
        let root = x_pow(&mut ctx, 0);
        assert!(matches!(
            expand_powers(&mut ctx, root),
            Err(BetError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn huge_exponent_is_rejected_before_unrolling() {
        let mut ctx = Context::new();
        let root = x_pow(&mut ctx, i64::MAX);
        let before = ctx.len();
        assert!(matches!(
            expand_powers(&mut ctx, root),
            Err(BetError::PreconditionViolation(_))
        ));
        assert_eq!(ctx.len(), before);
        assert!(ctx.is_op(root, Operator::Pow));
    }

    #[test]
    fn exponent_at_the_limit_is_unrolled() {
        let mut ctx = Context::new();
        let root = x_pow(&mut ctx, MAX_POWER_EXPONENT);
        expand_powers(&mut ctx, root).unwrap();
        assert_eq!(
            count_operators(&ctx, root, Operator::Mul),
            (MAX_POWER_EXPONENT - 1) as usize
        );
    }

    #[test]
    fn symbolic_exponent_is_a_precondition_violation() {
        let mut ctx = Context::new();
        let x = ctx.variable(VarKey(1), "x", Some(ValueId(1)), SecurityKind::SecretShared);
        let y = ctx.variable(VarKey(2), "y", Some(ValueId(2)), SecurityKind::Plaintext);
        let root = ctx.pow(x, y);
        let err = expand_powers(&mut ctx, root).unwrap_err();
        assert!(err.to_string().contains("integer constant"));
    }
}
