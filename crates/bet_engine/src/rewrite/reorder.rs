//! Priority reordering.
//!
//! In a chain of the same commutative operator, a secure operand nested
//! under a plain one compounds two expensive operations. Rotating the secure
//! grandchild up one level, and the plain sibling down in its place, keeps a
//! single expensive operand per level.

use bet_ast::{is_consecutive_commutative, Context, DisplayNode, NodeId};
use tracing::{debug, warn};

use crate::error::BetResult;

/// Rotate until no rotation fires anywhere in the tree, or `max_rounds`
/// rotations have been applied. Returns the number of rotations.
pub fn reorder_priorities(ctx: &mut Context, root: NodeId, max_rounds: usize) -> BetResult<usize> {
    let mut rotations = 0;
    while rotations < max_rounds {
        if !reorder_once(ctx, root)? {
            return Ok(rotations);
        }
        rotations += 1;
        // Ancestors of the rotated node still hold the old classification.
        ctx.realize(root, true);
    }

    // The last allowed rotation may have reached the fixed point.
    if rotation_pending(ctx, root)? {
        warn!(
            max_rounds,
            "priority reordering stopped before reaching a fixed point"
        );
    }
    Ok(rotations)
}

/// Apply at most one rotation, searching top-down and left first.
fn reorder_once(ctx: &mut Context, id: NodeId) -> BetResult<bool> {
    let Some((left, right)) = ctx.children(id) else {
        return Ok(false);
    };
    if !ctx.is_secure_container(id) {
        return Ok(false);
    }

    if is_consecutive_commutative(ctx, id)
        && (swap_priorities(ctx, id, left)? || swap_priorities(ctx, id, right)?)
    {
        return Ok(true);
    }

    Ok(reorder_once(ctx, left)? || reorder_once(ctx, right)?)
}

/// Whether [`reorder_once`] would rotate somewhere below `id`.
fn rotation_pending(ctx: &Context, id: NodeId) -> BetResult<bool> {
    let Some((left, right)) = ctx.children(id) else {
        return Ok(false);
    };
    if !ctx.is_secure_container(id) {
        return Ok(false);
    }

    if is_consecutive_commutative(ctx, id)
        && (rotation_at(ctx, id, left)?.is_some() || rotation_at(ctx, id, right)?.is_some())
    {
        return Ok(true);
    }

    Ok(rotation_pending(ctx, left)? || rotation_pending(ctx, right)?)
}

/// The rotation `swap_priorities(parent, child)` would apply, as
/// `(sibling, hot grandchild, whether the hot grandchild is on the left)`.
///
/// None when `child` is under another operator or the sibling is secure.
/// Exactly one grandchild must be secure.
fn rotation_at(
    ctx: &Context,
    parent: NodeId,
    child: NodeId,
) -> BetResult<Option<(NodeId, NodeId, bool)>> {
    if ctx.operator_of(parent) != ctx.operator_of(child) {
        return Ok(None);
    }

    let (left, right) = ctx.operands(parent)?;
    ensure_invariant!(
        left == child || right == child,
        "{} is not a child of {}",
        child,
        parent
    );
    let sibling = if left == child { right } else { left };
    if ctx.is_secure_container(sibling) {
        return Ok(None);
    }

    let (inner_left, inner_right) = ctx.operands(child)?;
    let left_hot = ctx.is_secure_container(inner_left);
    if left_hot == ctx.is_secure_container(inner_right) {
        return Ok(None);
    }

    let hot = if left_hot { inner_left } else { inner_right };
    Ok(Some((sibling, hot, left_hot)))
}

/// Rotate the secure grandchild below `child` with the sibling of `child`.
fn swap_priorities(ctx: &mut Context, parent: NodeId, child: NodeId) -> BetResult<bool> {
    let Some((sibling, hot, left_hot)) = rotation_at(ctx, parent, child)? else {
        return Ok(false);
    };

    if left_hot {
        ctx.set_left(child, sibling)?;
    } else {
        ctx.set_right(child, sibling)?;
    }
    if ctx.operands(parent)?.0 == sibling {
        ctx.set_left(parent, hot)?;
    } else {
        ctx.set_right(parent, hot)?;
    }
    ctx.invalidate(child);
    ctx.realize(child, false);

    debug!(node = %DisplayNode::new(ctx, parent), "rotated secure operand up");
    Ok(true)
}
