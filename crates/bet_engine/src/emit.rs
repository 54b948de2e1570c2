//! Code generation: tree back to a host call chain.
//!
//! Emission is two-phase. Every operator node is resolved against the host
//! first; calls are only synthesised once the whole tree is known to
//! resolve, so a resolution failure never leaves half-emitted code behind.

use bet_ast::{Context, NodeId, ValueId};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{BetError, BetResult};
use crate::host::HostIr;

/// Emit the tree rooted at `root` and return the host value computing it.
///
/// Leaves re-emit the host value they were built from.
pub fn emit<H: HostIr>(ctx: &Context, host: &mut H, root: NodeId) -> BetResult<ValueId> {
    ctx.realize(root, true);

    let mut plan = FxHashMap::default();
    resolve_rec(ctx, host, root, &mut plan)?;
    debug!(calls = plan.len(), "resolved every operator of the tree");

    emit_rec(ctx, host, root, &mut plan)
}

fn resolve_rec<H: HostIr>(
    ctx: &Context,
    host: &H,
    id: NodeId,
    plan: &mut FxHashMap<NodeId, H::Callable>,
) -> BetResult<()> {
    let node = ctx.get(id);
    let (Some(op), Some((left, right))) = (node.operator(), node.children()) else {
        if node.value().is_none() {
            return Err(BetError::PreconditionViolation(format!(
                "leaf {} has no host value to re-emit",
                id
            )));
        }
        return Ok(());
    };

    let lhs = ctx.security(left);
    let rhs = ctx.security(right);
    let callable = host
        .resolve_operator(op, lhs, rhs)
        .ok_or_else(|| BetError::Resolution {
            operator: op.magic_name().to_string(),
            lhs,
            rhs,
        })?;
    plan.insert(id, callable);

    resolve_rec(ctx, host, left, plan)?;
    resolve_rec(ctx, host, right, plan)
}

fn emit_rec<H: HostIr>(
    ctx: &Context,
    host: &mut H,
    id: NodeId,
    plan: &mut FxHashMap<NodeId, H::Callable>,
) -> BetResult<ValueId> {
    let node = ctx.get(id);
    let Some((left, right)) = node.children() else {
        return node.value().ok_or_else(|| {
            BetError::PreconditionViolation(format!("leaf {} has no host value to re-emit", id))
        });
    };

    let lhs = emit_rec(ctx, host, left, plan)?;
    let rhs = emit_rec(ctx, host, right, plan)?;
    let callable = plan.remove(&id).ok_or_else(|| {
        BetError::PreconditionViolation(format!("operator {} was emitted twice", id))
    })?;
    Ok(host.emit_call(&callable, lhs, rhs))
}
