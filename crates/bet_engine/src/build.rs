//! Tree Builder: host call chain to tree.

use bet_ast::{Context, NodeId, ValueId};
use tracing::trace;

use crate::error::{BetError, BetResult};
use crate::host::{HostIr, LeafValue};

/// Decompose a host arithmetic expression into a tree.
///
/// Recognised arithmetic calls become operator nodes; every other operand
/// becomes a leaf. Calls the host does not recognise are kept as opaque
/// leaves, already marked expanded.
pub fn build_tree<H>(ctx: &mut Context, host: &H, value: ValueId) -> BetResult<NodeId>
where
    H: HostIr + ?Sized,
{
    if let Some(op) = host.operator_of(value) {
        let (lhs, rhs) = host.call_operands(value).ok_or_else(|| {
            BetError::PreconditionViolation(format!(
                "host value {:?} is a {} call without two operands",
                value, op
            ))
        })?;
        let left = build_tree(ctx, host, lhs)?;
        let right = build_tree(ctx, host, rhs)?;
        return Ok(ctx.operator(op, left, right));
    }

    let kind = host.classify(value);
    let id = match host.leaf_of(value) {
        LeafValue::Variable { key, name } => ctx.variable(key, &name, Some(value), kind),
        LeafValue::Int(n) => ctx.int(n, Some(value)),
        LeafValue::Float(x) => ctx.float(x, Some(value)),
        LeafValue::Opaque { label } => {
            trace!(label = %label, "keeping unrecognised call as opaque leaf");
            ctx.opaque(&label, value, kind)
        }
    };
    Ok(id)
}
