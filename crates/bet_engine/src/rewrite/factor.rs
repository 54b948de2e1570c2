//! Factorization-based reduction: `a*b + a*c` into `a*(b + c)`.
//!
//! # Search
//! Below an addition, every multiplication chain is flattened and each of its
//! non-multiplication factors is recorded in a side table together with the
//! nodes the later surgery needs. Each newly recorded factor is compared, in
//! recording order, against the factors visited so far. Factors recorded
//! under the *same* top multiplication never match each other: pairing them
//! would factor a chain with itself.
//!
//! The first match wins. Traversal is left before right and outer factors
//! before nested ones, so the result is deterministic but not a global
//! optimum.

use bet_ast::{structurally_equal, Context, DisplayNode, NodeId, Operator};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::error::{BetError, BetResult};

/// Where a factor sits, recorded while flattening a multiplication chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FactorSite {
    /// Multiplication node holding the factor.
    parent: NodeId,
    /// Other operand of `parent`.
    sibling: NodeId,
    /// Outermost multiplication of the chain.
    top_mul: NodeId,
    /// Addition the chain hangs from.
    add: NodeId,
    /// Other operand of `add`: what the addition degenerates to once the
    /// chain is gone.
    tail: NodeId,
}

#[derive(Debug, Default)]
struct FactorSearch {
    visited: SmallVec<[NodeId; 8]>,
    sites: FxHashMap<NodeId, FactorSite>,
}

/// `(factor, matched)`: the factor just recorded and the earlier visited
/// factor it is structurally equal to.
type FactorPair = (NodeId, NodeId);

impl FactorSearch {
    fn in_add(&mut self, ctx: &Context, add: NodeId) -> BetResult<Option<FactorPair>> {
        ensure_invariant!(
            ctx.is_op(add, Operator::Add),
            "factor search started below {}, not an addition",
            DisplayNode::new(ctx, add)
        );
        let (left, right) = ctx.operands(add)?;

        for (side, tail) in [(left, right), (right, left)] {
            let found = if ctx.is_op(side, Operator::Mul) {
                self.in_mul(ctx, side, side, add, tail)?
            } else if ctx.is_op(side, Operator::Add) {
                self.in_add(ctx, side)?
            } else {
                None
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    fn in_mul(
        &mut self,
        ctx: &Context,
        mul: NodeId,
        top_mul: NodeId,
        add: NodeId,
        tail: NodeId,
    ) -> BetResult<Option<FactorPair>> {
        let (left, right) = ctx.operands(mul)?;

        for (factor, sibling) in [(left, right), (right, left)] {
            if ctx.is_op(factor, Operator::Mul) {
                continue;
            }
            self.sites.insert(
                factor,
                FactorSite {
                    parent: mul,
                    sibling,
                    top_mul,
                    add,
                    tail,
                },
            );
            if let Some(matched) = self.visited_match(ctx, factor, top_mul) {
                trace!(factor = %DisplayNode::new(ctx, factor), "found common factor");
                return Ok(Some((factor, matched)));
            }
            self.visited.push(factor);
        }

        for child in [left, right] {
            if ctx.is_op(child, Operator::Mul) {
                if let Some(pair) = self.in_mul(ctx, child, top_mul, add, tail)? {
                    return Ok(Some(pair));
                }
            }
        }
        Ok(None)
    }

    /// First visited factor equal to `factor` from a different chain.
    fn visited_match(&self, ctx: &Context, factor: NodeId, top_mul: NodeId) -> Option<NodeId> {
        self.visited.iter().copied().find(|&seen| {
            let other_chain = self
                .sites
                .get(&seen)
                .is_some_and(|site| site.top_mul != top_mul);
            other_chain && structurally_equal(ctx, factor, seen)
        })
    }

    fn site(&self, ctx: &Context, factor: NodeId) -> BetResult<FactorSite> {
        self.sites.get(&factor).copied().ok_or_else(|| {
            BetError::PreconditionViolation(format!(
                "no recorded position for factor {}",
                DisplayNode::new(ctx, factor)
            ))
        })
    }
}

/// Pull `factor` out of both chains and merge them under one multiplication.
///
/// With `first` the site of `factor` and `second` the site of its match, the
/// chain of `first` becomes `factor * (first_rest + second_rest)` and the
/// addition that held the second chain collapses to its tail.
fn factor_out(ctx: &mut Context, factor: NodeId, first: FactorSite, second: FactorSite) {
    ctx.replace(second.parent, second.sibling);
    ctx.replace(first.parent, first.sibling);

    let first_rest = ctx.relocate(first.top_mul);
    let sum = ctx.add(first_rest, second.top_mul);
    ctx.set_operator(first.top_mul, Operator::Mul, factor, sum);

    ctx.replace(second.add, second.tail);
}

/// Apply the first factorization found at or below `id`.
///
/// An addition is searched as a whole; when nothing factors there the search
/// goes on in its operands, so sums nested under products are reached too.
pub fn reduce_level(ctx: &mut Context, id: NodeId) -> BetResult<bool> {
    let Some((left, right)) = ctx.children(id) else {
        return Ok(false);
    };

    if ctx.is_op(id, Operator::Add) {
        let mut search = FactorSearch::default();
        if let Some((factor, matched)) = search.in_add(ctx, id)? {
            let first = search.site(ctx, factor)?;
            let second = search.site(ctx, matched)?;
            factor_out(ctx, factor, first, second);
            return Ok(true);
        }
    }

    Ok(reduce_level(ctx, left)? || reduce_level(ctx, right)?)
}

/// Factorize until no reduction fires or `max_rounds` were applied, then
/// re-realize the classification of the whole tree.
///
/// Each factorization removes one multiplication. Returns how many fired.
pub fn factorize(ctx: &mut Context, root: NodeId, max_rounds: usize) -> BetResult<usize> {
    let mut reductions = 0;
    loop {
        if reductions == max_rounds {
            warn!(max_rounds, "factorization stopped before reaching a fixed point");
            break;
        }
        if !reduce_level(ctx, root)? {
            break;
        }
        reductions += 1;
        debug!(tree = %DisplayNode::new(ctx, root), "factorized");
    }

    if reductions > 0 {
        ctx.realize(root, true);
    }
    Ok(reductions)
}
