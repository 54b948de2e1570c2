//! Rewrite engine.
//!
//! Four passes run in a fixed order on one tree:
//!
//! 1. [`expand_variables`]: inline cached trees of earlier assignments.
//! 2. [`expand_powers`]: `x ^ n` into `n - 1` multiplications.
//! 3. [`reorder_priorities`]: rotate secure operands to shallower levels.
//! 4. [`factorize`]: `a*b + a*c` into `a*(b + c)`.
//!
//! Every pass mutates the tree in place; the root `NodeId` stays valid.

mod expand;
mod factor;
mod powers;
mod reorder;

pub use expand::expand_variables;
pub use factor::{factorize, reduce_level};
pub use powers::expand_powers;
pub use reorder::reorder_priorities;

use bet_ast::traversal::check_strict_tree;
use bet_ast::{Context, NodeId};
use tracing::debug;

use crate::cache::TreeCache;
use crate::error::BetResult;
use crate::options::RewriteOptions;

/// What [`rewrite`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Variable leaves replaced by a cached tree.
    pub inlined: usize,
    /// Power nodes turned into multiplications.
    pub powers_expanded: usize,
    pub rotations: usize,
    pub factorizations: usize,
}

impl RewriteReport {
    pub fn changed(&self) -> bool {
        self.inlined + self.powers_expanded + self.rotations + self.factorizations > 0
    }

    /// Add the counts of `other` to `self`.
    pub fn absorb(&mut self, other: RewriteReport) {
        self.inlined += other.inlined;
        self.powers_expanded += other.powers_expanded;
        self.rotations += other.rotations;
        self.factorizations += other.factorizations;
    }
}

/// Run the enabled passes on the tree rooted at `root`.
///
/// On success the tree is strict again and its classification memos are
/// fresh. Any error leaves the tree in an unspecified state; callers must
/// not emit it.
pub fn rewrite(
    ctx: &mut Context,
    root: NodeId,
    cache: &TreeCache,
    options: &RewriteOptions,
) -> BetResult<RewriteReport> {
    let mut report = RewriteReport::default();

    if options.expand_variables {
        report.inlined = expand_variables(ctx, root, cache)?;
    }
    if options.expand_powers {
        report.powers_expanded = expand_powers(ctx, root)?;
    }
    ctx.realize(root, true);

    if options.reorder_priorities {
        report.rotations = reorder_priorities(ctx, root, options.max_reorder_rounds)?;
    }
    if options.factorize {
        report.factorizations = factorize(ctx, root, options.max_factor_rounds)?;
    }
    ctx.realize(root, true);

    check_strict_tree(ctx, root)?;
    debug!(?report, "rewrite finished");
    Ok(report)
}
