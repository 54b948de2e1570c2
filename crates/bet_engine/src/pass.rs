//! Function-body optimization pass.
//!
//! Walks the assignments of one function in program order, rewriting the
//! right-hand side of every assignment to a secure variable. One arena and
//! one [`TreeCache`] live for the duration of a single [`OptimizationPass::run`].

use bet_ast::{Context, DisplayNode};
use tracing::{debug, trace};

use crate::build::build_tree;
use crate::cache::{reads_variable, TreeCache};
use crate::emit::emit;
use crate::error::BetResult;
use crate::host::{Assignment, FunctionBody};
use crate::options::RewriteOptions;
use crate::rewrite::{expand_variables, rewrite, RewriteReport};

/// Totals of one [`OptimizationPass::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Assignments to secure variables that were examined.
    pub secure_assignments: usize,
    /// Assignments whose right-hand side was re-emitted.
    pub assignments_rewritten: usize,
    /// Rewrite counts of the re-emitted assignments only. Copies such as
    /// `u = t` are expanded for the cache but not counted.
    pub totals: RewriteReport,
}

#[derive(Debug, Clone, Default)]
pub struct OptimizationPass {
    options: RewriteOptions,
}

impl OptimizationPass {
    pub fn new(options: RewriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Optimise every secure assignment of `host`.
    ///
    /// Any error aborts the whole run. Assignments already rewritten before
    /// the failing one keep their new right-hand side.
    pub fn run<H: FunctionBody>(&self, host: &mut H) -> BetResult<PassReport> {
        let mut ctx = Context::new();
        let mut cache = TreeCache::new();
        let mut report = PassReport::default();

        for Assignment { stmt, target, rhs } in host.assignments() {
            // Trees read before this assignment must not be inlined after it.
            let dropped = cache.invalidate_readers(&ctx, target);
            if dropped > 0 {
                trace!(?target, dropped, "invalidated cached readers");
            }

            if !host.variable_kind(target).is_secure_container() {
                cache.remove(target);
                continue;
            }
            report.secure_assignments += 1;

            let root = build_tree(&mut ctx, &*host, rhs)?;
            let mut rewrites = RewriteReport::default();
            if self.options.expand_variables {
                rewrites.inlined = expand_variables(&mut ctx, root, &cache)?;
            }

            if host.operator_of(rhs).is_some() {
                let rest = self.options.with_expand_variables(false);
                rewrites.absorb(rewrite(&mut ctx, root, &cache, &rest)?);
                let emitted = emit(&ctx, host, root)?;
                host.set_rhs(stmt, emitted);
                report.assignments_rewritten += 1;
                report.totals.absorb(rewrites);
                debug!(
                    ?stmt,
                    tree = %DisplayNode::new(&ctx, root),
                    "rewrote assignment"
                );
            }

            if reads_variable(&ctx, root, target) {
                cache.remove(target);
            } else {
                cache.insert(target, root);
            }
        }

        debug!(?report, "optimization pass finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BetError;
    use crate::testing::MockHost;
    use bet_ast::{Operator, SecurityKind};

    #[test]
    fn factorizes_across_statements() {
        // t = a * b; y = t + a * c
        let mut host = MockHost::new();
        let a = host.var(1, "a", SecurityKind::SecretShared);
        let b = host.var(2, "b", SecurityKind::SecretShared);
        let c = host.var(3, "c", SecurityKind::SecretShared);
        host.var(10, "t", SecurityKind::SecretShared);
        host.var(11, "y", SecurityKind::SecretShared);

        let ab = host.call(Operator::Mul, a, b);
        host.assign(10, ab);
        let t = host.var(10, "t", SecurityKind::SecretShared);
        let ac = host.call(Operator::Mul, a, c);
        let sum = host.call(Operator::Add, t, ac);
        let y_stmt = host.assign(11, sum);

        let report = OptimizationPass::default().run(&mut host).unwrap();
        assert_eq!(report.secure_assignments, 2);
        assert_eq!(report.assignments_rewritten, 2);
        assert_eq!(report.totals.inlined, 1);
        assert_eq!(report.totals.factorizations, 1);
        assert_eq!(host.render(host.rhs(y_stmt)), "(a * (c + b))");
    }

    #[test]
    fn copy_assignments_are_cached_but_not_counted() {
        // t = a * b; u = t; y = u * c
        let mut host = MockHost::new();
        let a = host.var(1, "a", SecurityKind::SecretShared);
        let b = host.var(2, "b", SecurityKind::SecretShared);
        let c = host.var(3, "c", SecurityKind::SecretShared);
        host.var(10, "t", SecurityKind::SecretShared);
        host.var(11, "u", SecurityKind::SecretShared);
        host.var(12, "y", SecurityKind::SecretShared);

        let ab = host.call(Operator::Mul, a, b);
        host.assign(10, ab);
        let t = host.var(10, "t", SecurityKind::SecretShared);
        let u_stmt = host.assign(11, t);
        let u = host.var(11, "u", SecurityKind::SecretShared);
        let uc = host.call(Operator::Mul, u, c);
        let y_stmt = host.assign(12, uc);

        let report = OptimizationPass::default().run(&mut host).unwrap();
        assert_eq!(report.secure_assignments, 3);
        assert_eq!(report.assignments_rewritten, 2);
        assert_eq!(report.totals.inlined, 1);
        assert_eq!(host.rhs(u_stmt), t);
        assert_eq!(host.render(host.rhs(y_stmt)), "((a * b) * c)");
    }

    #[test]
    fn plain_assignments_are_untouched() {
        let mut host = MockHost::new();
        let p = host.var(1, "p", SecurityKind::Plaintext);
        let q = host.var(2, "q", SecurityKind::Plaintext);
        host.var(3, "r", SecurityKind::Plaintext);
        let pq = host.call(Operator::Mul, p, q);
        let stmt = host.assign(3, pq);

        let report = OptimizationPass::default().run(&mut host).unwrap();
        assert_eq!(report, PassReport::default());
        assert_eq!(host.rhs(stmt), pq);
    }

    #[test]
    fn reassignment_stops_inlining_of_stale_trees() {
        // t = a * b; a = c; y = t + a * c
        let mut host = MockHost::new();
        let a = host.var(1, "a", SecurityKind::SecretShared);
        let b = host.var(2, "b", SecurityKind::SecretShared);
        let c = host.var(3, "c", SecurityKind::SecretShared);
        host.var(10, "t", SecurityKind::SecretShared);
        host.var(11, "y", SecurityKind::SecretShared);

        let ab = host.call(Operator::Mul, a, b);
        host.assign(10, ab);
        host.assign(1, c);
        let t = host.var(10, "t", SecurityKind::SecretShared);
        let ac = host.call(Operator::Mul, a, c);
        let sum = host.call(Operator::Add, t, ac);
        let y_stmt = host.assign(11, sum);

        let report = OptimizationPass::default().run(&mut host).unwrap();
        assert_eq!(report.totals.factorizations, 0);
        // `a` in y now means `c`, which is inlined; `t` is not.
        assert_eq!(host.render(host.rhs(y_stmt)), "(t + (c * c))");
    }

    #[test]
    fn resolution_errors_abort_the_pass() {
        let mut host = MockHost::new();
        let a = host.var(1, "a", SecurityKind::EncryptedCiphertext);
        let b = host.var(2, "b", SecurityKind::SecretShared);
        host.var(3, "x", SecurityKind::EncryptedCiphertext);
        let ab = host.call(Operator::MatMul, a, b);
        let stmt = host.assign(3, ab);
        host.forbid(Operator::MatMul, SecurityKind::EncryptedCiphertext, SecurityKind::SecretShared);

        let err = OptimizationPass::default().run(&mut host).unwrap_err();
        assert!(matches!(err, BetError::Resolution { .. }));
        assert_eq!(host.rhs(stmt), ab);
    }
}
