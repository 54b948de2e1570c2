//! Shadow-execution instrumentation.
//!
//! Every assignment to a secure variable gets a clear-text twin: the same
//! arithmetic evaluated on revealed operands, followed by an approximate
//! equality check against the revealed secure result. A mismatch pinpoints
//! the statement where the secure computation drifted.

use bet_ast::traversal::{collect_variable_keys, count_nodes_matching};
use bet_ast::{Context, NodeKind, ValueId, VarKey};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::build::build_tree;
use crate::emit::emit;
use crate::error::BetResult;
use crate::host::{Assignment, ShadowHost};
use crate::options::ShadowOptions;
use crate::substitute::substitute_leaf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowReport {
    /// Approximate-equality checks attached.
    pub checks: usize,
    /// Variables revealed to feed the clear-text computations.
    pub reveals: usize,
    /// Secure assignments left unchecked because their right-hand side
    /// holds a secure call the engine cannot see through.
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ShadowInstrumenter {
    options: ShadowOptions,
}

impl ShadowInstrumenter {
    pub fn new(options: ShadowOptions) -> Self {
        Self { options }
    }

    pub fn run<H: ShadowHost>(&self, host: &mut H) -> BetResult<ShadowReport> {
        let mut ctx = Context::new();
        // Clear-text counterpart of each secure variable, valid at the
        // current point of the walk.
        let mut raw: FxHashMap<VarKey, ValueId> = FxHashMap::default();
        let mut report = ShadowReport::default();

        for Assignment { stmt, target, rhs } in host.assignments() {
            if !host.variable_kind(target).is_secure_container() {
                continue;
            }

            let root = build_tree(&mut ctx, &*host, rhs)?;
            let hidden = count_nodes_matching(&ctx, root, |n| {
                matches!(n.kind(), NodeKind::Opaque { .. })
                    && n.cached_security().is_some_and(|k| k.is_secure_container())
            });
            if hidden > 0 {
                trace!(?stmt, "secure call in right-hand side, not instrumented");
                raw.remove(&target);
                report.skipped += 1;
                continue;
            }

            for key in collect_variable_keys(&ctx, root) {
                if !host.variable_kind(key).is_secure_container() {
                    continue;
                }
                let value = match raw.get(&key) {
                    Some(&value) => value,
                    None => {
                        let value = host.reveal(stmt, key);
                        raw.insert(key, value);
                        report.reveals += 1;
                        value
                    }
                };
                let replacement = build_tree(&mut ctx, &*host, value)?;
                substitute_leaf(&mut ctx, root, key, replacement);
            }

            let raw_rhs = emit(&ctx, host, root)?;
            let raw_target = host.attach_check(stmt, target, raw_rhs, self.options.tolerance);
            raw.insert(target, raw_target);
            report.checks += 1;
        }

        debug!(?report, "shadow instrumentation finished");
        Ok(report)
    }
}
