//! Operator implementations available to the IR, keyed by operand kinds.

use std::fmt;

use bet_ast::{Operator, SecurityKind};
use rustc_hash::FxHashMap;

/// A concrete operator overload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Implementation {
    pub op: Operator,
    pub lhs: SecurityKind,
    pub rhs: SecurityKind,
    pub result: SecurityKind,
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({}, {}) -> {}",
            self.lhs.type_name(),
            self.op.magic_name(),
            self.lhs.type_name(),
            self.rhs.type_name(),
            self.result.type_name()
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    impls: FxHashMap<(Operator, SecurityKind, SecurityKind), Implementation>,
}

impl OperatorTable {
    /// Empty table: nothing resolves.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operator on every pair of kinds, typed by the realization rule.
    pub fn full() -> Self {
        let mut table = Self::new();
        for op in Operator::ALL {
            for lhs in SecurityKind::ALL {
                for rhs in SecurityKind::ALL {
                    table.register(op, lhs, rhs, SecurityKind::realize(lhs, rhs));
                }
            }
        }
        table
    }

    pub fn register(
        &mut self,
        op: Operator,
        lhs: SecurityKind,
        rhs: SecurityKind,
        result: SecurityKind,
    ) -> &mut Self {
        self.impls.insert(
            (op, lhs, rhs),
            Implementation {
                op,
                lhs,
                rhs,
                result,
            },
        );
        self
    }

    /// Drop one overload, e.g. to model a runtime that lacks it.
    pub fn without(mut self, op: Operator, lhs: SecurityKind, rhs: SecurityKind) -> Self {
        self.impls.remove(&(op, lhs, rhs));
        self
    }

    pub fn resolve(&self, op: Operator, lhs: SecurityKind, rhs: SecurityKind) -> Option<Implementation> {
        self.impls.get(&(op, lhs, rhs)).copied()
    }

    pub fn len(&self) -> usize {
        self.impls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.impls.is_empty()
    }
}
