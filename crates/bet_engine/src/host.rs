//! Narrow interfaces the engine consumes from the host compiler.
//!
//! The engine never sees the host IR directly. It asks the host to classify
//! values, to recognise arithmetic calls, to resolve operator implementations
//! and to synthesise calls for emitted trees.

use bet_ast::{Operator, SecurityKind, ValueId, VarKey};

/// What a non-arithmetic host value looks like from the tree's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Variable { key: VarKey, name: String },
    Int(i64),
    Float(f64),
    /// Any other value, typically a call the engine does not understand.
    Opaque { label: String },
}

pub trait HostIr {
    /// Concrete operator implementation returned by resolution.
    type Callable;

    /// Security classification of a value.
    fn classify(&self, value: ValueId) -> SecurityKind;

    /// `Some(op)` iff `value` is a call denoting one of the four arithmetic operators.
    fn operator_of(&self, value: ValueId) -> Option<Operator>;

    /// Operands of a binary call.
    fn call_operands(&self, value: ValueId) -> Option<(ValueId, ValueId)>;

    /// Leaf view of a value that is not an arithmetic call.
    fn leaf_of(&self, value: ValueId) -> LeafValue;

    /// Look up the implementation of `op` for the given operand kinds.
    fn resolve_operator(
        &self,
        op: Operator,
        lhs: SecurityKind,
        rhs: SecurityKind,
    ) -> Option<Self::Callable>;

    /// Synthesise a call of `callable` on two already emitted operands.
    fn emit_call(&mut self, callable: &Self::Callable, lhs: ValueId, rhs: ValueId) -> ValueId;
}

/// One `target = rhs` statement of a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<S> {
    pub stmt: S,
    pub target: VarKey,
    pub rhs: ValueId,
}

/// A straight-line function body the optimisation pass walks.
pub trait FunctionBody: HostIr {
    type Stmt: Copy + std::fmt::Debug;

    /// Assignments in program order, snapshotted at call time.
    fn assignments(&self) -> Vec<Assignment<Self::Stmt>>;

    /// Classification of an assigned variable.
    fn variable_kind(&self, key: VarKey) -> SecurityKind;

    /// Replace the right-hand side of an assignment.
    fn set_rhs(&mut self, stmt: Self::Stmt, rhs: ValueId);
}

/// Host hooks for shadow-execution instrumentation.
pub trait ShadowHost: FunctionBody {
    /// Insert `raw_<var> = reveal(<var>)` before `before` and return a read
    /// of the revealed variable.
    fn reveal(&mut self, before: Self::Stmt, key: VarKey) -> ValueId;

    /// Insert `raw_<target> = raw_rhs` before `stmt` and an approximate
    /// equality check between `raw_<target>` and `reveal(<target>)` after it.
    /// Returns a read of `raw_<target>`.
    fn attach_check(
        &mut self,
        stmt: Self::Stmt,
        target: VarKey,
        raw_rhs: ValueId,
        tolerance: f64,
    ) -> ValueId;
}
