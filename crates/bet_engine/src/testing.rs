//! In-memory host used by the unit tests of this crate.

use bet_ast::{Operator, SecurityKind, ValueId, VarKey};
use rustc_hash::FxHashMap;

use crate::host::{Assignment, FunctionBody, HostIr, LeafValue, ShadowHost};

#[derive(Debug, Clone)]
pub(crate) enum MockValue {
    Var {
        key: VarKey,
        name: String,
        kind: SecurityKind,
    },
    Int(i64),
    Call {
        op: Operator,
        lhs: ValueId,
        rhs: ValueId,
        kind: SecurityKind,
    },
    Named {
        name: String,
        lhs: ValueId,
        rhs: ValueId,
        kind: SecurityKind,
    },
}

#[derive(Debug, Default)]
pub(crate) struct MockHost {
    values: Vec<MockValue>,
    forbidden: Vec<(Operator, SecurityKind, SecurityKind)>,
    stmts: Vec<(VarKey, ValueId)>,
    var_kinds: FxHashMap<VarKey, SecurityKind>,
    pub(crate) events: Vec<String>,
}

impl MockHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, value: MockValue) -> ValueId {
        self.values.push(value);
        ValueId(self.values.len() as u32 - 1)
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn var(&mut self, key: u64, name: &str, kind: SecurityKind) -> ValueId {
        self.var_kinds.insert(VarKey(key), kind);
        self.push(MockValue::Var {
            key: VarKey(key),
            name: name.to_string(),
            kind,
        })
    }

    pub(crate) fn int(&mut self, n: i64) -> ValueId {
        self.push(MockValue::Int(n))
    }

    pub(crate) fn call(&mut self, op: Operator, lhs: ValueId, rhs: ValueId) -> ValueId {
        let kind = SecurityKind::realize(self.classify(lhs), self.classify(rhs));
        self.push(MockValue::Call { op, lhs, rhs, kind })
    }

    pub(crate) fn named(&mut self, name: &str, lhs: ValueId, rhs: ValueId, kind: SecurityKind) -> ValueId {
        self.push(MockValue::Named {
            name: name.to_string(),
            lhs,
            rhs,
            kind,
        })
    }

    pub(crate) fn assign(&mut self, target: u64, rhs: ValueId) -> usize {
        self.stmts.push((VarKey(target), rhs));
        self.stmts.len() - 1
    }

    pub(crate) fn rhs(&self, stmt: usize) -> ValueId {
        self.stmts[stmt].1
    }

    pub(crate) fn forbid(&mut self, op: Operator, lhs: SecurityKind, rhs: SecurityKind) {
        self.forbidden.push((op, lhs, rhs));
    }

    pub(crate) fn render(&self, value: ValueId) -> String {
        match &self.values[value.0 as usize] {
            MockValue::Var { name, .. } => name.clone(),
            MockValue::Int(n) => n.to_string(),
            MockValue::Call { op, lhs, rhs, .. } => {
                format!("({} {} {})", self.render(*lhs), op.symbol(), self.render(*rhs))
            }
            MockValue::Named { name, lhs, rhs, .. } => {
                format!("{}({}, {})", name, self.render(*lhs), self.render(*rhs))
            }
        }
    }
}

impl HostIr for MockHost {
    type Callable = (Operator, SecurityKind, SecurityKind);

    fn classify(&self, value: ValueId) -> SecurityKind {
        match &self.values[value.0 as usize] {
            MockValue::Var { kind, .. }
            | MockValue::Call { kind, .. }
            | MockValue::Named { kind, .. } => *kind,
            MockValue::Int(_) => SecurityKind::Plaintext,
        }
    }

    fn operator_of(&self, value: ValueId) -> Option<Operator> {
        match &self.values[value.0 as usize] {
            MockValue::Call { op, .. } => Some(*op),
            _ => None,
        }
    }

    fn call_operands(&self, value: ValueId) -> Option<(ValueId, ValueId)> {
        match &self.values[value.0 as usize] {
            MockValue::Call { lhs, rhs, .. } | MockValue::Named { lhs, rhs, .. } => Some((*lhs, *rhs)),
            _ => None,
        }
    }

    fn leaf_of(&self, value: ValueId) -> LeafValue {
        match &self.values[value.0 as usize] {
            MockValue::Var { key, name, .. } => LeafValue::Variable {
                key: *key,
                name: name.clone(),
            },
            MockValue::Int(n) => LeafValue::Int(*n),
            MockValue::Call { op, .. } => LeafValue::Opaque {
                label: op.magic_name().to_string(),
            },
            MockValue::Named { name, .. } => LeafValue::Opaque { label: name.clone() },
        }
    }

    fn resolve_operator(
        &self,
        op: Operator,
        lhs: SecurityKind,
        rhs: SecurityKind,
    ) -> Option<Self::Callable> {
        if self.forbidden.contains(&(op, lhs, rhs)) {
            None
        } else {
            Some((op, lhs, rhs))
        }
    }

    fn emit_call(&mut self, callable: &Self::Callable, lhs: ValueId, rhs: ValueId) -> ValueId {
        let (op, l, r) = *callable;
        self.push(MockValue::Call {
            op,
            lhs,
            rhs,
            kind: SecurityKind::realize(l, r),
        })
    }
}

impl FunctionBody for MockHost {
    type Stmt = usize;

    fn assignments(&self) -> Vec<Assignment<usize>> {
        self.stmts
            .iter()
            .enumerate()
            .map(|(stmt, &(target, rhs))| Assignment { stmt, target, rhs })
            .collect()
    }

    fn variable_kind(&self, key: VarKey) -> SecurityKind {
        self.var_kinds.get(&key).copied().unwrap_or_default()
    }

    fn set_rhs(&mut self, stmt: usize, rhs: ValueId) {
        self.stmts[stmt].1 = rhs;
    }
}

impl ShadowHost for MockHost {
    fn reveal(&mut self, before: usize, key: VarKey) -> ValueId {
        self.events.push(format!("reveal {} before {}", key.0, before));
        self.var(key.0 + 1000, &format!("raw_{}", key.0), SecurityKind::Plaintext)
    }

    fn attach_check(&mut self, stmt: usize, target: VarKey, raw_rhs: ValueId, tolerance: f64) -> ValueId {
        let event = format!(
            "check {} at {} = {} within {}",
            target.0,
            stmt,
            self.render(raw_rhs),
            tolerance
        );
        self.events.push(event);
        self.var(target.0 + 1000, &format!("raw_{}", target.0), SecurityKind::Plaintext)
    }
}
