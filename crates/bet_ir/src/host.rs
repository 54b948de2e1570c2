//! [`Function`] as a host of the rewrite engine.

use bet_ast::{Operator, SecurityKind, ValueId, VarKey};
use bet_engine::{Assignment, FunctionBody, HostIr, LeafValue, ShadowHost};

use crate::function::{Callee, Function, Stmt, StmtId, Value};
use crate::table::Implementation;

impl HostIr for Function {
    type Callable = Implementation;

    fn classify(&self, value: ValueId) -> SecurityKind {
        self.kind_of(value)
    }

    fn operator_of(&self, value: ValueId) -> Option<Operator> {
        match self.value(value) {
            Value::Call {
                callee: Callee::Operator(imp),
                ..
            } => Some(imp.op),
            _ => None,
        }
    }

    fn call_operands(&self, value: ValueId) -> Option<(ValueId, ValueId)> {
        match self.value(value) {
            Value::Call { args, .. } => match args[..] {
                [lhs, rhs] => Some((lhs, rhs)),
                _ => None,
            },
            _ => None,
        }
    }

    fn leaf_of(&self, value: ValueId) -> LeafValue {
        match self.value(value) {
            Value::Var(key) => LeafValue::Variable {
                key: *key,
                name: self.variable(*key).name.clone(),
            },
            Value::Int(n) => LeafValue::Int(*n),
            Value::Float(x) => LeafValue::Float(*x),
            Value::Call { callee, .. } => LeafValue::Opaque {
                label: match callee {
                    Callee::Operator(imp) => imp.op.magic_name().to_string(),
                    Callee::Named(name) => name.clone(),
                },
            },
        }
    }

    fn resolve_operator(
        &self,
        op: Operator,
        lhs: SecurityKind,
        rhs: SecurityKind,
    ) -> Option<Implementation> {
        self.table().resolve(op, lhs, rhs)
    }

    fn emit_call(&mut self, callable: &Implementation, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.push_value(Value::Call {
            callee: Callee::Operator(*callable),
            args: vec![lhs, rhs],
            ty: callable.result,
        })
    }
}

impl FunctionBody for Function {
    type Stmt = StmtId;

    fn assignments(&self) -> Vec<Assignment<StmtId>> {
        self.body()
            .filter_map(|(stmt, s)| match s {
                Stmt::Assign { target, rhs } => Some(Assignment {
                    stmt,
                    target: *target,
                    rhs: *rhs,
                }),
                _ => None,
            })
            .collect()
    }

    fn variable_kind(&self, key: VarKey) -> SecurityKind {
        self.variable(key).kind
    }

    fn set_rhs(&mut self, stmt: StmtId, rhs: ValueId) {
        if let Stmt::Assign { rhs: slot, .. } = self.stmt_mut(stmt) {
            *slot = rhs;
        }
    }
}

impl ShadowHost for Function {
    fn reveal(&mut self, before: StmtId, key: VarKey) -> ValueId {
        let name = format!("raw_{}", self.variable(key).name);
        let raw = self.declare(&name, SecurityKind::Plaintext);
        let secure = self.read(key);
        let revealed = self.call_named("reveal", vec![secure]);
        self.insert_before(before, Stmt::Assign { target: raw, rhs: revealed });
        self.read(raw)
    }

    fn attach_check(&mut self, stmt: StmtId, target: VarKey, raw_rhs: ValueId, tolerance: f64) -> ValueId {
        let name = self.variable(target).name.clone();
        let raw = self.declare(&format!("raw_{}", name), SecurityKind::Plaintext);
        self.insert_before(stmt, Stmt::Assign { target: raw, rhs: raw_rhs });

        let expected = self.read(raw);
        let secure = self.read(target);
        let actual = self.call_named("reveal", vec![secure]);
        let label = format!("{}:{}", self.name(), name);
        self.insert_after(
            stmt,
            Stmt::AssertApprox {
                label,
                lhs: expected,
                rhs: actual,
                tolerance,
            },
        );
        self.read(raw)
    }
}
