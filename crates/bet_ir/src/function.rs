//! Straight-line typed functions.
//!
//! Values live in an append-only arena and are pure expressions: a `Var`
//! value reads the variable when the statement using it executes. The same
//! value may therefore be used by several statements.

use bet_ast::{Operator, SecurityKind, ValueId, VarKey};

use crate::error::IrError;
use crate::table::{Implementation, OperatorTable};

/// Stable statement handle. Survives insertions around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub key: VarKey,
    pub name: String,
    pub kind: SecurityKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Operator(Implementation),
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Var(VarKey),
    Int(i64),
    Float(f64),
    Call {
        callee: Callee,
        args: Vec<ValueId>,
        ty: SecurityKind,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign { target: VarKey, rhs: ValueId },
    /// Fails at run time when `|lhs - rhs| > tolerance`.
    AssertApprox {
        label: String,
        lhs: ValueId,
        rhs: ValueId,
        tolerance: f64,
    },
    Return(ValueId),
}

#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    params: Vec<VarKey>,
    vars: Vec<Variable>,
    values: Vec<Value>,
    stmts: Vec<Stmt>,
    order: Vec<StmtId>,
    table: OperatorTable,
}

impl Function {
    pub fn new(name: &str, table: OperatorTable) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            vars: Vec::new(),
            values: Vec::new(),
            stmts: Vec::new(),
            order: Vec::new(),
            table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &OperatorTable {
        &self.table
    }

    /// Swap the operator table. Existing calls keep their implementation.
    pub fn set_table(&mut self, table: OperatorTable) {
        self.table = table;
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Declare a fresh variable. Names need not be unique.
    pub fn declare(&mut self, name: &str, kind: SecurityKind) -> VarKey {
        let key = VarKey(self.vars.len() as u64);
        self.vars.push(Variable {
            key,
            name: name.to_string(),
            kind,
        });
        key
    }

    pub fn add_param(&mut self, name: &str, kind: SecurityKind) -> VarKey {
        let key = self.declare(name, kind);
        self.params.push(key);
        key
    }

    pub fn params(&self) -> &[VarKey] {
        &self.params
    }

    /// # Panics
    /// Panics if `key` was not declared in this function.
    pub fn variable(&self, key: VarKey) -> &Variable {
        &self.vars[key.0 as usize]
    }

    /// Most recently declared variable called `name`.
    pub fn lookup(&self, name: &str) -> Option<VarKey> {
        self.vars.iter().rev().find(|v| v.name == name).map(|v| v.key)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    pub fn push_value(&mut self, value: Value) -> ValueId {
        self.values.push(value);
        ValueId(self.values.len() as u32 - 1)
    }

    /// # Panics
    /// Panics if `id` was not produced by this function.
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0 as usize]
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn read(&mut self, key: VarKey) -> ValueId {
        self.push_value(Value::Var(key))
    }

    pub fn int(&mut self, n: i64) -> ValueId {
        self.push_value(Value::Int(n))
    }

    pub fn float(&mut self, x: f64) -> ValueId {
        self.push_value(Value::Float(x))
    }

    /// Call of the overload of `op` matching the operand kinds.
    pub fn call_operator(&mut self, op: Operator, lhs: ValueId, rhs: ValueId) -> Result<ValueId, IrError> {
        let (l, r) = (self.kind_of(lhs), self.kind_of(rhs));
        let imp = self
            .table
            .resolve(op, l, r)
            .ok_or(IrError::NoImplementation { op, lhs: l, rhs: r })?;
        Ok(self.push_value(Value::Call {
            callee: Callee::Operator(imp),
            args: vec![lhs, rhs],
            ty: imp.result,
        }))
    }

    /// Call of a non-arithmetic function. `reveal` yields plaintext; anything
    /// else is typed by folding the realization rule over its arguments.
    pub fn call_named(&mut self, name: &str, args: Vec<ValueId>) -> ValueId {
        let ty = if name == "reveal" {
            SecurityKind::Plaintext
        } else {
            args.iter()
                .map(|&a| self.kind_of(a))
                .reduce(SecurityKind::realize)
                .unwrap_or_default()
        };
        self.push_value(Value::Call {
            callee: Callee::Named(name.to_string()),
            args,
            ty,
        })
    }

    /// Security kind of a value.
    pub fn kind_of(&self, id: ValueId) -> SecurityKind {
        match self.value(id) {
            Value::Var(key) => self.variable(*key).kind,
            Value::Int(_) | Value::Float(_) => SecurityKind::Plaintext,
            Value::Call { ty, .. } => *ty,
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.push(stmt);
        StmtId(self.stmts.len() as u32 - 1)
    }

    /// Append at the end of the body.
    pub fn push_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = self.alloc_stmt(stmt);
        self.order.push(id);
        id
    }

    pub fn insert_before(&mut self, anchor: StmtId, stmt: Stmt) -> StmtId {
        let id = self.alloc_stmt(stmt);
        let at = self.position(anchor).unwrap_or(self.order.len());
        self.order.insert(at, id);
        id
    }

    pub fn insert_after(&mut self, anchor: StmtId, stmt: Stmt) -> StmtId {
        let id = self.alloc_stmt(stmt);
        let at = self.position(anchor).map_or(self.order.len(), |p| p + 1);
        self.order.insert(at, id);
        id
    }

    fn position(&self, id: StmtId) -> Option<usize> {
        self.order.iter().position(|&s| s == id)
    }

    /// # Panics
    /// Panics if `id` was not produced by this function.
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    pub(crate) fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.0 as usize]
    }

    /// Statements in program order.
    pub fn body(&self) -> impl Iterator<Item = (StmtId, &Stmt)> + '_ {
        self.order.iter().map(move |&id| (id, self.stmt(id)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Right-hand side of the last assignment to a variable called `name`.
    pub fn assigned_value(&self, name: &str) -> Option<ValueId> {
        self.body()
            .filter_map(|(_, stmt)| match stmt {
                Stmt::Assign { target, rhs } if self.variable(*target).name == name => Some(*rhs),
                _ => None,
            })
            .last()
    }
}
