//! Source-like rendering of a [`Function`].
//!
//! Operator calls nested inside another operator call are parenthesized;
//! `AssertApprox` renders as `assert_approx(label, lhs, rhs, tolerance)`.

use std::fmt;

use bet_ast::{Operator, ValueId};

use crate::function::{Callee, Function, Stmt, Value};

fn operator_symbol(op: Operator) -> &'static str {
    match op {
        Operator::Pow => "**",
        other => other.symbol(),
    }
}

/// Renders one value of a function.
pub struct DisplayValue<'a> {
    func: &'a Function,
    id: ValueId,
    nested: bool,
}

impl<'a> DisplayValue<'a> {
    pub fn new(func: &'a Function, id: ValueId) -> Self {
        Self {
            func,
            id,
            nested: false,
        }
    }

    fn child(&self, id: ValueId) -> Self {
        Self {
            func: self.func,
            id,
            nested: true,
        }
    }
}

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.func.value(self.id) {
            Value::Var(key) => f.write_str(&self.func.variable(*key).name),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Call {
                callee: Callee::Operator(imp),
                args,
                ..
            } => {
                if self.nested {
                    f.write_str("(")?;
                }
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", operator_symbol(imp.op))?;
                    }
                    write!(f, "{}", self.child(arg))?;
                }
                if self.nested {
                    f.write_str(")")?;
                }
                Ok(())
            }
            Value::Call {
                callee: Callee::Named(name),
                args,
                ..
            } => {
                write!(f, "{}(", name)?;
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    // Call arguments are delimited already.
                    write!(f, "{}", DisplayValue::new(self.func, arg))?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name())?;
        for (i, &key) in self.params().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let var = self.variable(key);
            write!(f, "{}: {}", var.name, var.kind.keyword())?;
        }
        writeln!(f, ") {{")?;

        for (_, stmt) in self.body() {
            match stmt {
                Stmt::Assign { target, rhs } => writeln!(
                    f,
                    "    {} = {};",
                    self.variable(*target).name,
                    DisplayValue::new(self, *rhs)
                )?,
                Stmt::AssertApprox {
                    label,
                    lhs,
                    rhs,
                    tolerance,
                } => writeln!(
                    f,
                    "    assert_approx({:?}, {}, {}, {});",
                    label,
                    DisplayValue::new(self, *lhs),
                    DisplayValue::new(self, *rhs),
                    tolerance
                )?,
                Stmt::Return(value) => writeln!(f, "    return {};", DisplayValue::new(self, *value))?,
            }
        }
        f.write_str("}")
    }
}
