//! Clear-text interpreter.
//!
//! Every security kind is modelled by an `f64`; secure containers and
//! `reveal` are identities. `@` is scalar multiplication. Approximate
//! equality checks never abort execution, failures are collected.

use bet_ast::{Operator, ValueId, VarKey};
use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::error::IrError;
use crate::function::{Callee, Function, Stmt, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct FailedCheck {
    pub label: String,
    pub expected: f64,
    pub actual: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub result: f64,
    /// Number of approximate-equality checks evaluated.
    pub checks: usize,
    pub failed_checks: Vec<FailedCheck>,
}

impl Execution {
    pub fn all_checks_passed(&self) -> bool {
        self.failed_checks.is_empty()
    }
}

struct Interpreter<'f> {
    func: &'f Function,
    env: FxHashMap<VarKey, f64>,
}

impl Interpreter<'_> {
    fn eval(&self, id: ValueId) -> Result<f64, IrError> {
        match self.func.value(id) {
            Value::Int(n) => Ok(*n as f64),
            Value::Float(x) => Ok(*x),
            Value::Var(key) => self
                .env
                .get(key)
                .copied()
                .ok_or_else(|| IrError::UnknownVariable(self.func.variable(*key).name.clone())),
            Value::Call { callee, args, .. } => {
                let args = args
                    .iter()
                    .map(|&a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                match callee {
                    Callee::Operator(imp) => {
                        let [l, r] = args[..] else {
                            return Err(IrError::Arity {
                                name: imp.op.magic_name().to_string(),
                                expected: 2,
                                found: args.len(),
                            });
                        };
                        Ok(match imp.op {
                            Operator::Add => l + r,
                            Operator::Mul | Operator::MatMul => l * r,
                            Operator::Pow => l.powf(r),
                        })
                    }
                    Callee::Named(name) => apply_named(name, &args),
                }
            }
        }
    }
}

fn apply_named(name: &str, args: &[f64]) -> Result<f64, IrError> {
    let arity = |expected: usize| {
        if args.len() == expected {
            Ok(())
        } else {
            Err(IrError::Arity {
                name: name.to_string(),
                expected,
                found: args.len(),
            })
        }
    };

    match name {
        "reveal" => {
            arity(1)?;
            Ok(args[0])
        }
        "sqrt" => {
            arity(1)?;
            Ok(args[0].sqrt())
        }
        "exp" => {
            arity(1)?;
            Ok(args[0].exp())
        }
        "__sub__" => {
            arity(2)?;
            Ok(args[0] - args[1])
        }
        other => Err(IrError::UnknownFunction(other.to_string())),
    }
}

/// Run `func` on `args`, bound to its parameters in order.
pub fn execute(func: &Function, args: &[f64]) -> Result<Execution, IrError> {
    if args.len() != func.params().len() {
        return Err(IrError::ArgumentCount {
            expected: func.params().len(),
            found: args.len(),
        });
    }

    let mut interp = Interpreter {
        func,
        env: func.params().iter().copied().zip(args.iter().copied()).collect(),
    };
    let mut checks = 0;
    let mut failed_checks = Vec::new();

    for (id, stmt) in func.body() {
        match stmt {
            Stmt::Assign { target, rhs } => {
                let v = interp.eval(*rhs)?;
                trace!(stmt = id.0, var = %func.variable(*target).name, value = v, "assign");
                interp.env.insert(*target, v);
            }
            Stmt::AssertApprox {
                label,
                lhs,
                rhs,
                tolerance,
            } => {
                checks += 1;
                let expected = interp.eval(*lhs)?;
                let actual = interp.eval(*rhs)?;
                let within = (expected - actual).abs() <= *tolerance;
                if !within {
                    warn!(%label, expected, actual, "shadow check failed");
                    failed_checks.push(FailedCheck {
                        label: label.clone(),
                        expected,
                        actual,
                        tolerance: *tolerance,
                    });
                }
            }
            Stmt::Return(value) => {
                return Ok(Execution {
                    result: interp.eval(*value)?,
                    checks,
                    failed_checks,
                });
            }
        }
    }

    Err(IrError::MissingReturn(func.name().to_string()))
}
