use bet_ast::{Operator, SecurityKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unconsumed input: {0}")]
    UnconsumedInput(String),

    #[error("unknown security kind `{0}`")]
    UnknownKind(String),

    #[error("variable `{0}` is read before it is assigned")]
    UnknownVariable(String),

    #[error("`{name}` is declared {declared} but assigned a {found} value")]
    KindMismatch {
        name: String,
        declared: SecurityKind,
        found: SecurityKind,
    },

    #[error("{op} not found in type {lhs} with arguments ({lhs}, {rhs})")]
    NoImplementation {
        op: Operator,
        lhs: SecurityKind,
        rhs: SecurityKind,
    },

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{name}` expects {expected} arguments, got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("function takes {expected} arguments, got {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("function `{0}` has no return statement")]
    MissingReturn(String),
}
