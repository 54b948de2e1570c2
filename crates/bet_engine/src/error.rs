use bet_ast::{AstError, SecurityKind};
use thiserror::Error;

/// Fatal engine errors. Any of these aborts the enclosing pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BetError {
    /// The input tree does not satisfy the engine's contract.
    #[error("precondition violation: {0}")]
    PreconditionViolation(String),

    /// No concrete operator implementation for the resolved operand kinds.
    #[error("{operator} not found in type {lhs} with arguments ({lhs}, {rhs})")]
    Resolution {
        operator: String,
        lhs: SecurityKind,
        rhs: SecurityKind,
    },
}

impl From<AstError> for BetError {
    fn from(err: AstError) -> Self {
        BetError::PreconditionViolation(err.to_string())
    }
}

pub type BetResult<T> = Result<T, BetError>;
