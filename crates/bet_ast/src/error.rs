//! Error types for bet_ast crate.

use thiserror::Error;

/// Contract violations detected while inspecting or mutating the arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    /// An operator-only accessor was used on a leaf.
    #[error("expected an operator node, found leaf {0}")]
    NotAnOperator(String),

    /// Internal invariant violation
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Return `Err(AstError::InternalError)` when an arena invariant does not hold.
#[macro_export]
macro_rules! ensure_ast_invariant {
    ($cond:expr, $msg:literal $(, $args:expr)* $(,)?) => {
        if !$cond {
            return Err($crate::error::AstError::InternalError(format!($msg $(, $args)*)));
        }
    };
}
