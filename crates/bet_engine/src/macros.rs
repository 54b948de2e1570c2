/// Return `Err(BetError::PreconditionViolation)` when a contract does not hold.
#[macro_export]
macro_rules! ensure_invariant {
    ($cond:expr, $msg:literal $(, $args:expr)* $(,)?) => {
        if !$cond {
            return Err($crate::error::BetError::PreconditionViolation(format!($msg $(, $args)*)));
        }
    };
}
