//! A small straight-line IR hosting the BET rewrite engine.
//!
//! Functions are parsed from a compact text form ([`parse`]), optimised or
//! instrumented in place through the engine's host traits, and run by a
//! clear-text interpreter ([`execute`]) that treats every secure container
//! as its plain value.

pub mod display;
pub mod error;
pub mod function;
pub mod host;
pub mod interp;
pub mod parser;
pub mod table;

pub use display::DisplayValue;
pub use error::IrError;
pub use function::{Callee, Function, Stmt, StmtId, Value, Variable};
pub use interp::{execute, Execution, FailedCheck};
pub use parser::{parse, parse_function};
pub use table::{Implementation, OperatorTable};
