//! Binary Expression Tree (BET) data model.
//!
//! Trees describe arithmetic over operands that carry a [`SecurityKind`].
//! The rewrite engine mutates them in place through [`Context`].

pub mod display;
pub mod equivalence;
pub mod error;
pub mod node;
pub mod operator;
pub mod security;
pub mod symbol;
pub mod traversal;

pub use display::{DisplayNode, TreeDump};
pub use equivalence::{is_consecutive_commutative, structurally_equal};
pub use error::AstError;
pub use node::{Context, ContextStats, Node, NodeId, NodeKind, ValueId, VarKey};
pub use operator::Operator;
pub use security::SecurityKind;
pub use symbol::{SymbolId, SymbolTable};
