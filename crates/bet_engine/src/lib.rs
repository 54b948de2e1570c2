//! Rewrite engine for binary expression trees over secure operands.
//!
//! The engine lifts arithmetic out of a host IR into a tree
//! ([`build_tree`]), rewrites it to use fewer expensive secure operations
//! ([`rewrite`]) and lowers it back ([`emit`]). [`OptimizationPass`] drives
//! this over a whole function body; [`ShadowInstrumenter`] uses the same
//! machinery to attach clear-text checks to secure assignments.

#[macro_use]
pub mod macros;

pub mod build;
pub mod cache;
pub mod emit;
pub mod error;
pub mod host;
pub mod options;
pub mod pass;
pub mod rewrite;
pub mod shadow;
pub mod substitute;

#[cfg(test)]
mod testing;

pub use build::build_tree;
pub use cache::TreeCache;
pub use emit::emit;
pub use error::{BetError, BetResult};
pub use host::{Assignment, FunctionBody, HostIr, LeafValue, ShadowHost};
pub use options::{RewriteOptions, ShadowOptions};
pub use pass::{OptimizationPass, PassReport};
pub use rewrite::{
    expand_powers, expand_variables, factorize, reduce_level, reorder_priorities, rewrite,
    RewriteReport,
};
pub use shadow::{ShadowInstrumenter, ShadowReport};
pub use substitute::substitute_leaf;
