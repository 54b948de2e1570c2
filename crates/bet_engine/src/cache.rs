//! Variable to tree cache, scoped to one pass over one function body.

use bet_ast::traversal::count_nodes_matching;
use bet_ast::{Context, NodeId, NodeKind, VarKey};
use rustc_hash::FxHashMap;

/// Most recently built tree for each assigned variable.
///
/// Passed by reference into every rewrite; there is no global instance.
#[derive(Debug, Default, Clone)]
pub struct TreeCache {
    entries: FxHashMap<VarKey, NodeId>,
}

impl TreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: VarKey) -> Option<NodeId> {
        self.entries.get(&key).copied()
    }

    #[inline]
    pub fn contains(&self, key: VarKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Record `root` as the tree of `key`, returning the overwritten entry.
    pub fn insert(&mut self, key: VarKey, root: NodeId) -> Option<NodeId> {
        self.entries.insert(key, root)
    }

    pub fn remove(&mut self, key: VarKey) -> Option<NodeId> {
        self.entries.remove(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry whose tree may read `key`.
    ///
    /// Called when `key` is reassigned: inlining those trees afterwards would
    /// read the new value. Opaque leaves hide their operands, so trees holding
    /// one are dropped as well. Returns the number of dropped entries.
    pub fn invalidate_readers(&mut self, ctx: &Context, key: VarKey) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, &mut root| {
            !reads_variable(ctx, root, key) && !has_opaque_leaf(ctx, root)
        });
        before - self.entries.len()
    }
}

fn has_opaque_leaf(ctx: &Context, root: NodeId) -> bool {
    count_nodes_matching(ctx, root, |n| matches!(n.kind(), NodeKind::Opaque { .. })) > 0
}

/// True iff a variable leaf with `key` is reachable from `root`.
pub fn reads_variable(ctx: &Context, root: NodeId, key: VarKey) -> bool {
    count_nodes_matching(ctx, root, |n| n.variable_key() == Some(key)) > 0
}
