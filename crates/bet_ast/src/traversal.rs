//! Tree traversal utilities.
//!
//! Iterative (explicit stack) so arbitrarily deep expansion chains never
//! overflow the call stack.

use std::collections::HashSet;

use crate::ensure_ast_invariant;
use crate::error::AstError;
use crate::node::{Context, Node, NodeId, VarKey};
use crate::operator::Operator;

/// Count all nodes reachable from `root`.
pub fn count_all_nodes(ctx: &Context, root: NodeId) -> usize {
    count_nodes_matching(ctx, root, |_| true)
}

/// Count reachable nodes matching a predicate.
pub fn count_nodes_matching<F>(ctx: &Context, root: NodeId, mut pred: F) -> usize
where
    F: FnMut(&Node) -> bool,
{
    let mut count = 0;
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let node = ctx.get(id);
        if pred(node) {
            count += 1;
        }
        if let Some((l, r)) = node.children() {
            stack.push(l);
            stack.push(r);
        }
    }

    count
}

/// Count operator nodes of a given kind, e.g. the number of multiplications.
pub fn count_operators(ctx: &Context, root: NodeId, op: Operator) -> usize {
    count_nodes_matching(ctx, root, |n| n.operator() == Some(op))
}

/// Total node count and maximum depth (root has depth 0).
pub fn count_nodes_and_max_depth(ctx: &Context, root: NodeId) -> (usize, usize) {
    let mut count = 0;
    let mut max_depth = 0;
    let mut stack = vec![(root, 0usize)];

    while let Some((id, depth)) = stack.pop() {
        count += 1;
        max_depth = max_depth.max(depth);
        if let Some((l, r)) = ctx.children(id) {
            stack.push((l, depth + 1));
            stack.push((r, depth + 1));
        }
    }

    (count, max_depth)
}

/// Shallowest depth at which a variable leaf with `key` occurs.
pub fn variable_depth(ctx: &Context, root: NodeId, key: VarKey) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut stack = vec![(root, 0usize)];

    while let Some((id, depth)) = stack.pop() {
        let node = ctx.get(id);
        if node.variable_key() == Some(key) {
            best = Some(best.map_or(depth, |b| b.min(depth)));
        }
        if let Some((l, r)) = node.children() {
            stack.push((l, depth + 1));
            stack.push((r, depth + 1));
        }
    }

    best
}

/// Variable keys read by the tree, in left-to-right first-occurrence order.
pub fn collect_variable_keys(ctx: &Context, root: NodeId) -> Vec<VarKey> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let node = ctx.get(id);
        if let Some(key) = node.variable_key() {
            if seen.insert(key) {
                keys.push(key);
            }
        }
        if let Some((l, r)) = node.children() {
            // Right first so the left subtree is visited first.
            stack.push(r);
            stack.push(l);
        }
    }

    keys
}

/// Leaves in left-to-right order.
pub fn collect_leaves(ctx: &Context, root: NodeId) -> Vec<NodeId> {
    let mut leaves = Vec::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        match ctx.children(id) {
            Some((l, r)) => {
                stack.push(r);
                stack.push(l);
            }
            None => leaves.push(id),
        }
    }

    leaves
}

/// Check that no node is reachable twice from `root`.
pub fn check_strict_tree(ctx: &Context, root: NodeId) -> Result<(), AstError> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        ensure_ast_invariant!(seen.insert(id), "node {} is shared within the tree", id);
        if let Some((l, r)) = ctx.children(id) {
            stack.push(l);
            stack.push(r);
        }
    }

    Ok(())
}
