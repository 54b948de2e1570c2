//! Binary expression tree nodes and their arena.
//!
//! # Design
//! - Nodes are stored in a `Context` and addressed by `NodeId`.
//! - Unlike a hash-consed expression store, nodes here are *mutable*: rewrite
//!   passes splice subtrees in place with [`Context::replace`] and friends.
//! - A tree reachable from a root is expected to be strict (no node reachable
//!   twice). Anything that must appear in two places is duplicated with
//!   [`Context::deep_copy`].
//! - Nodes orphaned by a rewrite stay in the arena until the `Context` is
//!   dropped. A context lives for one pass over one function body.

use std::cell::Cell;
use std::fmt;

use crate::error::AstError;
use crate::operator::Operator;
use crate::security::SecurityKind;
use crate::symbol::{SymbolId, SymbolTable};

/// Index of a node inside a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identity of a host variable, shared by every leaf reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarKey(pub u64);

/// Opaque handle to a host value, used to regenerate code for leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    /// Read of a host variable.
    Variable { key: VarKey, name: SymbolId },
    Int(i64),
    Float(f64),
    /// A host call the engine does not understand. Kept whole, never descended.
    Opaque { label: SymbolId },
    Operator {
        op: Operator,
        left: NodeId,
        right: NodeId,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    value: Option<ValueId>,
    /// Leaves: classification reported by the host at build time.
    /// Operators: memo of the realization rule, cleared on child mutation.
    security: Cell<Option<SecurityKind>>,
    expanded: bool,
}

impl Node {
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Host value this node was built from (always present on leaves).
    #[inline]
    pub fn value(&self) -> Option<ValueId> {
        self.value
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        !self.is_operator()
    }

    #[inline]
    pub fn is_operator(&self) -> bool {
        matches!(self.kind, NodeKind::Operator { .. })
    }

    #[inline]
    pub fn operator(&self) -> Option<Operator> {
        match self.kind {
            NodeKind::Operator { op, .. } => Some(op),
            _ => None,
        }
    }

    #[inline]
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Operator { left, right, .. } => Some((left, right)),
            _ => None,
        }
    }

    #[inline]
    pub fn int_const(&self) -> Option<i64> {
        match self.kind {
            NodeKind::Int(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn variable_key(&self) -> Option<VarKey> {
        match self.kind {
            NodeKind::Variable { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Memoised classification, if already realised.
    #[inline]
    pub fn cached_security(&self) -> Option<SecurityKind> {
        self.security.get()
    }
}

/// Arena statistics, mostly for tests and benches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    pub nodes_created: usize,
    pub deep_copies: usize,
    pub replacements: usize,
}

#[derive(Debug, Default)]
pub struct Context {
    nodes: Vec<Node>,
    symbols: SymbolTable,
    stats: ContextStats,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.stats.nodes_created += 1;
        id
    }

    fn leaf(&mut self, kind: NodeKind, value: Option<ValueId>, security: SecurityKind) -> NodeId {
        self.push(Node {
            kind,
            value,
            security: Cell::new(Some(security)),
            expanded: false,
        })
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn variable(
        &mut self,
        key: VarKey,
        name: &str,
        value: Option<ValueId>,
        security: SecurityKind,
    ) -> NodeId {
        let name = self.symbols.intern(name);
        self.leaf(NodeKind::Variable { key, name }, value, security)
    }

    pub fn int(&mut self, n: i64, value: Option<ValueId>) -> NodeId {
        self.leaf(NodeKind::Int(n), value, SecurityKind::Plaintext)
    }

    pub fn float(&mut self, x: f64, value: Option<ValueId>) -> NodeId {
        self.leaf(NodeKind::Float(x), value, SecurityKind::Plaintext)
    }

    /// Leaf standing for an unrecognised host call. Marked expanded so
    /// variable inlining never looks inside.
    pub fn opaque(&mut self, label: &str, value: ValueId, security: SecurityKind) -> NodeId {
        let label = self.symbols.intern(label);
        let id = self.leaf(NodeKind::Opaque { label }, Some(value), security);
        self.nodes[id.index()].expanded = true;
        id
    }

    pub fn operator(&mut self, op: Operator, left: NodeId, right: NodeId) -> NodeId {
        self.push(Node {
            kind: NodeKind::Operator { op, left, right },
            value: None,
            security: Cell::new(None),
            expanded: false,
        })
    }

    pub fn add(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.operator(Operator::Add, left, right)
    }

    pub fn mul(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.operator(Operator::Mul, left, right)
    }

    pub fn matmul(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.operator(Operator::MatMul, left, right)
    }

    pub fn pow(&mut self, base: NodeId, exp: NodeId) -> NodeId {
        self.operator(Operator::Pow, base, exp)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// # Panics
    /// Panics if `id` was not produced by this context.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Number of nodes ever allocated, reachable or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> ContextStats {
        self.stats
    }

    #[inline]
    pub fn sym_name(&self, id: SymbolId) -> &str {
        self.symbols.resolve(id)
    }

    pub fn variable_name(&self, id: NodeId) -> Option<&str> {
        match self.get(id).kind {
            NodeKind::Variable { name, .. } => Some(self.sym_name(name)),
            _ => None,
        }
    }

    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.get(id).is_leaf()
    }

    #[inline]
    pub fn is_operator(&self, id: NodeId) -> bool {
        self.get(id).is_operator()
    }

    #[inline]
    pub fn operator_of(&self, id: NodeId) -> Option<Operator> {
        self.get(id).operator()
    }

    #[inline]
    pub fn is_op(&self, id: NodeId, op: Operator) -> bool {
        self.operator_of(id) == Some(op)
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        self.get(id).children()
    }

    /// Children of an operator node, or an error naming the offending leaf.
    pub fn operands(&self, id: NodeId) -> Result<(NodeId, NodeId), AstError> {
        self.children(id)
            .ok_or_else(|| AstError::NotAnOperator(crate::display::DisplayNode::new(self, id).to_string()))
    }

    #[inline]
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.get(id).expanded
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    /// Classification of `id`, realising operator memos on demand.
    #[inline]
    pub fn security(&self, id: NodeId) -> SecurityKind {
        self.realize(id, false)
    }

    /// Resolve the classification of `id` by the realization rule.
    ///
    /// With `force`, every operator memo in the subtree is recomputed, which
    /// is required after a rewrite changed the shape below an ancestor whose
    /// memo was not cleared.
    pub fn realize(&self, id: NodeId, force: bool) -> SecurityKind {
        let node = self.get(id);
        match node.kind {
            NodeKind::Operator { left, right, .. } => {
                if !force {
                    if let Some(kind) = node.security.get() {
                        return kind;
                    }
                }
                let lhs = self.realize(left, force);
                let rhs = self.realize(right, force);
                let kind = SecurityKind::realize(lhs, rhs);
                node.security.set(Some(kind));
                kind
            }
            _ => node.security.get().unwrap_or_default(),
        }
    }

    #[inline]
    pub fn is_secure_container(&self, id: NodeId) -> bool {
        self.security(id).is_secure_container()
    }

    #[inline]
    pub fn is_ciphertext(&self, id: NodeId) -> bool {
        self.security(id).is_ciphertext()
    }

    #[inline]
    pub fn is_encrypted_plaintext(&self, id: NodeId) -> bool {
        self.security(id).is_encrypted_plaintext()
    }

    /// Drop the memo of an operator node. Leaves keep their host classification.
    pub fn invalidate(&self, id: NodeId) {
        let node = self.get(id);
        if node.is_operator() {
            node.security.set(None);
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn set_expanded(&mut self, id: NodeId) {
        self.nodes[id.index()].expanded = true;
    }

    pub fn set_left(&mut self, id: NodeId, child: NodeId) -> Result<(), AstError> {
        let (_, right) = self.operands(id)?;
        self.set_children(id, child, right)
    }

    pub fn set_right(&mut self, id: NodeId, child: NodeId) -> Result<(), AstError> {
        let (left, _) = self.operands(id)?;
        self.set_children(id, left, child)
    }

    fn set_children(&mut self, id: NodeId, left: NodeId, right: NodeId) -> Result<(), AstError> {
        let node = &mut self.nodes[id.index()];
        match &mut node.kind {
            NodeKind::Operator { left: l, right: r, .. } => {
                *l = left;
                *r = right;
            }
            _ => return Err(AstError::NotAnOperator(id.to_string())),
        }
        node.security.set(None);
        Ok(())
    }

    /// Turn `id` into an operator node in place, dropping any leaf payload.
    pub fn set_operator(&mut self, id: NodeId, op: Operator, left: NodeId, right: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.kind = NodeKind::Operator { op, left, right };
        node.value = None;
        node.security.set(None);
    }

    /// Overwrite `dst` with the fields of `src` (shallow: children are shared).
    ///
    /// `src` must not stay reachable from the same tree afterwards, otherwise
    /// its children end up with two parents.
    pub fn replace(&mut self, dst: NodeId, src: NodeId) {
        if dst == src {
            return;
        }
        self.realize(src, false);
        let src_node = self.nodes[src.index()].clone();
        self.nodes[dst.index()] = src_node;
        self.stats.replacements += 1;
    }

    /// Move the fields of `id` into a freshly allocated node and return it.
    /// `id` keeps a stale copy that the caller is expected to overwrite.
    pub fn relocate(&mut self, id: NodeId) -> NodeId {
        let node = self.nodes[id.index()].clone();
        self.push(node)
    }

    /// Structural copy of the subtree rooted at `id` with fresh node ids.
    ///
    /// Flags and classification memos are carried over.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        self.stats.deep_copies += 1;
        self.copy_rec(id)
    }

    fn copy_rec(&mut self, id: NodeId) -> NodeId {
        let mut node = self.nodes[id.index()].clone();
        if let NodeKind::Operator { op, left, right } = node.kind {
            let left = self.copy_rec(left);
            let right = self.copy_rec(right);
            node.kind = NodeKind::Operator { op, left, right };
        }
        self.push(node)
    }
}
