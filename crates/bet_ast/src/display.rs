//! Infix rendering of trees for logs, diagnostics and tests.
//!
//! Parenthesisation is left-associative: `(a * b) * c` renders as
//! `a * b * c` while `a * (b * c)` keeps its parentheses, so the rendered
//! text pins down the exact tree shape.

use std::fmt;

use crate::node::{Context, NodeId, NodeKind};
use crate::operator::Operator;

const LEAF_PRECEDENCE: u8 = 5;

pub struct DisplayNode<'a> {
    pub context: &'a Context,
    pub id: NodeId,
}

impl<'a> DisplayNode<'a> {
    pub fn new(context: &'a Context, id: NodeId) -> Self {
        Self { context, id }
    }

    fn child(&self, id: NodeId) -> DisplayNode<'a> {
        DisplayNode::new(self.context, id)
    }
}

fn precedence(ctx: &Context, id: NodeId) -> u8 {
    ctx.operator_of(id).map_or(LEAF_PRECEDENCE, |op| op.precedence())
}

impl fmt::Display for DisplayNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.context;
        match *ctx.get(self.id).kind() {
            NodeKind::Variable { name, .. } => write!(f, "{}", ctx.sym_name(name)),
            NodeKind::Int(n) => write!(f, "{}", n),
            NodeKind::Float(x) => write!(f, "{:?}", x),
            NodeKind::Opaque { label } => write!(f, "{}(..)", ctx.sym_name(label)),
            NodeKind::Operator { op, left, right } => {
                let my_prec = op.precedence();
                let l_prec = precedence(ctx, left);
                let r_prec = precedence(ctx, right);
                // Pow is not associative either way; always bracket a compound base.
                let l_parens = if op == Operator::Pow {
                    l_prec <= my_prec
                } else {
                    l_prec < my_prec
                };

                if l_parens {
                    write!(f, "({})", self.child(left))?;
                } else {
                    write!(f, "{}", self.child(left))?;
                }
                write!(f, " {} ", op.symbol())?;
                if r_prec <= my_prec {
                    write!(f, "({})", self.child(right))
                } else {
                    write!(f, "{}", self.child(right))
                }
            }
        }
    }
}

/// Indented one-node-per-line dump, handy in `tracing` output.
pub struct TreeDump<'a> {
    pub context: &'a Context,
    pub id: NodeId,
}

impl fmt::Display for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.id, 0usize)];
        while let Some((id, level)) = stack.pop() {
            let node = self.context.get(id);
            let label = match node.operator() {
                Some(op) => op.magic_name().to_string(),
                None => DisplayNode::new(self.context, id).to_string(),
            };
            writeln!(
                f,
                "{:indent$}{} [{}]{}",
                "",
                label,
                self.context.security(id).keyword(),
                if node.is_expanded() { " expanded" } else { "" },
                indent = level * 4
            )?;
            if let Some((l, r)) = node.children() {
                stack.push((r, level + 1));
                stack.push((l, level + 1));
            }
        }
        Ok(())
    }
}
