use std::fmt;

/// Binary arithmetic operators the rewrite engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Mul,
    MatMul,
    Pow,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Mul, Operator::MatMul, Operator::Pow];

    /// Add and Mul are commutative (and associative). MatMul and Pow are not.
    #[inline]
    pub fn is_commutative(self) -> bool {
        matches!(self, Operator::Add | Operator::Mul)
    }

    /// Host-language method name implementing the operator.
    pub const fn magic_name(self) -> &'static str {
        match self {
            Operator::Add => "__add__",
            Operator::Mul => "__mul__",
            Operator::MatMul => "__matmul__",
            Operator::Pow => "__pow__",
        }
    }

    pub fn from_magic_name(name: &str) -> Option<Operator> {
        Self::ALL.into_iter().find(|op| op.magic_name() == name)
    }

    /// Infix symbol used when rendering trees.
    pub const fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Mul => "*",
            Operator::MatMul => "@",
            Operator::Pow => "^",
        }
    }

    pub(crate) fn precedence(self) -> u8 {
        match self {
            Operator::Add => 1,
            Operator::Mul | Operator::MatMul => 2,
            Operator::Pow => 3,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.magic_name())
    }
}
