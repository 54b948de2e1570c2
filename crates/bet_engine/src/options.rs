//! Configuration for the rewrite pipeline.

/// Which rewrite passes run, and their budgets.
///
/// The passes always run in the fixed order expansion, powers, reordering,
/// factorization; disabling one simply skips it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Inline previously cached trees for variable reads.
    pub expand_variables: bool,
    /// Replace `x ^ n` by `n - 1` multiplications.
    pub expand_powers: bool,
    /// Rotate commutative chains so secure operands associate last.
    pub reorder_priorities: bool,
    /// Rewrite `a*b + a*c` to `a*(b + c)`.
    pub factorize: bool,
    /// Upper bound on reorder rotations per tree.
    pub max_reorder_rounds: usize,
    /// Upper bound on factorizations per tree.
    pub max_factor_rounds: usize,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            expand_variables: true,
            expand_powers: true,
            reorder_priorities: true,
            factorize: true,
            max_reorder_rounds: 10_000,
            max_factor_rounds: 10_000,
        }
    }
}

impl RewriteOptions {
    /// Every pass disabled. Trees are rebuilt and re-emitted unchanged.
    pub fn none() -> Self {
        Self {
            expand_variables: false,
            expand_powers: false,
            reorder_priorities: false,
            factorize: false,
            ..Self::default()
        }
    }

    /// Polynomial optimisations only: expansion, powers and factorization.
    pub fn polynomial() -> Self {
        Self {
            reorder_priorities: false,
            ..Self::default()
        }
    }

    pub fn with_reorder(mut self, on: bool) -> Self {
        self.reorder_priorities = on;
        self
    }

    pub fn with_factorize(mut self, on: bool) -> Self {
        self.factorize = on;
        self
    }

    pub fn with_expand_powers(mut self, on: bool) -> Self {
        self.expand_powers = on;
        self
    }

    pub fn with_expand_variables(mut self, on: bool) -> Self {
        self.expand_variables = on;
        self
    }
}

/// Shadow-execution instrumentation settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowOptions {
    /// Absolute tolerance of the generated approximate-equality checks.
    pub tolerance: f64,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self { tolerance: 0.02 }
    }
}
