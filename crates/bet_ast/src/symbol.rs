//! Symbol interning for leaf labels.
//!
//! Variable names and opaque callee labels are stored once and referenced by
//! `SymbolId`. Names are for rendering only: variable identity is the host's
//! `VarKey`, never the name.

use std::collections::HashMap;

/// Index of an interned label.
pub type SymbolId = usize;

/// Interned string storage.
///
/// Not thread-safe. Owned by a single `Context`.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    strings: Vec<String>,
    lookup: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the existing id when already present.
    pub fn intern(&mut self, s: &str) -> SymbolId {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }

        let id = self.strings.len();
        let owned = s.to_string();
        self.strings.push(owned.clone());
        self.lookup.insert(owned, id);
        id
    }

    /// Resolve a SymbolId back to its string.
    ///
    /// # Panics
    /// Panics if id was not produced by this table.
    #[inline]
    pub fn resolve(&self, id: SymbolId) -> &str {
        &self.strings[id]
    }

    #[inline]
    pub fn get_id(&self, s: &str) -> Option<SymbolId> {
        self.lookup.get(s).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
