//! Identifier interning, shared across a single compile run.
//!
//! The AST itself is owned/`Clone`-based rather than arena-allocated (see
//! `lib.rs`), but the resolver and type checker compare and hash a lot of
//! struct/enum/field/trait names. `Interner` deduplicates those strings once
//! so comparisons become integer comparisons downstream.

use dashmap::DashMap;
use std::sync::RwLock;
use typed_arena::Arena;

/// A cheap, `Copy` handle to an interned string. Two symbols are equal iff
/// their underlying strings are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

/// Deduplicating string table.
///
/// Backed by a `typed_arena::Arena` so repeated names (`self`, `new`, common
/// field names) are stored once instead of cloned at every use site.
pub struct Interner {
    arena: Arena<String>,
    by_name: DashMap<String, Symbol>,
    by_symbol: RwLock<Vec<&'static str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_name: DashMap::new(),
            by_symbol: RwLock::new(Vec::new()),
        }
    }

    pub fn intern(&self, name: &str) -> Symbol {
        if let Some(existing) = self.by_name.get(name) {
            return *existing;
        }

        let stored: &mut String = self.arena.alloc(name.to_string());
        // SAFETY: `typed_arena::Arena` never moves or frees an allocation
        // until the arena itself drops, and `self.arena` outlives every
        // `Symbol` this function hands out because it's a field of `self`.
        // Extending the borrow to `'static` lets `by_symbol` live alongside
        // the arena without making `Interner` self-referential.
        let stored: &'static str = unsafe { std::mem::transmute::<&str, &'static str>(stored) };

        let mut table = self.by_symbol.write().unwrap_or_else(|e| e.into_inner());
        let symbol = Symbol(table.len() as u32);
        table.push(stored);
        self.by_name.insert(name.to_string(), symbol);
        symbol
    }

    pub fn resolve(&self, symbol: Symbol) -> &str {
        let table = self.by_symbol.read().unwrap_or_else(|e| e.into_inner());
        table[symbol.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.by_symbol.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_names_share_a_symbol() {
        let interner = Interner::new();
        let a = interner.intern("self");
        let b = interner.intern("self");
        let c = interner.intern("other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "self");
        assert_eq!(interner.resolve(c), "other");
    }
}
