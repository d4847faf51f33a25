//! Concurrent string interning.
//!
//! Names (type names, parameter names, tuple element names, custom modifier
//! names) are interned once per analysis session and then compared as
//! `Atom`s. The interner is shared by every worker thread, so both directions
//! of the mapping live in `DashMap`s.

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// An interned string handle.
///
/// `Atom(0)` is always the empty string.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string.
    pub const EMPTY: Self = Self(0);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Thread-safe string interner.
pub struct Interner {
    atoms: DashMap<Arc<str>, Atom, FxBuildHasher>,
    strings: DashMap<Atom, Arc<str>, FxBuildHasher>,
    next: AtomicU32,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        let interner = Self {
            atoms: DashMap::with_hasher(FxBuildHasher),
            strings: DashMap::with_hasher(FxBuildHasher),
            next: AtomicU32::new(1),
        };
        let empty: Arc<str> = Arc::from("");
        interner.atoms.insert(empty.clone(), Atom::EMPTY);
        interner.strings.insert(Atom::EMPTY, empty);
        interner
    }

    /// Intern `text`, returning the same `Atom` for equal strings.
    ///
    /// Concurrent first-time requests for the same string publish exactly one
    /// atom; the loser of the race adopts the winner's value.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(existing) = self.atoms.get(text) {
            return *existing;
        }
        let key: Arc<str> = Arc::from(text);
        let strings = &self.strings;
        let next = &self.next;
        *self.atoms.entry(key.clone()).or_insert_with(|| {
            let atom = Atom(next.fetch_add(1, Ordering::Relaxed));
            strings.insert(atom, key);
            atom
        })
    }

    /// Resolve an atom back to its string. Unknown atoms resolve to `""`.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.strings
            .get(&atom)
            .map(|s| s.value().clone())
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Look up an atom without interning.
    pub fn lookup(&self, text: &str) -> Option<Atom> {
        self.atoms.get(text).map(|a| *a)
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
