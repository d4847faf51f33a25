//! Definition identifiers and storage.
//!
//! A `DefId` names a declared class, struct, interface, enum or delegate.
//! Definitions are registered once and read concurrently; the only mutation
//! after registration is attaching members (conversion operators,
//! `Deconstruct` methods, the delegate `Invoke` method) while a compilation is
//! being populated.

use bitflags::bitflags;
use coerce_common::interner::Atom;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

use crate::method::MethodId;
use crate::types::{Accessibility, TypeId, TypeParamId};

// =============================================================================
// DefId
// =============================================================================

/// Definition identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

// =============================================================================
// DefKind
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

impl DefKind {
    pub const fn is_value_type(self) -> bool {
        matches!(self, Self::Struct | Self::Enum)
    }

    pub const fn is_reference_type(self) -> bool {
        matches!(self, Self::Class | Self::Interface | Self::Delegate)
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DefFlags: u8 {
        const SEALED = 1 << 0;
        const ABSTRACT = 1 << 1;
        const STATIC = 1 << 2;
        /// `ref struct`: stack-only, never a type argument.
        const REF_LIKE = 1 << 3;
        /// Marked as an interpolated string handler.
        const INTERPOLATED_STRING_HANDLER = 1 << 4;
    }
}

// =============================================================================
// DefinitionInfo
// =============================================================================

/// Everything the conversion core needs to know about a declared type.
#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,
    pub name: Atom,
    pub type_params: Vec<TypeParamId>,
    /// Base class, expressed in terms of this definition's type parameters.
    pub base: Option<TypeId>,
    /// Directly implemented (or, for interfaces, inherited) interfaces.
    pub interfaces: Vec<TypeId>,
    /// Enums only.
    pub enum_underlying: Option<TypeId>,
    /// Delegates only.
    pub invoke: Option<MethodId>,
    /// User-defined `implicit`/`explicit` operators declared on this type.
    pub conversion_operators: Vec<MethodId>,
    /// `Deconstruct` methods declared on this type.
    pub deconstructors: Vec<MethodId>,
    pub accessibility: Accessibility,
    pub flags: DefFlags,
}

impl DefinitionInfo {
    pub fn new(kind: DefKind, name: Atom) -> Self {
        Self {
            kind,
            name,
            type_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            enum_underlying: None,
            invoke: None,
            conversion_operators: Vec::new(),
            deconstructors: Vec::new(),
            accessibility: Accessibility::Public,
            flags: DefFlags::empty(),
        }
    }

    pub fn with_type_params(mut self, params: Vec<TypeParamId>) -> Self {
        self.type_params = params;
        self
    }

    pub fn with_base(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interfaces(mut self, interfaces: Vec<TypeId>) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_flags(mut self, flags: DefFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_ref_like(&self) -> bool {
        self.flags.contains(DefFlags::REF_LIKE)
    }
}

// =============================================================================
// DefinitionStore
// =============================================================================

/// Concurrent storage for definitions.
pub struct DefinitionStore {
    definitions: DashMap<DefId, Arc<DefinitionInfo>, FxBuildHasher>,
    next_id: AtomicU32,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU32::new(DefId::FIRST_VALID),
        }
    }

    /// Register a definition and return its id.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = DefId(self.next_id.fetch_add(1, Ordering::Relaxed));
        trace!(def_id = id.0, kind = ?info.kind, "DefinitionStore::register");
        self.definitions.insert(id, Arc::new(info));
        id
    }

    pub fn get(&self, id: DefId) -> Option<Arc<DefinitionInfo>> {
        self.definitions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Apply `f` to a registered definition. Returns `false` for unknown ids.
    pub fn update(&self, id: DefId, f: impl FnOnce(&mut DefinitionInfo)) -> bool {
        match self.definitions.get_mut(&id) {
            Some(mut entry) => {
                f(Arc::make_mut(entry.value_mut()));
                true
            }
            None => false,
        }
    }

    pub fn kind(&self, id: DefId) -> Option<DefKind> {
        self.definitions.get(&id).map(|entry| entry.kind)
    }

    /// All delegate definitions, ordered by id.
    pub fn delegates(&self) -> Vec<DefId> {
        let mut ids: Vec<DefId> = self
            .definitions
            .iter()
            .filter(|entry| entry.kind == DefKind::Delegate)
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
