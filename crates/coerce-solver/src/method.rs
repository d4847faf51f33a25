//! Method symbols.
//!
//! Methods are the targets of method-group conversions, the operators of
//! user-defined conversions, `Deconstruct` methods and delegate `Invoke`
//! methods.

use bitflags::bitflags;
use coerce_common::interner::Atom;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::def::DefId;
use crate::types::{Accessibility, RefKind, TypeId, TypeParamId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Ordinary,
    ImplicitConversion,
    ExplicitConversion,
    DelegateInvoke,
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u8 {
        const STATIC = 1 << 0;
        /// First parameter is the `this` receiver.
        const EXTENSION = 1 << 1;
        /// `[UnmanagedCallersOnly]`: never convertible to a delegate.
        const UNMANAGED_CALLERS_ONLY = 1 << 2;
    }
}

/// A custom modifier on a parameter or return type.
///
/// Optional modifiers (`modopt`) never affect signature compatibility.
/// Required modifiers (`modreq`) outside the set the language understands make
/// the member unusable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomModifier {
    pub modifier: Atom,
    pub is_optional: bool,
}

/// Required modifiers the language understands.
pub const KNOWN_REQUIRED_MODIFIERS: [&str; 3] = [
    "System.Runtime.InteropServices.InAttribute",
    "System.Runtime.CompilerServices.IsExternalInit",
    "System.Runtime.CompilerServices.IsVolatile",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: Atom,
    pub ty: TypeId,
    pub ref_kind: RefKind,
    pub is_params: bool,
    pub modifiers: Vec<CustomModifier>,
}

impl ParamInfo {
    pub fn new(name: Atom, ty: TypeId) -> Self {
        Self {
            name,
            ty,
            ref_kind: RefKind::None,
            is_params: false,
            modifiers: Vec::new(),
        }
    }

    pub fn with_ref_kind(mut self, ref_kind: RefKind) -> Self {
        self.ref_kind = ref_kind;
        self
    }

    pub fn with_params(mut self) -> Self {
        self.is_params = true;
        self
    }

    pub fn with_modifier(mut self, modifier: CustomModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }
}

#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub name: Atom,
    pub kind: MethodKind,
    pub containing: Option<DefId>,
    pub type_params: Vec<TypeParamId>,
    pub params: Vec<ParamInfo>,
    pub return_type: TypeId,
    pub return_ref: RefKind,
    pub return_modifiers: Vec<CustomModifier>,
    pub flags: MethodFlags,
    pub accessibility: Accessibility,
}

impl MethodInfo {
    pub fn new(name: Atom, params: Vec<ParamInfo>, return_type: TypeId) -> Self {
        Self {
            name,
            kind: MethodKind::Ordinary,
            containing: None,
            type_params: Vec::new(),
            params,
            return_type,
            return_ref: RefKind::None,
            return_modifiers: Vec::new(),
            flags: MethodFlags::empty(),
            accessibility: Accessibility::Public,
        }
    }

    pub fn with_kind(mut self, kind: MethodKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_containing(mut self, def: DefId) -> Self {
        self.containing = Some(def);
        self
    }

    pub fn with_type_params(mut self, params: Vec<TypeParamId>) -> Self {
        self.type_params = params;
        self
    }

    pub fn with_return_ref(mut self, ref_kind: RefKind) -> Self {
        self.return_ref = ref_kind;
        self
    }

    pub fn with_return_modifier(mut self, modifier: CustomModifier) -> Self {
        self.return_modifiers.push(modifier);
        self
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn is_extension(&self) -> bool {
        self.flags.contains(MethodFlags::EXTENSION)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Every required modifier on the signature, in declaration order.
    pub fn required_modifiers(&self) -> impl Iterator<Item = Atom> + '_ {
        self.return_modifiers
            .iter()
            .chain(self.params.iter().flat_map(|p| p.modifiers.iter()))
            .filter(|m| !m.is_optional)
            .map(|m| m.modifier)
    }
}

/// Concurrent storage for methods.
pub struct MethodStore {
    methods: DashMap<MethodId, Arc<MethodInfo>, FxBuildHasher>,
    next_id: AtomicU32,
}

impl Default for MethodStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodStore {
    pub fn new() -> Self {
        Self {
            methods: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU32::new(1),
        }
    }

    pub fn register(&self, info: MethodInfo) -> MethodId {
        let id = MethodId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.methods.insert(id, Arc::new(info));
        id
    }

    pub fn get(&self, id: MethodId) -> Option<Arc<MethodInfo>> {
        self.methods.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
