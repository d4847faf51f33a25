//! Type interning for structural deduplication.
//!
//! Converts `TypeData` structures into `TypeId` handles:
//! - O(1) type equality (compare `TypeId` values)
//! - each unique structure stored once
//! - safe to share across worker threads (both directions live in `DashMap`s)
//!
//! Concurrent first-time interning of the same structure publishes exactly
//! one id; the loser of the race adopts the winner's id.

use coerce_common::interner::{Atom, Interner};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::def::DefId;
use crate::delegate::synthesized::SynthesizedDelegateId;
use crate::types::{
    ConstraintFlags, FunctionPointerParam, IntrinsicKind, RefKind, TupleElement, TypeArgs,
    TypeData, TypeId, TypeParamId, TypeParamInfo, Variance,
};

pub struct TypeInterner {
    atoms: Interner,
    ids: DashMap<TypeData, TypeId, FxBuildHasher>,
    data: DashMap<TypeId, TypeData, FxBuildHasher>,
    next_id: AtomicU32,
    type_params: DashMap<TypeParamId, TypeParamInfo, FxBuildHasher>,
    next_type_param: AtomicU32,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = Self {
            atoms: Interner::new(),
            ids: DashMap::with_hasher(FxBuildHasher),
            data: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU32::new(TypeId::FIRST_USER),
            type_params: DashMap::with_hasher(FxBuildHasher),
            next_type_param: AtomicU32::new(0),
        };
        interner.ids.insert(TypeData::Error, TypeId::ERROR);
        interner.data.insert(TypeId::ERROR, TypeData::Error);
        for kind in IntrinsicKind::ALL {
            let data = TypeData::Intrinsic(kind);
            interner.ids.insert(data.clone(), kind.type_id());
            interner.data.insert(kind.type_id(), data);
        }
        interner
    }

    // -------------------------------------------------------------------------
    // Core interning
    // -------------------------------------------------------------------------

    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(existing) = self.ids.get(&data) {
            return *existing;
        }
        let next_id = &self.next_id;
        let data_map = &self.data;
        *self.ids.entry(data.clone()).or_insert_with(|| {
            let id = TypeId(next_id.fetch_add(1, Ordering::Relaxed));
            data_map.insert(id, data);
            id
        })
    }

    /// Structure of an interned type.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.data.get(&id).map(|entry| entry.value().clone())
    }

    /// Number of interned types, intrinsics included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // -------------------------------------------------------------------------
    // Names
    // -------------------------------------------------------------------------

    pub fn intern_string(&self, text: &str) -> Atom {
        self.atoms.intern(text)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.atoms.resolve(atom)
    }

    pub fn atoms(&self) -> &Interner {
        &self.atoms
    }

    // -------------------------------------------------------------------------
    // Constructors
    // -------------------------------------------------------------------------

    pub fn named(&self, def: DefId, args: impl IntoIterator<Item = TypeId>) -> TypeId {
        self.intern(TypeData::Named {
            def,
            args: args.into_iter().collect(),
        })
    }

    pub fn array(&self, element: TypeId, rank: u8) -> TypeId {
        self.intern(TypeData::Array {
            element,
            rank: rank.max(1),
        })
    }

    /// Single-dimensional array `T[]`.
    pub fn sz_array(&self, element: TypeId) -> TypeId {
        self.array(element, 1)
    }

    pub fn pointer(&self, pointee: TypeId) -> TypeId {
        self.intern(TypeData::Pointer(pointee))
    }

    pub fn function_pointer(
        &self,
        params: impl IntoIterator<Item = FunctionPointerParam>,
        return_type: TypeId,
        return_ref: RefKind,
    ) -> TypeId {
        self.intern(TypeData::FunctionPointer {
            params: params.into_iter().collect(),
            return_type,
            return_ref,
        })
    }

    /// `T?`. Wrapping an already-nullable type returns it unchanged.
    pub fn nullable(&self, underlying: TypeId) -> TypeId {
        if matches!(self.lookup(underlying), Some(TypeData::Nullable(_))) {
            return underlying;
        }
        self.intern(TypeData::Nullable(underlying))
    }

    pub fn tuple(&self, elements: impl IntoIterator<Item = TupleElement>) -> TypeId {
        self.intern(TypeData::Tuple(elements.into_iter().collect()))
    }

    pub fn tuple_of(&self, types: &[TypeId]) -> TypeId {
        self.tuple(types.iter().copied().map(TupleElement::unnamed))
    }

    pub fn synthesized(&self, delegate: SynthesizedDelegateId, args: TypeArgs) -> TypeId {
        self.intern(TypeData::Synthesized { delegate, args })
    }

    // -------------------------------------------------------------------------
    // Type parameters
    // -------------------------------------------------------------------------

    /// Declare a fresh type parameter.
    pub fn fresh_type_param(&self, name: &str, variance: Variance) -> TypeParamId {
        let id = TypeParamId(self.next_type_param.fetch_add(1, Ordering::Relaxed));
        let info = TypeParamInfo {
            id,
            name: self.intern_string(name),
            variance,
            flags: ConstraintFlags::empty(),
            constraint_types: Vec::new(),
        };
        self.type_params.insert(id, info);
        id
    }

    /// Attach constraints to a declared type parameter.
    pub fn set_constraints(&self, id: TypeParamId, flags: ConstraintFlags, types: Vec<TypeId>) {
        if let Some(mut info) = self.type_params.get_mut(&id) {
            info.flags = flags;
            info.constraint_types = types;
        }
    }

    pub fn type_param_info(&self, id: TypeParamId) -> Option<TypeParamInfo> {
        self.type_params.get(&id).map(|entry| entry.value().clone())
    }

    pub fn type_param(&self, id: TypeParamId) -> TypeId {
        self.intern(TypeData::TypeParameter(id))
    }

    /// The type-parameter types for a list of declarations.
    pub fn type_param_types(&self, ids: &[TypeParamId]) -> SmallVec<[TypeId; 4]> {
        ids.iter().map(|&id| self.type_param(id)).collect()
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
