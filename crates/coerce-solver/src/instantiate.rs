//! Generic type instantiation and substitution.
//!
//! Substitutes type parameters through every `TypeData` shape. Types that
//! contain no substituted parameter come back with their original id.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::intern::TypeInterner;
use crate::types::{FunctionPointerParam, TupleElement, TypeData, TypeId, TypeParamId};

/// Mapping from type parameters to type arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<TypeParamId, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair parameters with arguments positionally. Extra entries on either
    /// side are ignored.
    pub fn from_args(params: &[TypeParamId], args: &[TypeId]) -> Self {
        Self {
            map: params.iter().copied().zip(args.iter().copied()).collect(),
        }
    }

    pub fn insert(&mut self, param: TypeParamId, arg: TypeId) {
        self.map.insert(param, arg);
    }

    pub fn get(&self, param: TypeParamId) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Apply `subst` to `ty`.
pub fn instantiate_type(types: &TypeInterner, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
    if subst.is_empty() || ty.is_intrinsic() || ty.is_error() {
        return ty;
    }
    let Some(data) = types.lookup(ty) else {
        return ty;
    };
    let go = |t: TypeId| instantiate_type(types, t, subst);
    match data {
        TypeData::Error | TypeData::Intrinsic(_) => ty,
        TypeData::TypeParameter(param) => subst.get(param).unwrap_or(ty),
        TypeData::Named { def, args } => {
            if args.is_empty() {
                return ty;
            }
            types.named(def, args.iter().map(|&a| go(a)))
        }
        TypeData::Array { element, rank } => types.array(go(element), rank),
        TypeData::Pointer(pointee) => types.pointer(go(pointee)),
        TypeData::FunctionPointer {
            params,
            return_type,
            return_ref,
        } => {
            let params: SmallVec<[_; 4]> = params
                .iter()
                .map(|p| FunctionPointerParam {
                    ty: go(p.ty),
                    ref_kind: p.ref_kind,
                })
                .collect();
            types.function_pointer(params, go(return_type), return_ref)
        }
        TypeData::Nullable(underlying) => types.nullable(go(underlying)),
        TypeData::Tuple(elements) => types.tuple(elements.iter().map(|e| TupleElement {
            ty: go(e.ty),
            name: e.name,
        })),
        TypeData::Synthesized { delegate, args } => {
            types.synthesized(delegate, args.iter().map(|&a| go(a)).collect())
        }
    }
}

/// Whether `ty` mentions any of `params`.
pub fn mentions_any(types: &TypeInterner, ty: TypeId, params: &[TypeParamId]) -> bool {
    if params.is_empty() || ty.is_intrinsic() || ty.is_error() {
        return false;
    }
    let Some(data) = types.lookup(ty) else {
        return false;
    };
    let go = |t: TypeId| mentions_any(types, t, params);
    match data {
        TypeData::Error | TypeData::Intrinsic(_) => false,
        TypeData::TypeParameter(param) => params.contains(&param),
        TypeData::Named { args, .. } | TypeData::Synthesized { args, .. } => {
            args.iter().any(|&a| go(a))
        }
        TypeData::Array { element, .. } => go(element),
        TypeData::Pointer(inner) | TypeData::Nullable(inner) => go(inner),
        TypeData::FunctionPointer {
            params: fp,
            return_type,
            ..
        } => fp.iter().any(|p| go(p.ty)) || go(return_type),
        TypeData::Tuple(elements) => elements.iter().any(|e| go(e.ty)),
    }
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
