//! Base types and implemented interfaces.
//!
//! Declared bases are stored uninstantiated on the definition; every query
//! here substitutes the type arguments of the type being asked about. Walks
//! run under a [`RecursionGuard`] so cyclic declarations terminate.

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use tracing::trace;

use crate::compilation::Compilation;
use crate::def::DefKind;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::type_queries::{self, NamedType};
use crate::types::{ConstraintFlags, IntrinsicKind, TypeData, TypeId};

type TypeSet = IndexSet<TypeId, FxBuildHasher>;

fn substitution_for(named: &NamedType) -> TypeSubstitution {
    TypeSubstitution::from_args(&named.info.type_params, &named.args)
}

/// The direct base class of `ty`, instantiated. `None` for `object`,
/// interfaces, pointers and `void`.
pub fn base_type(comp: &Compilation, ty: TypeId) -> Option<TypeId> {
    match comp.types().lookup(ty)? {
        TypeData::Intrinsic(kind) => intrinsic_base(kind),
        TypeData::Named { .. } => {
            let named = type_queries::named_type(comp, ty)?;
            match named.info.kind {
                DefKind::Interface => None,
                DefKind::Struct => Some(TypeId::VALUE_TYPE),
                DefKind::Enum => Some(TypeId::ENUM),
                DefKind::Class => Some(named.info.base.map_or(TypeId::OBJECT, |base| {
                    instantiate_type(comp.types(), base, &substitution_for(&named))
                })),
                DefKind::Delegate => Some(named.info.base.unwrap_or(TypeId::MULTICAST_DELEGATE)),
            }
        }
        TypeData::Array { .. } => Some(TypeId::ARRAY),
        TypeData::Synthesized { .. } => Some(TypeId::MULTICAST_DELEGATE),
        TypeData::Nullable(_) | TypeData::Tuple(_) => Some(TypeId::VALUE_TYPE),
        TypeData::TypeParameter(id) => {
            let info = comp.types().type_param_info(id)?;
            if info.flags.intersects(ConstraintFlags::VALUE_TYPE | ConstraintFlags::UNMANAGED) {
                return Some(TypeId::VALUE_TYPE);
            }
            Some(
                info.constraint_types
                    .iter()
                    .copied()
                    .find(|&c| {
                        !type_queries::is_interface(comp, c)
                            && !type_queries::is_type_parameter(comp, c)
                    })
                    .unwrap_or(TypeId::OBJECT),
            )
        }
        TypeData::Error | TypeData::Pointer(_) | TypeData::FunctionPointer { .. } => None,
    }
}

fn intrinsic_base(kind: IntrinsicKind) -> Option<TypeId> {
    use IntrinsicKind::*;
    match kind {
        Void | Object | Dynamic | IFormattable => None,
        Enum => Some(TypeId::VALUE_TYPE),
        MulticastDelegate => Some(TypeId::DELEGATE),
        LambdaExpression => Some(TypeId::EXPRESSION),
        kind if kind.is_value_type() => Some(TypeId::VALUE_TYPE),
        _ => Some(TypeId::OBJECT),
    }
}

/// The chain of base classes above `ty`, nearest first, ending at `object`.
pub fn base_chain(comp: &Compilation, ty: TypeId) -> Vec<TypeId> {
    let mut chain = Vec::new();
    let mut guard = RecursionGuard::with_profile(RecursionProfile::HierarchyWalk);
    let mut current = ty;
    let mut entered = Vec::new();
    while let Some(base) = base_type(comp, current) {
        if !guard.enter(base).is_entered() {
            trace!(type_id = ty.0, "base_chain: cycle or limit");
            break;
        }
        entered.push(base);
        chain.push(base);
        current = base;
    }
    for key in entered.into_iter().rev() {
        guard.leave(key);
    }
    chain
}

/// Whether `base` is a proper base class of `ty`.
pub fn is_derived_from(comp: &Compilation, ty: TypeId, base: TypeId) -> bool {
    ty != base && base_chain(comp, ty).contains(&base)
}

/// Every interface `ty` implements (transitively, instantiated), in
/// declaration order without duplicates. For an interface this includes its
/// base interfaces but not the interface itself.
pub fn all_interfaces(comp: &Compilation, ty: TypeId) -> Vec<TypeId> {
    let mut out = TypeSet::default();
    let mut guard = RecursionGuard::with_profile(RecursionProfile::HierarchyWalk);
    collect_interfaces(comp, ty, &mut out, &mut guard);
    for base in base_chain(comp, ty) {
        collect_interfaces(comp, base, &mut out, &mut guard);
    }
    out.into_iter().collect()
}

fn collect_interfaces(
    comp: &Compilation,
    ty: TypeId,
    out: &mut TypeSet,
    guard: &mut RecursionGuard<TypeId>,
) {
    let _ = guard.scope(ty, |guard| {
        for direct in direct_interfaces(comp, ty) {
            if out.insert(direct) {
                collect_interfaces(comp, direct, out, guard);
            }
        }
    });
}

fn direct_interfaces(comp: &Compilation, ty: TypeId) -> Vec<TypeId> {
    match comp.types().lookup(ty) {
        Some(TypeData::Named { .. }) => {
            let Some(named) = type_queries::named_type(comp, ty) else {
                return Vec::new();
            };
            let subst = substitution_for(&named);
            named
                .info
                .interfaces
                .iter()
                .map(|&iface| instantiate_type(comp.types(), iface, &subst))
                .collect()
        }
        Some(TypeData::Array { element, rank: 1 }) => comp
            .well_known()
            .array_interfaces()
            .into_iter()
            .map(|def| comp.types().named(def, [element]))
            .collect(),
        Some(TypeData::Intrinsic(IntrinsicKind::FormattableString)) => vec![TypeId::IFORMATTABLE],
        Some(TypeData::TypeParameter(id)) => comp
            .types()
            .type_param_info(id)
            .map(|info| {
                info.constraint_types
                    .into_iter()
                    .filter(|&c| type_queries::is_interface(comp, c))
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Base classes followed by interfaces: every type `ty` converts to by an
/// implicit reference or boxing conversion along its hierarchy.
pub fn supertypes(comp: &Compilation, ty: TypeId) -> Vec<TypeId> {
    let mut all = base_chain(comp, ty);
    for iface in all_interfaces(comp, ty) {
        if !all.contains(&iface) {
            all.push(iface);
        }
    }
    if type_queries::is_interface(comp, ty) && !all.contains(&TypeId::OBJECT) {
        all.push(TypeId::OBJECT);
    }
    all
}

#[cfg(test)]
#[path = "../tests/inheritance_tests.rs"]
mod tests;
