//! Type classification queries.
//!
//! Small, pure questions about a `TypeId` that the classifier and the
//! inference engines ask over and over: is it a value type, a delegate, an
//! expression tree, a nullable, ref-like, and so on.

use coerce_common::{LanguageVersion, gates};
use smallvec::SmallVec;
use std::sync::Arc;

use crate::compilation::Compilation;
use crate::conversion::numeric::native_alias;
use crate::def::{DefFlags, DefId, DefKind, DefinitionInfo};
use crate::types::{
    ConstraintFlags, IntrinsicKind, TupleElement, TypeArgs, TypeData, TypeId, TypeParamInfo,
};

/// A named type resolved to its definition.
pub struct NamedType {
    pub def: DefId,
    pub info: Arc<DefinitionInfo>,
    pub args: TypeArgs,
}

pub fn intrinsic_kind(ty: TypeId) -> Option<IntrinsicKind> {
    IntrinsicKind::from_type_id(ty)
}

pub fn named_type(comp: &Compilation, ty: TypeId) -> Option<NamedType> {
    match comp.types().lookup(ty)? {
        TypeData::Named { def, args } => Some(NamedType {
            def,
            info: comp.defs().get(def)?,
            args,
        }),
        _ => None,
    }
}

pub fn def_kind(comp: &Compilation, ty: TypeId) -> Option<DefKind> {
    match comp.types().lookup(ty)? {
        TypeData::Named { def, .. } => comp.defs().kind(def),
        _ => None,
    }
}

pub fn type_param_info(comp: &Compilation, ty: TypeId) -> Option<TypeParamInfo> {
    match comp.types().lookup(ty)? {
        TypeData::TypeParameter(id) => comp.types().type_param_info(id),
        _ => None,
    }
}

pub fn is_type_parameter(comp: &Compilation, ty: TypeId) -> bool {
    matches!(comp.types().lookup(ty), Some(TypeData::TypeParameter(_)))
}

/// `T` for `T?`.
pub fn nullable_underlying(comp: &Compilation, ty: TypeId) -> Option<TypeId> {
    match comp.types().lookup(ty)? {
        TypeData::Nullable(underlying) => Some(underlying),
        _ => None,
    }
}

/// The underlying type if `ty` is nullable, else `ty` itself.
pub fn strip_nullable(comp: &Compilation, ty: TypeId) -> TypeId {
    nullable_underlying(comp, ty).unwrap_or(ty)
}

pub fn tuple_elements(comp: &Compilation, ty: TypeId) -> Option<SmallVec<[TupleElement; 4]>> {
    match comp.types().lookup(ty)? {
        TypeData::Tuple(elements) => Some(elements),
        _ => None,
    }
}

pub fn array_info(comp: &Compilation, ty: TypeId) -> Option<(TypeId, u8)> {
    match comp.types().lookup(ty)? {
        TypeData::Array { element, rank } => Some((element, rank)),
        _ => None,
    }
}

pub fn pointee(comp: &Compilation, ty: TypeId) -> Option<TypeId> {
    match comp.types().lookup(ty)? {
        TypeData::Pointer(inner) => Some(inner),
        _ => None,
    }
}

pub fn is_pointer_like(comp: &Compilation, ty: TypeId) -> bool {
    matches!(
        comp.types().lookup(ty),
        Some(TypeData::Pointer(_) | TypeData::FunctionPointer { .. })
    )
}

pub fn enum_underlying(comp: &Compilation, ty: TypeId) -> Option<TypeId> {
    let named = named_type(comp, ty)?;
    (named.info.kind == DefKind::Enum).then(|| named.info.enum_underlying.unwrap_or(TypeId::INT))
}

pub fn is_enum(comp: &Compilation, ty: TypeId) -> bool {
    def_kind(comp, ty) == Some(DefKind::Enum)
}

pub fn is_interface(comp: &Compilation, ty: TypeId) -> bool {
    ty == TypeId::IFORMATTABLE || def_kind(comp, ty) == Some(DefKind::Interface)
}

/// Named delegate types and synthesized delegate instantiations.
pub fn is_delegate_type(comp: &Compilation, ty: TypeId) -> bool {
    match comp.types().lookup(ty) {
        Some(TypeData::Named { def, .. }) => comp.defs().kind(def) == Some(DefKind::Delegate),
        Some(TypeData::Synthesized { .. }) => true,
        _ => false,
    }
}

/// `D` for `Expression<D>`.
pub fn expression_tree_delegate(comp: &Compilation, ty: TypeId) -> Option<TypeId> {
    match comp.types().lookup(ty)? {
        TypeData::Named { def, args } if def == comp.well_known().expression => {
            args.first().copied()
        }
        _ => None,
    }
}

/// Element type of `Span<T>` or `ReadOnlySpan<T>`.
pub fn span_element(comp: &Compilation, ty: TypeId) -> Option<TypeId> {
    let well_known = comp.well_known();
    match comp.types().lookup(ty)? {
        TypeData::Named { def, args }
            if def == well_known.span || def == well_known.read_only_span =>
        {
            args.first().copied()
        }
        _ => None,
    }
}

pub fn is_ref_like(comp: &Compilation, ty: TypeId) -> bool {
    named_type(comp, ty).is_some_and(|n| n.info.is_ref_like())
}

pub fn is_interpolated_string_handler(comp: &Compilation, ty: TypeId) -> bool {
    named_type(comp, ty).is_some_and(|n| {
        n.info
            .flags
            .contains(DefFlags::INTERPOLATED_STRING_HANDLER)
    })
}

/// Reference types: classes, interfaces, delegates, arrays, `string`,
/// `object`, `dynamic` and type parameters known to be reference types.
pub fn is_reference_type(comp: &Compilation, ty: TypeId) -> bool {
    match comp.types().lookup(ty) {
        Some(TypeData::Intrinsic(kind)) => !kind.is_value_type() && kind != IntrinsicKind::Void,
        Some(TypeData::Named { def, .. }) => comp
            .defs()
            .kind(def)
            .is_some_and(DefKind::is_reference_type),
        Some(TypeData::Array { .. } | TypeData::Synthesized { .. }) => true,
        Some(TypeData::TypeParameter(id)) => comp.types().type_param_info(id).is_some_and(|info| {
            info.flags.contains(ConstraintFlags::REFERENCE_TYPE)
                || info
                    .constraint_types
                    .iter()
                    .any(|&c| is_class_type(comp, c))
        }),
        _ => false,
    }
}

/// Non-interface reference types other than `object`.
fn is_class_type(comp: &Compilation, ty: TypeId) -> bool {
    ty != TypeId::OBJECT && is_reference_type(comp, ty) && !is_interface(comp, ty)
}

/// Value types: numeric intrinsics, `bool`, structs, enums, nullables,
/// tuples and type parameters constrained to value types.
pub fn is_value_type(comp: &Compilation, ty: TypeId) -> bool {
    match comp.types().lookup(ty) {
        Some(TypeData::Intrinsic(kind)) => kind.is_value_type(),
        Some(TypeData::Named { def, .. }) => comp.defs().kind(def).is_some_and(DefKind::is_value_type),
        Some(TypeData::Nullable(_) | TypeData::Tuple(_)) => true,
        Some(TypeData::TypeParameter(id)) => comp.types().type_param_info(id).is_some_and(|info| {
            info.flags
                .intersects(ConstraintFlags::VALUE_TYPE | ConstraintFlags::UNMANAGED)
        }),
        _ => false,
    }
}

/// Non-nullable value types (the ones `T?` may wrap).
pub fn is_non_nullable_value_type(comp: &Compilation, ty: TypeId) -> bool {
    is_value_type(comp, ty) && nullable_underlying(comp, ty).is_none()
}

/// The numeric kind of `ty`, treating `IntPtr`/`UIntPtr` as `nint`/`nuint`
/// when the language version and runtime make them numeric.
pub fn numeric_kind(comp: &Compilation, version: LanguageVersion, ty: TypeId) -> Option<IntrinsicKind> {
    let ty = if intptr_is_numeric(comp, version) {
        native_alias(ty)
    } else {
        ty
    };
    intrinsic_kind(ty).filter(|kind| kind.is_numeric())
}

pub fn intptr_is_numeric(comp: &Compilation, version: LanguageVersion) -> bool {
    gates::numeric_intptr(version) && comp.options().numeric_int_ptr_runtime
}

/// Whether `ty` may appear as a type argument (of `Func`/`Action` or a
/// synthesized delegate).
pub fn can_be_type_argument(comp: &Compilation, ty: TypeId) -> bool {
    ty != TypeId::VOID && !is_pointer_like(comp, ty) && !is_ref_like(comp, ty)
}

/// Whether target-typed `new()` can create `ty`.
pub fn supports_target_typed_new(comp: &Compilation, ty: TypeId) -> bool {
    let ty = strip_nullable(comp, ty);
    if let Some(info) = type_param_info(comp, ty) {
        return info
            .flags
            .intersects(ConstraintFlags::CONSTRUCTOR | ConstraintFlags::VALUE_TYPE);
    }
    match named_type(comp, ty) {
        Some(named) => match named.info.kind {
            DefKind::Struct => true,
            DefKind::Class => !named
                .info
                .flags
                .intersects(DefFlags::ABSTRACT | DefFlags::STATIC),
            DefKind::Interface | DefKind::Enum | DefKind::Delegate => false,
        },
        None => matches!(
            intrinsic_kind(ty),
            Some(kind) if kind.is_value_type() || kind == IntrinsicKind::Object
        ),
    }
}

#[cfg(test)]
#[path = "../tests/type_queries_tests.rs"]
mod tests;
