//! Implicit conversions between types.
//!
//! Precedence, first match wins:
//! 1. identity (modulo `dynamic`/`object`, native-int aliases, tuple names)
//! 2. implicit numeric
//! 3. pointer to `void*`
//! 4. implicit nullable (lifting identity, numeric and tuple conversions)
//! 5. implicit tuple
//! 6. implicit reference
//! 7. boxing
//! 8. implicit dynamic
//! 9. user-defined, only when nothing above applies
//!
//! Steps 1-8 (plus implicit constant conversions, which need an expression)
//! form the *standard* implicit conversions that user-defined resolution
//! uses as its encompassing relation.

use smallvec::SmallVec;
use tracing::trace;

use super::compose::{compose_tuple, lift_over_nullable};
use super::numeric::{is_implicit_numeric, native_alias};
use super::{Conversion, ConversionClassifier, ConversionKind};
use crate::inheritance;
use crate::query_trace;
use crate::recursion::RecursionProfile;
use crate::type_queries;
use crate::types::{TupleElement, TypeData, TypeId, Variance};

impl<'a> ConversionClassifier<'a> {
    /// Implicit conversion from a value of type `source` to `target`,
    /// user-defined conversions included.
    pub fn classify_implicit_type(&self, source: TypeId, target: TypeId) -> Conversion {
        let traced = query_trace::enabled().then(|| {
            let qid = query_trace::next_query_id();
            query_trace::relation_start(
                qid,
                "classify_implicit_type",
                Some(source),
                target,
                self.version.as_str(),
            );
            qid
        });
        let conversion = self.implicit_type_core(source, target, true, 0);
        if let Some(qid) = traced {
            query_trace::relation_end(
                qid,
                "classify_implicit_type",
                conversion.kind().name(),
                conversion.exists(),
            );
        }
        conversion
    }

    /// Standard implicit conversion: every implicit conversion between types
    /// except user-defined ones.
    pub fn classify_standard_implicit(&self, source: TypeId, target: TypeId) -> Conversion {
        self.implicit_type_core(source, target, false, 0)
    }

    pub(crate) fn implicit_type_core(
        &self,
        source: TypeId,
        target: TypeId,
        include_user_defined: bool,
        depth: u32,
    ) -> Conversion {
        if source.is_error() || target.is_error() {
            return Conversion::NO_CONVERSION;
        }
        if depth >= RecursionProfile::NestedConversion.max_depth() {
            trace!(source = source.0, target = target.0, "implicit: depth limit");
            return Conversion::NO_CONVERSION;
        }

        if self.is_identity_convertible(source, target) {
            return Conversion::IDENTITY;
        }
        if self.is_implicit_numeric_type(source, target) {
            return Conversion::IMPLICIT_NUMERIC;
        }
        if self.comp.options().allow_unsafe
            && type_queries::pointee(self.comp, source).is_some()
            && type_queries::pointee(self.comp, target) == Some(TypeId::VOID)
        {
            return Conversion::new(ConversionKind::ImplicitPointerToVoid);
        }
        if let Some(conversion) = self.implicit_nullable(source, target, depth) {
            return conversion;
        }
        if let Some(conversion) =
            self.implicit_tuple(source, target, include_user_defined, depth)
        {
            return conversion;
        }
        if self.has_implicit_reference(source, target, depth) {
            return Conversion::IMPLICIT_REFERENCE;
        }
        if self.has_boxing(source, target) {
            return Conversion::BOXING;
        }
        if source == TypeId::DYNAMIC {
            return Conversion::new(ConversionKind::ImplicitDynamic);
        }
        if include_user_defined {
            return self.classify_user_defined(source, target, true);
        }
        Conversion::NO_CONVERSION
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Whether an identity conversion exists: the types are equal after
    /// mapping `dynamic` to `object`, `IntPtr`/`UIntPtr` to `nint`/`nuint`
    /// (when numeric) and dropping tuple element names, at every depth.
    pub fn is_identity_convertible(&self, a: TypeId, b: TypeId) -> bool {
        a == b || (!a.is_error() && !b.is_error() && self.erase(a) == self.erase(b))
    }

    pub(crate) fn erase(&self, ty: TypeId) -> TypeId {
        if ty == TypeId::DYNAMIC {
            return TypeId::OBJECT;
        }
        if ty.is_intrinsic() {
            return if type_queries::intptr_is_numeric(self.comp, self.version) {
                native_alias(ty)
            } else {
                ty
            };
        }
        let types = self.comp.types();
        let Some(data) = types.lookup(ty) else {
            return ty;
        };
        match data {
            TypeData::Named { def, args } if !args.is_empty() => {
                types.named(def, args.iter().map(|&a| self.erase(a)))
            }
            TypeData::Synthesized { delegate, args } => {
                types.synthesized(delegate, args.iter().map(|&a| self.erase(a)).collect())
            }
            TypeData::Array { element, rank } => types.array(self.erase(element), rank),
            TypeData::Pointer(pointee) => types.pointer(self.erase(pointee)),
            TypeData::Nullable(underlying) => types.nullable(self.erase(underlying)),
            TypeData::Tuple(elements) => types.tuple(
                elements
                    .iter()
                    .map(|e| TupleElement::unnamed(self.erase(e.ty))),
            ),
            _ => ty,
        }
    }

    // -------------------------------------------------------------------------
    // Numeric
    // -------------------------------------------------------------------------

    fn is_implicit_numeric_type(&self, source: TypeId, target: TypeId) -> bool {
        match (
            type_queries::numeric_kind(self.comp, self.version, source),
            type_queries::numeric_kind(self.comp, self.version, target),
        ) {
            (Some(s), Some(t)) => is_implicit_numeric(s, t),
            _ => false,
        }
    }

    // -------------------------------------------------------------------------
    // Nullable and tuple
    // -------------------------------------------------------------------------

    /// `S? -> T?` and `S -> T?` over identity, numeric and tuple conversions.
    fn implicit_nullable(&self, source: TypeId, target: TypeId, depth: u32) -> Option<Conversion> {
        let target_underlying = type_queries::nullable_underlying(self.comp, target)?;
        let source_underlying = type_queries::strip_nullable(self.comp, source);
        if !type_queries::is_non_nullable_value_type(self.comp, source_underlying) {
            return None;
        }
        let underlying =
            self.implicit_type_core(source_underlying, target_underlying, false, depth + 1);
        matches!(
            underlying.kind(),
            ConversionKind::Identity | ConversionKind::ImplicitNumeric | ConversionKind::ImplicitTuple
        )
        .then(|| lift_over_nullable(ConversionKind::ImplicitNullable, underlying))
    }

    fn implicit_tuple(
        &self,
        source: TypeId,
        target: TypeId,
        include_user_defined: bool,
        depth: u32,
    ) -> Option<Conversion> {
        let sources = type_queries::tuple_elements(self.comp, source)?;
        let targets = type_queries::tuple_elements(self.comp, target)?;
        if sources.len() != targets.len() {
            return None;
        }
        let mut nested: SmallVec<[Conversion; 4]> = SmallVec::with_capacity(sources.len());
        for (s, t) in sources.iter().zip(&targets) {
            let element = self.implicit_type_core(s.ty, t.ty, include_user_defined, depth + 1);
            if !element.exists() {
                return None;
            }
            nested.push(element);
        }
        Some(compose_tuple(ConversionKind::ImplicitTuple, nested))
    }

    // -------------------------------------------------------------------------
    // Reference and boxing
    // -------------------------------------------------------------------------

    pub(crate) fn has_implicit_reference(&self, source: TypeId, target: TypeId, depth: u32) -> bool {
        if !type_queries::is_reference_type(self.comp, source) {
            return false;
        }
        if matches!(target, TypeId::OBJECT | TypeId::DYNAMIC) {
            return true;
        }
        if let (Some((s_elem, s_rank)), Some((t_elem, t_rank))) = (
            type_queries::array_info(self.comp, source),
            type_queries::array_info(self.comp, target),
        ) {
            return s_rank == t_rank
                && type_queries::is_reference_type(self.comp, s_elem)
                && self.has_implicit_reference(s_elem, t_elem, depth + 1);
        }
        inheritance::supertypes(self.comp, source)
            .into_iter()
            .any(|sup| {
                self.is_identity_convertible(sup, target)
                    || self.is_variance_convertible(sup, target, depth + 1)
            })
            || self.is_variance_convertible(source, target, depth + 1)
    }

    /// `I<A> -> I<B>` for a variant interface or delegate `I`.
    fn is_variance_convertible(&self, source: TypeId, target: TypeId, depth: u32) -> bool {
        if depth >= RecursionProfile::NestedConversion.max_depth() {
            return false;
        }
        let (Some(s), Some(t)) = (
            type_queries::named_type(self.comp, source),
            type_queries::named_type(self.comp, target),
        ) else {
            return false;
        };
        if s.def != t.def || s.args.is_empty() || s.args.len() != t.args.len() {
            return false;
        }
        s.info
            .type_params
            .iter()
            .zip(s.args.iter().zip(&t.args))
            .all(|(&param, (&sa, &ta))| {
                if self.is_identity_convertible(sa, ta) {
                    return true;
                }
                let variance = self
                    .comp
                    .types()
                    .type_param_info(param)
                    .map_or(Variance::Invariant, |info| info.variance);
                match variance {
                    Variance::Invariant => false,
                    Variance::Out => self.has_implicit_reference(sa, ta, depth + 1),
                    Variance::In => self.has_implicit_reference(ta, sa, depth + 1),
                }
            })
    }

    /// Value type (or nullable value type, or type parameter not known to be
    /// a reference type) to a reference type it derives from or an interface
    /// it implements.
    pub(super) fn has_boxing(&self, source: TypeId, target: TypeId) -> bool {
        let underlying = type_queries::strip_nullable(self.comp, source);
        let boxable = type_queries::is_value_type(self.comp, underlying)
            || type_queries::is_type_parameter(self.comp, underlying);
        if !boxable || type_queries::is_reference_type(self.comp, underlying) {
            return false;
        }
        if matches!(target, TypeId::OBJECT | TypeId::DYNAMIC) {
            return true;
        }
        inheritance::supertypes(self.comp, underlying)
            .into_iter()
            .any(|sup| {
                self.is_identity_convertible(sup, target)
                    || self.is_variance_convertible(sup, target, 0)
            })
    }
}
