//! Explicit (cast) conversions.
//!
//! Every implicit conversion is also an explicit one. Past those, first
//! match wins:
//! 1. explicit dynamic
//! 2. explicit numeric
//! 3. explicit enumeration
//! 4. explicit nullable (lifting numeric, enumeration and tuple conversions)
//! 5. explicit tuple
//! 6. explicit reference
//! 7. unboxing
//! 8. pointer conversions (unsafe code only)
//! 9. legacy `IntPtr`/`UIntPtr` conversions
//! 10. explicit user-defined

use smallvec::SmallVec;
use tracing::trace;

use super::compose::{compose_tuple, lift_over_nullable};
use super::numeric::{is_explicit_numeric, is_legacy_int_ptr, is_pointer_integral};
use super::{BindScope, Conversion, ConversionClassifier, ConversionKind, NestedBuffer};
use crate::def::DefFlags;
use crate::diagnostics::UseSiteDiagnostics;
use crate::expr::{Expr, ExprKind, TupleArg};
use crate::inheritance;
use crate::query_trace;
use crate::recursion::RecursionProfile;
use crate::type_queries;
use crate::types::{IntrinsicKind, TypeData, TypeId};

impl<'a> ConversionClassifier<'a> {
    /// Explicit conversion from a value of type `source` to `target`.
    pub fn classify_explicit_type(&self, source: TypeId, target: TypeId) -> Conversion {
        let traced = query_trace::enabled().then(|| {
            let qid = query_trace::next_query_id();
            query_trace::relation_start(
                qid,
                "classify_explicit_type",
                Some(source),
                target,
                self.version.as_str(),
            );
            qid
        });
        let conversion = self.explicit_type_core(source, target, true);
        if let Some(qid) = traced {
            query_trace::relation_end(
                qid,
                "classify_explicit_type",
                conversion.kind().name(),
                conversion.exists(),
            );
        }
        conversion
    }

    /// Explicit conversion from `expr` to `target`, as in `(T)expr`.
    pub fn classify_explicit(
        &self,
        expr: &Expr,
        target: TypeId,
        diagnostics: &mut UseSiteDiagnostics,
    ) -> Conversion {
        let traced = query_trace::enabled().then(|| {
            let qid = query_trace::next_query_id();
            query_trace::expr_start(qid, "classify_explicit", expr.id, self.version.as_str());
            qid
        });
        let conversion = self.classify_explicit_in(expr, target, &BindScope::EMPTY, diagnostics, 0);
        if let Some(qid) = traced {
            query_trace::relation_end(
                qid,
                "classify_explicit",
                conversion.kind().name(),
                conversion.exists(),
            );
        }
        conversion
    }

    fn classify_explicit_in(
        &self,
        expr: &Expr,
        target: TypeId,
        scope: &BindScope<'_>,
        diagnostics: &mut UseSiteDiagnostics,
        depth: u32,
    ) -> Conversion {
        let implicit = self.classify_implicit_in(expr, target, scope, diagnostics);
        if implicit.exists() {
            return implicit;
        }
        if let ExprKind::TupleLiteral(elements) = &expr.kind
            && let Some(conversion) =
                self.explicit_tuple_literal(elements, target, scope, diagnostics, depth)
        {
            return conversion;
        }
        match self.natural_type_in(expr, scope) {
            Some(source) => self.explicit_type_core(source, target, true),
            None => Conversion::NO_CONVERSION,
        }
    }

    fn explicit_tuple_literal(
        &self,
        elements: &[TupleArg],
        target: TypeId,
        scope: &BindScope<'_>,
        diagnostics: &mut UseSiteDiagnostics,
        depth: u32,
    ) -> Option<Conversion> {
        if depth >= RecursionProfile::NestedConversion.max_depth() {
            return None;
        }
        let underlying = type_queries::strip_nullable(self.comp, target);
        let targets = type_queries::tuple_elements(self.comp, underlying)?;
        if targets.len() != elements.len() || elements.is_empty() {
            return None;
        }
        let mut nested = NestedBuffer::with_capacity(elements.len());
        for (element, t) in elements.iter().zip(&targets) {
            let conversion = self.classify_explicit_in(&element.expr, t.ty, scope, diagnostics, depth + 1);
            if !conversion.exists() {
                return None;
            }
            nested.push(conversion);
        }
        let literal = compose_tuple(ConversionKind::ExplicitTupleLiteral, nested);
        Some(if underlying == target {
            literal
        } else {
            lift_over_nullable(ConversionKind::ExplicitNullable, literal)
        })
    }

    pub(crate) fn explicit_type_core(&self, source: TypeId, target: TypeId, include_user_defined: bool) -> Conversion {
        self.explicit_type_at(source, target, include_user_defined, 0)
    }

    fn explicit_type_at(
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
            trace!(source = source.0, target = target.0, "explicit: depth limit");
            return Conversion::NO_CONVERSION;
        }
        if self.is_identity_convertible(source, target) {
            return Conversion::IDENTITY;
        }
        if source == TypeId::DYNAMIC {
            return Conversion::new(ConversionKind::ExplicitDynamic);
        }
        let implicit = self.implicit_type_core(source, target, include_user_defined, depth);
        if implicit.exists() {
            return implicit;
        }
        if self.is_explicit_numeric_type(source, target) {
            return Conversion::new(ConversionKind::ExplicitNumeric);
        }
        if self.is_explicit_enumeration(source, target) {
            return Conversion::new(ConversionKind::ExplicitEnumeration);
        }
        if let Some(conversion) = self.explicit_nullable(source, target, depth) {
            return conversion;
        }
        if let Some(conversion) = self.explicit_tuple(source, target, include_user_defined, depth) {
            return conversion;
        }
        if self.has_explicit_reference(source, target, depth) {
            return Conversion::new(ConversionKind::ExplicitReference);
        }
        if self.is_unboxing(source, target) {
            return Conversion::new(ConversionKind::Unboxing);
        }
        if let Some(kind) = self.explicit_pointer(source, target) {
            return Conversion::new(kind);
        }
        if self.is_legacy_int_ptr_conversion(source, target) {
            return Conversion::new(ConversionKind::IntPtr);
        }
        if include_user_defined {
            return self.classify_user_defined(source, target, false);
        }
        Conversion::NO_CONVERSION
    }

    // -------------------------------------------------------------------------
    // Numeric, enumeration and nullable
    // -------------------------------------------------------------------------

    fn is_explicit_numeric_type(&self, source: TypeId, target: TypeId) -> bool {
        match (
            type_queries::numeric_kind(self.comp, self.version, source),
            type_queries::numeric_kind(self.comp, self.version, target),
        ) {
            (Some(s), Some(t)) => is_explicit_numeric(s, t),
            _ => false,
        }
    }

    /// Between an enum and a numeric type or another enum.
    fn is_explicit_enumeration(&self, source: TypeId, target: TypeId) -> bool {
        let is_enum_or_numeric = |ty: TypeId| {
            type_queries::is_enum(self.comp, ty)
                || type_queries::numeric_kind(self.comp, self.version, ty).is_some()
        };
        (type_queries::is_enum(self.comp, source) || type_queries::is_enum(self.comp, target))
            && is_enum_or_numeric(source)
            && is_enum_or_numeric(target)
    }

    /// `S? -> T?`, `S -> T?` and `S? -> T` over the underlying explicit
    /// conversion.
    fn explicit_nullable(&self, source: TypeId, target: TypeId, depth: u32) -> Option<Conversion> {
        let source_underlying = type_queries::nullable_underlying(self.comp, source);
        let target_underlying = type_queries::nullable_underlying(self.comp, target);
        if source_underlying.is_none() && target_underlying.is_none() {
            return None;
        }
        let s = source_underlying.unwrap_or(source);
        let t = target_underlying.unwrap_or(target);
        if !type_queries::is_non_nullable_value_type(self.comp, s)
            || !type_queries::is_non_nullable_value_type(self.comp, t)
        {
            return None;
        }
        let underlying = self.explicit_type_at(s, t, false, depth + 1);
        matches!(
            underlying.kind(),
            ConversionKind::Identity
                | ConversionKind::ImplicitNumeric
                | ConversionKind::ExplicitNumeric
                | ConversionKind::ExplicitEnumeration
                | ConversionKind::ImplicitTuple
                | ConversionKind::ExplicitTuple
        )
        .then(|| lift_over_nullable(ConversionKind::ExplicitNullable, underlying))
    }

    fn explicit_tuple(
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
            let element = self.explicit_type_at(s.ty, t.ty, include_user_defined, depth + 1);
            if !element.exists() {
                return None;
            }
            nested.push(element);
        }
        Some(compose_tuple(ConversionKind::ExplicitTuple, nested))
    }

    // -------------------------------------------------------------------------
    // Reference and unboxing
    // -------------------------------------------------------------------------

    fn is_sealed(&self, ty: TypeId) -> bool {
        if ty == TypeId::STRING {
            return true;
        }
        if type_queries::is_value_type(self.comp, ty) || type_queries::array_info(self.comp, ty).is_some() {
            return true;
        }
        type_queries::named_type(self.comp, ty)
            .is_some_and(|named| named.info.flags.intersects(DefFlags::SEALED | DefFlags::STATIC))
    }

    fn has_explicit_reference(&self, source: TypeId, target: TypeId, depth: u32) -> bool {
        let comp = self.comp;
        if !type_queries::is_reference_type(comp, target) && !type_queries::is_type_parameter(comp, target) {
            return false;
        }
        if !type_queries::is_reference_type(comp, source) && !type_queries::is_type_parameter(comp, source) {
            return false;
        }
        // Type parameters not known to be reference types take part only
        // through unboxing and boxing.
        if type_queries::is_type_parameter(comp, target) {
            return type_queries::is_reference_type(comp, target)
                && (inheritance::supertypes(comp, target).contains(&source)
                    || type_queries::is_interface(comp, source));
        }
        if type_queries::is_type_parameter(comp, source) {
            return type_queries::is_reference_type(comp, source) && type_queries::is_interface(comp, target);
        }
        if matches!(source, TypeId::OBJECT | TypeId::DYNAMIC) {
            return true;
        }
        if inheritance::is_derived_from(comp, target, source) {
            return true;
        }
        let source_interface = type_queries::is_interface(comp, source);
        let target_interface = type_queries::is_interface(comp, target);
        match (source_interface, target_interface) {
            (false, true) if !self.is_sealed(source) => return true,
            (false, true) => {}
            (true, false) if !self.is_sealed(target) => return true,
            (true, false) => return self.has_implicit_reference(target, source, depth + 1),
            (true, true) => return true,
            (false, false) => {}
        }
        self.explicit_array_reference(source, target, depth)
    }

    /// `S[] -> T[]` with an explicit reference conversion between the
    /// elements, and the same between `S[]` and the generic list interfaces
    /// of `T`.
    fn explicit_array_reference(&self, source: TypeId, target: TypeId, depth: u32) -> bool {
        if depth >= RecursionProfile::NestedConversion.max_depth() {
            return false;
        }
        let comp = self.comp;
        let element_reference = |s: TypeId, t: TypeId| {
            type_queries::is_reference_type(comp, s)
                && type_queries::is_reference_type(comp, t)
                && (self.has_explicit_reference(s, t, depth + 1)
                    || self.has_implicit_reference(s, t, depth + 1))
        };
        let list_element = |ty: TypeId| match comp.types().lookup(ty) {
            Some(TypeData::Named { def, args })
                if args.len() == 1 && comp.well_known().array_interfaces().contains(&def) =>
            {
                Some(args[0])
            }
            _ => None,
        };
        match (
            type_queries::array_info(comp, source),
            type_queries::array_info(comp, target),
        ) {
            (Some((s, s_rank)), Some((t, t_rank))) => s_rank == t_rank && element_reference(s, t),
            (Some((s, 1)), None) => list_element(target).is_some_and(|t| element_reference(s, t)),
            (None, Some((t, 1))) => list_element(source).is_some_and(|s| {
                self.is_identity_convertible(s, t) || element_reference(s, t)
            }),
            _ => false,
        }
    }

    /// From `object`, `ValueType`, `Enum` or an interface to a value type
    /// (or nullable value type) that boxes to it.
    fn is_unboxing(&self, source: TypeId, target: TypeId) -> bool {
        if !type_queries::is_reference_type(self.comp, source) {
            return false;
        }
        let underlying = type_queries::strip_nullable(self.comp, target);
        let unboxable = type_queries::is_value_type(self.comp, underlying)
            || (type_queries::is_type_parameter(self.comp, underlying)
                && !type_queries::is_reference_type(self.comp, underlying));
        unboxable && self.has_boxing(underlying, source)
    }

    // -------------------------------------------------------------------------
    // Pointers and IntPtr
    // -------------------------------------------------------------------------

    fn explicit_pointer(&self, source: TypeId, target: TypeId) -> Option<ConversionKind> {
        if !self.comp.options().allow_unsafe {
            return None;
        }
        let comp = self.comp;
        let pointer_integral = |ty: TypeId| {
            type_queries::intrinsic_kind(ty).is_some_and(is_pointer_integral)
                || (!type_queries::intptr_is_numeric(comp, self.version)
                    && matches!(ty, TypeId::INTPTR | TypeId::UINTPTR))
        };
        match (
            type_queries::is_pointer_like(comp, source),
            type_queries::is_pointer_like(comp, target),
        ) {
            (true, true) => Some(ConversionKind::ExplicitPointerToPointer),
            (false, true) if pointer_integral(source) => Some(ConversionKind::ExplicitIntegerToPointer),
            (true, false) if pointer_integral(target) => Some(ConversionKind::ExplicitPointerToInteger),
            _ => None,
        }
    }

    /// `IntPtr`/`UIntPtr` treated as plain structs: conversions to and from
    /// the integral types they declare operators for.
    fn is_legacy_int_ptr_conversion(&self, source: TypeId, target: TypeId) -> bool {
        if type_queries::intptr_is_numeric(self.comp, self.version) {
            return false;
        }
        let (Some(s), Some(t)) = (
            type_queries::intrinsic_kind(source),
            type_queries::intrinsic_kind(target),
        ) else {
            return false;
        };
        matches!(s, IntrinsicKind::IntPtr | IntrinsicKind::UIntPtr)
            != matches!(t, IntrinsicKind::IntPtr | IntrinsicKind::UIntPtr)
            && is_legacy_int_ptr(s, t)
    }
}

#[cfg(test)]
#[path = "../../tests/explicit_tests.rs"]
mod tests;
