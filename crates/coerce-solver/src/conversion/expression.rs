//! Expression-to-type classification and natural types of expressions.
//!
//! Typed expressions classify through their type, with constant and
//! user-defined conversions layered on top. Untyped forms (literals, lambdas,
//! method groups, stackalloc, tuple literals, interpolated strings,
//! conditional and switch expressions, target-typed `new`) have conversions
//! of their own that depend on the target.

use coerce_common::diagnostics::diagnostic_messages;
use coerce_common::gates;
use coerce_common::interner::Atom;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::compose::{
    compose_stackalloc, compose_switch_or_conditional, compose_tuple, lift_over_nullable,
};
use super::numeric::is_implicit_constant;
use super::{Conversion, ConversionClassifier, ConversionKind, NestedBuffer};
use crate::delegate::infer::{GroupCandidate, is_member_candidate, method_group_scopes};
use crate::delegate::signature::{
    DelegateSignature, delegate_signature, method_signature, unsupported_modifier,
};
use crate::diagnostics::UseSiteDiagnostics;
use crate::expr::{
    Argument, Expr, ExprKind, FunctionFlavor, LambdaBody, LambdaExpr, MethodGroupExpr, TupleArg,
};
use crate::format::TypeFormatter;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::method::{MethodFlags, MethodId};
use crate::overload::{OverloadJudge, OverloadResolutionResult};
use crate::query_trace;
use crate::recursion::RecursionProfile;
use crate::type_queries;
use crate::types::{TupleElement, TypeId};

// =============================================================================
// BindScope
// =============================================================================

/// Lambda parameters visible to an expression, innermost lambda first.
///
/// Classification of a lambda body binds the lambda's parameters (explicit
/// types, or the target delegate's parameter types) so that
/// [`ExprKind::Parameter`] references inside it have a type.
#[derive(Copy, Clone, Debug)]
pub struct BindScope<'s> {
    params: &'s [(Atom, TypeId)],
    parent: Option<&'s BindScope<'s>>,
    depth: u32,
}

impl BindScope<'static> {
    /// The scope outside every lambda.
    pub const EMPTY: Self = Self {
        params: &[],
        parent: None,
        depth: 0,
    };
}

impl<'s> BindScope<'s> {
    pub fn nested<'n>(&'n self, params: &'n [(Atom, TypeId)]) -> BindScope<'n>
    where
        's: 'n,
    {
        BindScope {
            params,
            parent: Some(self),
            depth: self.depth + 1,
        }
    }

    pub fn lookup(&self, name: Atom) -> Option<TypeId> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(&(_, ty)) = current.params.iter().rev().find(|(n, _)| *n == name) {
                return Some(ty);
            }
            scope = current.parent;
        }
        None
    }

    /// Outside every lambda. Only root-scope results are context free.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}

// =============================================================================
// Classification
// =============================================================================

impl<'a> ConversionClassifier<'a> {
    /// Implicit conversion from `expr` to `target`. Use-site problems (an
    /// unsupported required modifier, an expression-tree restriction) are
    /// pushed into `diagnostics`.
    pub fn classify_implicit(
        &self,
        expr: &Expr,
        target: TypeId,
        diagnostics: &mut UseSiteDiagnostics,
    ) -> Conversion {
        let traced = query_trace::enabled().then(|| {
            let qid = query_trace::next_query_id();
            query_trace::expr_start(qid, "classify_implicit", expr.id, self.version.as_str());
            qid
        });
        let conversion = self.classify_implicit_in(expr, target, &BindScope::EMPTY, diagnostics);
        if let Some(qid) = traced {
            query_trace::relation_end(
                qid,
                "classify_implicit",
                conversion.kind().name(),
                conversion.exists(),
            );
        }
        conversion
    }

    pub fn classify_implicit_in(
        &self,
        expr: &Expr,
        target: TypeId,
        scope: &BindScope<'_>,
        diagnostics: &mut UseSiteDiagnostics,
    ) -> Conversion {
        if target.is_error() {
            return Conversion::NO_CONVERSION;
        }
        let conversion = match &expr.kind {
            ExprKind::Typed { ty, constant } => self.classify_typed(*ty, *constant, target),
            ExprKind::Parameter(name) => match scope.lookup(*name) {
                Some(ty) => self.classify_typed(ty, None, target),
                None => Conversion::NO_CONVERSION,
            },
            ExprKind::NullLiteral => self.classify_null_literal(target),
            ExprKind::DefaultLiteral => {
                if gates::default_literal(self.version) {
                    Conversion::new(ConversionKind::DefaultLiteral)
                } else {
                    Conversion::NO_CONVERSION
                }
            }
            ExprKind::Throw => Conversion::new(ConversionKind::ImplicitThrow),
            ExprKind::Lambda(lambda) => {
                self.classify_lambda(expr, lambda, target, scope, diagnostics)
            }
            ExprKind::MethodGroup(group) => {
                self.classify_method_group(expr, group, target, scope, diagnostics)
            }
            ExprKind::StackAlloc { element } => self.classify_stackalloc(*element, target),
            ExprKind::TupleLiteral(elements) => {
                self.classify_tuple_literal(expr, elements, target, scope, diagnostics)
            }
            ExprKind::InterpolatedString => self.classify_interpolated_string(target),
            ExprKind::Conditional { .. } | ExprKind::Switch { .. } => {
                self.classify_arms(expr, target, scope, diagnostics)
            }
            ExprKind::TargetTypedNew { .. } => {
                if gates::target_typed_new(self.version)
                    && type_queries::supports_target_typed_new(self.comp, target)
                {
                    Conversion::new(ConversionKind::ObjectCreation)
                } else {
                    Conversion::NO_CONVERSION
                }
            }
            ExprKind::Invocation { .. } | ExprKind::ImplicitArray { .. } => {
                self.classify_via_natural_type(expr, target, scope)
            }
        };
        if conversion.exists() {
            trace!(
                expr = expr.id.0,
                target = target.0,
                kind = conversion.kind().name(),
                "classified expression"
            );
        }
        conversion
    }

    fn classify_via_natural_type(&self, expr: &Expr, target: TypeId, scope: &BindScope<'_>) -> Conversion {
        match self.natural_type_in(expr, scope) {
            Some(ty) => self.classify_implicit_type(ty, target),
            None => Conversion::NO_CONVERSION,
        }
    }

    // -------------------------------------------------------------------------
    // Typed expressions and literals
    // -------------------------------------------------------------------------

    fn classify_typed(&self, source: TypeId, constant: Option<i128>, target: TypeId) -> Conversion {
        let conversion = self.implicit_type_core(source, target, false, 0);
        if conversion.exists() {
            return conversion;
        }
        if let Some(conversion) =
            constant.and_then(|value| self.constant_conversion(source, value, target))
        {
            return conversion;
        }
        self.classify_user_defined(source, target, true)
    }

    /// Integral constants that fit the target, and literal zero to enums,
    /// lifted when the target is nullable.
    fn constant_conversion(&self, source: TypeId, value: i128, target: TypeId) -> Option<Conversion> {
        let source_kind = type_queries::numeric_kind(self.comp, self.version, source)
            .filter(|kind| kind.is_integral())?;
        let underlying = type_queries::strip_nullable(self.comp, target);
        let conversion = if value == 0 && type_queries::is_enum(self.comp, underlying) {
            Conversion::new(ConversionKind::ImplicitEnumeration)
        } else {
            let target_kind = type_queries::numeric_kind(self.comp, self.version, underlying)?;
            if !is_implicit_constant(source_kind, value, target_kind) {
                return None;
            }
            Conversion::new(ConversionKind::ImplicitConstant)
        };
        Some(if underlying == target {
            conversion
        } else {
            lift_over_nullable(ConversionKind::ImplicitNullable, conversion)
        })
    }

    fn classify_null_literal(&self, target: TypeId) -> Conversion {
        if type_queries::nullable_underlying(self.comp, target).is_some()
            || type_queries::is_reference_type(self.comp, target)
        {
            return Conversion::new(ConversionKind::NullLiteral);
        }
        if self.comp.options().allow_unsafe && type_queries::is_pointer_like(self.comp, target) {
            return Conversion::new(ConversionKind::ImplicitNullToPointer);
        }
        Conversion::NO_CONVERSION
    }

    fn classify_interpolated_string(&self, target: TypeId) -> Conversion {
        let conversion = self.implicit_type_core(TypeId::STRING, target, false, 0);
        if conversion.exists() {
            return conversion;
        }
        if matches!(target, TypeId::FORMATTABLE_STRING | TypeId::IFORMATTABLE) {
            return Conversion::new(ConversionKind::InterpolatedString);
        }
        if gates::interpolated_string_handlers(self.version)
            && type_queries::is_interpolated_string_handler(self.comp, target)
        {
            return Conversion::new(ConversionKind::InterpolatedStringHandler);
        }
        self.classify_user_defined(TypeId::STRING, target, true)
    }

    // -------------------------------------------------------------------------
    // Anonymous functions
    // -------------------------------------------------------------------------

    fn classify_lambda(
        &self,
        expr: &Expr,
        lambda: &LambdaExpr,
        target: TypeId,
        scope: &BindScope<'_>,
        diagnostics: &mut UseSiteDiagnostics,
    ) -> Conversion {
        if let Some(delegate) = type_queries::expression_tree_delegate(self.comp, target) {
            if lambda.flavor == FunctionFlavor::AnonymousMethod {
                diagnostics.push(diagnostic_messages::ANONYMOUS_METHOD_TO_EXPRESSION_TREE, Vec::new());
                return Conversion::NO_CONVERSION;
            }
            let conversion = self.lambda_to_delegate(lambda, delegate, scope);
            if conversion.exists() && lambda.is_statement_body() {
                diagnostics.push(diagnostic_messages::STATEMENT_LAMBDA_TO_EXPRESSION_TREE, Vec::new());
            }
            return conversion;
        }
        if type_queries::is_delegate_type(self.comp, target) {
            return self.lambda_to_delegate(lambda, target, scope);
        }
        self.function_type_conversion(expr, target, scope, lambda.flavor == FunctionFlavor::Lambda)
    }

    fn lambda_to_delegate(&self, lambda: &LambdaExpr, delegate: TypeId, scope: &BindScope<'_>) -> Conversion {
        match delegate_signature(self.comp, delegate) {
            Some(signature) if self.is_lambda_compatible(lambda, &signature, scope) => {
                Conversion::new(ConversionKind::AnonymousFunction)
            }
            _ => Conversion::NO_CONVERSION,
        }
    }

    /// Whether `lambda` converts to a delegate with `signature`: same arity
    /// and ref-kinds, explicit parameter and return types identical, and the
    /// body's returns converting to the delegate's return type.
    ///
    /// A block body without `return` statements is only compatible with a
    /// `void` delegate.
    pub(crate) fn is_lambda_compatible(
        &self,
        lambda: &LambdaExpr,
        signature: &DelegateSignature,
        scope: &BindScope<'_>,
    ) -> bool {
        if lambda.params.len() != signature.params.len()
            || lambda.return_ref != signature.return_ref
            || scope.depth() >= RecursionProfile::NestedConversion.max_depth()
        {
            return false;
        }
        let mut bound: SmallVec<[(Atom, TypeId); 4]> = SmallVec::with_capacity(lambda.params.len());
        for (param, expected) in lambda.params.iter().zip(&signature.params) {
            if param.ref_kind != expected.ref_kind
                || param
                    .ty
                    .is_some_and(|ty| !self.is_identity_convertible(ty, expected.ty))
            {
                return false;
            }
            bound.push((param.name, param.ty.unwrap_or(expected.ty)));
        }
        if lambda
            .return_type
            .is_some_and(|ty| !self.is_identity_convertible(ty, signature.return_type))
        {
            return false;
        }

        let inner = scope.nested(&bound);
        match &lambda.body {
            LambdaBody::Expression(body) => {
                if signature.returns_void() {
                    is_statement_expression(body)
                } else {
                    self.return_converts(body, signature, &inner)
                }
            }
            LambdaBody::Block { returns } => {
                if signature.returns_void() {
                    returns.iter().all(Option::is_none)
                } else {
                    !returns.is_empty()
                        && returns.iter().all(|ret| {
                            ret.as_ref()
                                .is_some_and(|value| self.return_converts(value, signature, &inner))
                        })
                }
            }
        }
    }

    fn return_converts(&self, value: &Expr, signature: &DelegateSignature, scope: &BindScope<'_>) -> bool {
        if signature.return_ref.is_by_ref() {
            return self
                .natural_type_in(value, scope)
                .is_some_and(|ty| self.is_identity_convertible(ty, signature.return_type));
        }
        // Diagnostics inside the body belong to the body's binder.
        let mut scratch = UseSiteDiagnostics::new();
        self.classify_implicit_in(value, signature.return_type, scope, &mut scratch)
            .exists()
    }

    /// Conversion of a lambda or method group to `object`, `Delegate`,
    /// `MulticastDelegate` (and for lambdas `Expression`, `LambdaExpression`)
    /// through its natural function type.
    fn function_type_conversion(
        &self,
        expr: &Expr,
        target: TypeId,
        scope: &BindScope<'_>,
        allow_expression_tree: bool,
    ) -> Conversion {
        if !gates::inferred_delegate_types(self.version) {
            return Conversion::NO_CONVERSION;
        }
        let accepts = matches!(
            target,
            TypeId::DELEGATE | TypeId::MULTICAST_DELEGATE | TypeId::OBJECT
        ) || (allow_expression_tree
            && matches!(target, TypeId::EXPRESSION | TypeId::LAMBDA_EXPRESSION));
        if accepts && self.infer_delegate_type_in(expr, scope).is_ok() {
            Conversion::new(ConversionKind::FunctionType)
        } else {
            Conversion::NO_CONVERSION
        }
    }

    // -------------------------------------------------------------------------
    // Method groups
    // -------------------------------------------------------------------------

    fn classify_method_group(
        &self,
        expr: &Expr,
        group: &MethodGroupExpr,
        target: TypeId,
        scope: &BindScope<'_>,
        diagnostics: &mut UseSiteDiagnostics,
    ) -> Conversion {
        if type_queries::expression_tree_delegate(self.comp, target).is_some() {
            return Conversion::NO_CONVERSION;
        }
        if type_queries::is_delegate_type(self.comp, target) {
            return match delegate_signature(self.comp, target) {
                Some(signature) => self.method_group_to_delegate(group, &signature, diagnostics),
                None => Conversion::NO_CONVERSION,
            };
        }
        self.function_type_conversion(expr, target, scope, false)
    }

    fn method_group_to_delegate(
        &self,
        group: &MethodGroupExpr,
        signature: &DelegateSignature,
        diagnostics: &mut UseSiteDiagnostics,
    ) -> Conversion {
        let Some((method_id, is_extension)) = self.resolve_method_group(group, signature) else {
            return Conversion::NO_CONVERSION;
        };
        let Some(method) = self.comp.methods().get(method_id) else {
            return Conversion::NO_CONVERSION;
        };
        if method.flags.contains(MethodFlags::UNMANAGED_CALLERS_ONLY) {
            diagnostics.push(
                diagnostic_messages::UNMANAGED_CALLERS_ONLY_TO_DELEGATE,
                vec![TypeFormatter::new(self.comp).format_method(method_id)],
            );
            return Conversion::NO_CONVERSION;
        }
        if unsupported_modifier(self.comp, &method).is_some() {
            diagnostics.push(
                diagnostic_messages::NOT_SUPPORTED_BY_LANGUAGE,
                vec![TypeFormatter::new(self.comp).format_method(method_id)],
            );
            return Conversion::NO_CONVERSION;
        }
        Conversion::method_group(method_id, is_extension)
    }

    /// The method a group binds to for a delegate with `signature`, and
    /// whether it is an extension method. The nearest scope with compatible
    /// candidates decides; within it a unique candidate, or a unique exact
    /// one, wins.
    pub(crate) fn resolve_method_group(
        &self,
        group: &MethodGroupExpr,
        signature: &DelegateSignature,
    ) -> Option<(MethodId, bool)> {
        for (methods, is_extension) in method_group_scopes(group) {
            let mut compatible: SmallVec<[(MethodId, bool); 4]> = SmallVec::new();
            for &id in methods {
                let Some(method) = self.comp.methods().get(id) else {
                    continue;
                };
                let GroupCandidate::Closed(subst) =
                    self.method_group_candidate(group, id, &method, is_extension, Some(signature))
                else {
                    continue;
                };
                let candidate = method_signature(self.comp, &method, &subst, is_extension);
                if let Some(exact) = self.method_signature_compatibility(&candidate, signature) {
                    compatible.push((id, exact));
                }
            }
            match compatible.as_slice() {
                [] => continue,
                [(id, _)] => return Some((*id, is_extension)),
                _ => {
                    let mut exact = compatible.iter().filter(|(_, exact)| *exact);
                    return match (exact.next(), exact.next()) {
                        (Some((id, _)), None) => Some((*id, is_extension)),
                        _ => {
                            debug!(
                                candidates = compatible.len(),
                                "method group conversion is ambiguous"
                            );
                            None
                        }
                    };
                }
            }
        }
        None
    }

    /// `Some(exact)` when a method with signature `method` can be bound to a
    /// delegate with signature `delegate`: by-value parameters contravariant
    /// by reference conversion, by-ref ones identical, the return covariant
    /// by reference conversion. `exact` means every type is identical.
    pub(crate) fn method_signature_compatibility(
        &self,
        method: &DelegateSignature,
        delegate: &DelegateSignature,
    ) -> Option<bool> {
        if method.params.len() != delegate.params.len() || method.return_ref != delegate.return_ref {
            return None;
        }
        let mut exact = true;
        for (m, d) in method.params.iter().zip(&delegate.params) {
            if m.ref_kind != d.ref_kind {
                return None;
            }
            if self.is_identity_convertible(d.ty, m.ty) {
                continue;
            }
            if m.ref_kind.is_by_ref() || !self.has_implicit_reference(d.ty, m.ty, 0) {
                return None;
            }
            exact = false;
        }
        match (method.returns_void(), delegate.returns_void()) {
            (true, true) => Some(exact),
            (true, false) | (false, true) => None,
            (false, false) => {
                if self.is_identity_convertible(method.return_type, delegate.return_type) {
                    Some(exact)
                } else if !delegate.return_ref.is_by_ref()
                    && self.has_implicit_reference(method.return_type, delegate.return_type, 0)
                {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // stackalloc, tuples, conditional and switch
    // -------------------------------------------------------------------------

    fn classify_stackalloc(&self, element: TypeId, target: TypeId) -> Conversion {
        if let Some(pointee) = type_queries::pointee(self.comp, target) {
            return if self.comp.options().allow_unsafe && self.is_identity_convertible(pointee, element) {
                compose_stackalloc(ConversionKind::StackAllocToPointerType, Conversion::IDENTITY)
            } else {
                Conversion::NO_CONVERSION
            };
        }
        if !gates::stackalloc_to_span(self.version) {
            return Conversion::NO_CONVERSION;
        }
        let underlying = self.classify_implicit_type(self.comp.span_of(element), target);
        if underlying.exists() {
            compose_stackalloc(ConversionKind::StackAllocToSpanType, underlying)
        } else {
            Conversion::NO_CONVERSION
        }
    }

    fn classify_tuple_literal(
        &self,
        expr: &Expr,
        elements: &[TupleArg],
        target: TypeId,
        scope: &BindScope<'_>,
        diagnostics: &mut UseSiteDiagnostics,
    ) -> Conversion {
        let underlying = type_queries::strip_nullable(self.comp, target);
        if let Some(literal) = self.tuple_literal_elementwise(elements, underlying, scope, diagnostics) {
            return if underlying == target {
                literal
            } else {
                lift_over_nullable(ConversionKind::ImplicitNullable, literal)
            };
        }
        self.classify_via_natural_type(expr, target, scope)
    }

    fn tuple_literal_elementwise(
        &self,
        elements: &[TupleArg],
        target: TypeId,
        scope: &BindScope<'_>,
        diagnostics: &mut UseSiteDiagnostics,
    ) -> Option<Conversion> {
        let targets = type_queries::tuple_elements(self.comp, target)?;
        if targets.len() != elements.len() || elements.is_empty() {
            return None;
        }
        let mut nested = NestedBuffer::with_capacity(elements.len());
        for (element, t) in elements.iter().zip(&targets) {
            let conversion = self.classify_implicit_in(&element.expr, t.ty, scope, diagnostics);
            if !conversion.exists() {
                return None;
            }
            nested.push(conversion);
        }
        Some(compose_tuple(ConversionKind::ImplicitTupleLiteral, nested))
    }

    /// Conditional and switch expressions: through the natural type when it
    /// converts, else arm by arm when the target-typed form is available.
    fn classify_arms(
        &self,
        expr: &Expr,
        target: TypeId,
        scope: &BindScope<'_>,
        diagnostics: &mut UseSiteDiagnostics,
    ) -> Conversion {
        let (kind, arms, target_typed): (ConversionKind, SmallVec<[&Expr; 4]>, bool) = match &expr.kind {
            ExprKind::Conditional {
                when_true,
                when_false,
            } => (
                ConversionKind::ConditionalExpression,
                SmallVec::from_iter([&**when_true, &**when_false]),
                gates::target_typed_conditional(self.version),
            ),
            ExprKind::Switch { arms } if gates::switch_expressions(self.version) => {
                (ConversionKind::SwitchExpression, arms.iter().collect(), true)
            }
            _ => return Conversion::NO_CONVERSION,
        };

        if let Some(natural) = self.natural_type_in(expr, scope) {
            let conversion = self.classify_implicit_type(natural, target);
            if conversion.exists() {
                return conversion;
            }
        }
        if !target_typed {
            return Conversion::NO_CONVERSION;
        }
        let mut nested = NestedBuffer::with_capacity(arms.len());
        for arm in arms {
            let conversion = self.classify_implicit_in(arm, target, scope, diagnostics);
            if !conversion.exists() {
                return Conversion::NO_CONVERSION;
            }
            nested.push(conversion);
        }
        compose_switch_or_conditional(kind, nested)
    }

    // -------------------------------------------------------------------------
    // Natural types
    // -------------------------------------------------------------------------

    /// The type an expression has on its own, if any. Lambdas and method
    /// groups have none here; see `infer_delegate_type`.
    pub fn natural_type(&self, expr: &Expr) -> Option<TypeId> {
        self.natural_type_in(expr, &BindScope::EMPTY)
    }

    pub(crate) fn natural_type_in(&self, expr: &Expr, scope: &BindScope<'_>) -> Option<TypeId> {
        let types = self.comp.types();
        match &expr.kind {
            ExprKind::Typed { ty, .. } => Some(*ty),
            ExprKind::Parameter(name) => scope.lookup(*name),
            ExprKind::StackAlloc { element } => Some(if gates::stackalloc_to_span(self.version) {
                self.comp.span_of(*element)
            } else {
                types.pointer(*element)
            }),
            ExprKind::TupleLiteral(elements) => {
                let mut tuple: SmallVec<[TupleElement; 4]> = SmallVec::with_capacity(elements.len());
                for element in elements {
                    tuple.push(TupleElement {
                        ty: self.natural_type_in(&element.expr, scope)?,
                        name: element.name,
                    });
                }
                Some(types.tuple(tuple))
            }
            ExprKind::InterpolatedString => Some(TypeId::STRING),
            ExprKind::Conditional {
                when_true,
                when_false,
            } => self
                .best_common_type_in(&[&**when_true, &**when_false], scope, None)
                .ok(),
            ExprKind::Switch { arms } if gates::switch_expressions(self.version) => {
                let arms: SmallVec<[&Expr; 8]> = arms.iter().collect();
                self.best_common_type_in(&arms, scope, None).ok()
            }
            ExprKind::Invocation { group, args } => self.invocation_type(group, args, scope),
            ExprKind::ImplicitArray { elements } => {
                let elements: SmallVec<[&Expr; 8]> = elements.iter().collect();
                self.best_common_type_in(&elements, scope, None)
                    .ok()
                    .map(|element| types.sz_array(element))
            }
            ExprKind::Switch { .. }
            | ExprKind::NullLiteral
            | ExprKind::DefaultLiteral
            | ExprKind::Throw
            | ExprKind::Lambda(_)
            | ExprKind::MethodGroup(_)
            | ExprKind::TargetTypedNew { .. } => None,
        }
    }

    /// Return type of the member a call binds to. The arguments are the
    /// literal argument expressions, so nested calls are inferred from their
    /// own arguments rather than from an outer target.
    fn invocation_type(
        &self,
        group: &MethodGroupExpr,
        args: &[Argument],
        scope: &BindScope<'_>,
    ) -> Option<TypeId> {
        let candidates: SmallVec<[MethodId; 4]> = group
            .candidates
            .iter()
            .copied()
            .filter(|&id| {
                self.comp
                    .methods()
                    .get(id)
                    .is_some_and(|method| is_member_candidate(group.receiver, &method))
            })
            .collect();
        match OverloadJudge::new(*self).resolve_in(&candidates, args, &group.type_args, scope) {
            OverloadResolutionResult::Success {
                method, type_args, ..
            } => {
                let info = self.comp.methods().get(method)?;
                let subst = TypeSubstitution::from_args(&info.type_params, &type_args);
                Some(instantiate_type(self.comp.types(), info.return_type, &subst))
            }
            _ => None,
        }
    }
}

/// Expressions allowed as the body of a lambda converted to a `void`
/// delegate: calls, throws and bound non-constant expressions.
fn is_statement_expression(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Invocation { .. } | ExprKind::Throw | ExprKind::Typed { constant: None, .. }
    )
}

#[cfg(test)]
#[path = "../../tests/expression_tests.rs"]
mod tests;
