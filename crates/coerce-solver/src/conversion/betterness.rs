//! Better conversion judgments consulted by overload resolution.
//!
//! Given one argument and two candidate parameter types, decide which
//! conversion is better:
//! 1. an exact match beats a non-exact one
//! 2. otherwise the better conversion target wins
//! 3. from the version where lambdas and method groups have a natural type,
//!    a conversion through that function type loses to any other

use coerce_common::gates;
use coerce_common::interner::Atom;
use smallvec::SmallVec;

use super::{BindScope, Conversion, ConversionClassifier};
use crate::delegate::signature::{DelegateSignature, delegate_signature};
use crate::expr::{Expr, ExprKind, LambdaExpr};
use crate::type_queries;
use crate::types::{IntrinsicKind, TypeId};

/// Outcome of comparing two conversions (or targets).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Betterness {
    Left,
    Right,
    Neither,
}

impl Betterness {
    pub fn flip(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Neither => Self::Neither,
        }
    }

    fn from_flags(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, false) => Self::Left,
            (false, true) => Self::Right,
            _ => Self::Neither,
        }
    }
}

impl<'a> ConversionClassifier<'a> {
    /// Whether `t1` is a better conversion target than `t2`.
    pub fn better_conversion_target(&self, t1: TypeId, t2: TypeId) -> Betterness {
        if self.is_identity_convertible(t1, t2) {
            return Betterness::Neither;
        }
        let one_to_two = self.classify_implicit_type(t1, t2).exists();
        let two_to_one = self.classify_implicit_type(t2, t1).exists();
        if one_to_two != two_to_one {
            return Betterness::from_flags(one_to_two, two_to_one);
        }
        if let (Some(d1), Some(d2)) = (self.delegate_or_tree(t1), self.delegate_or_tree(t2)) {
            return self.better_delegate_return(&d1, &d2);
        }
        let signed = |ty: TypeId| IntrinsicKind::from_type_id(ty).is_some_and(IntrinsicKind::is_signed_integral);
        let unsigned = |ty: TypeId| IntrinsicKind::from_type_id(ty).is_some_and(IntrinsicKind::is_unsigned_integral);
        Betterness::from_flags(signed(t1) && unsigned(t2), signed(t2) && unsigned(t1))
    }

    /// Signature of a delegate type, or of `D` for `Expression<D>`.
    fn delegate_or_tree(&self, ty: TypeId) -> Option<DelegateSignature> {
        let delegate = type_queries::expression_tree_delegate(self.comp, ty).unwrap_or(ty);
        if !type_queries::is_delegate_type(self.comp, delegate) {
            return None;
        }
        delegate_signature(self.comp, delegate)
    }

    /// Delegates with identical parameter lists compare by return type: a
    /// value-returning delegate beats a `void` one, otherwise the better
    /// return target wins.
    fn better_delegate_return(&self, d1: &DelegateSignature, d2: &DelegateSignature) -> Betterness {
        let same_params = d1.params.len() == d2.params.len()
            && d1
                .params
                .iter()
                .zip(&d2.params)
                .all(|(a, b)| a.ref_kind == b.ref_kind && self.is_identity_convertible(a.ty, b.ty));
        if !same_params {
            return Betterness::Neither;
        }
        match (d1.returns_void(), d2.returns_void()) {
            (false, true) => Betterness::Left,
            (true, false) => Betterness::Right,
            (true, true) => Betterness::Neither,
            (false, false) => self.better_conversion_target(d1.return_type, d2.return_type),
        }
    }

    /// Which of `c1` (from `expr` to `t1`) and `c2` (from `expr` to `t2`) is
    /// the better conversion.
    pub fn better_conversion_from_expression(
        &self,
        expr: &Expr,
        c1: &Conversion,
        t1: TypeId,
        c2: &Conversion,
        t2: TypeId,
    ) -> Betterness {
        self.better_conversion_from_expression_in(expr, c1, t1, c2, t2, &BindScope::EMPTY)
    }

    pub(crate) fn better_conversion_from_expression_in(
        &self,
        expr: &Expr,
        c1: &Conversion,
        t1: TypeId,
        c2: &Conversion,
        t2: TypeId,
        scope: &BindScope<'_>,
    ) -> Betterness {
        if self.is_identity_convertible(t1, t2) {
            return Betterness::Neither;
        }
        if gates::function_type_conversion_is_worse(self.version) {
            let f1 = c1.kind().is_function_type();
            let f2 = c2.kind().is_function_type();
            if f1 != f2 {
                return Betterness::from_flags(f2, f1);
            }
        }
        let exact1 = self.is_exact_match(expr, t1, scope);
        let exact2 = self.is_exact_match(expr, t2, scope);
        if exact1 != exact2 {
            return Betterness::from_flags(exact1, exact2);
        }
        self.better_conversion_target(t1, t2)
    }

    /// `expr` matches `target` exactly: its type is identical to the target,
    /// a tuple literal matches element-wise, or a lambda's inferred return
    /// type is identical to the target delegate's.
    fn is_exact_match(&self, expr: &Expr, target: TypeId, scope: &BindScope<'_>) -> bool {
        match &expr.kind {
            ExprKind::Lambda(lambda) => self
                .delegate_or_tree(target)
                .is_some_and(|signature| self.lambda_matches_exactly(lambda, &signature, scope)),
            ExprKind::TupleLiteral(elements) => {
                type_queries::tuple_elements(self.comp, target).is_some_and(|targets| {
                    targets.len() == elements.len()
                        && elements
                            .iter()
                            .zip(&targets)
                            .all(|(element, t)| self.is_exact_match(&element.expr, t.ty, scope))
                })
            }
            ExprKind::MethodGroup(_) => false,
            _ => self
                .natural_type_in(expr, scope)
                .is_some_and(|ty| self.is_identity_convertible(ty, target)),
        }
    }

    fn lambda_matches_exactly(
        &self,
        lambda: &LambdaExpr,
        signature: &DelegateSignature,
        scope: &BindScope<'_>,
    ) -> bool {
        if lambda.params.len() != signature.params.len() {
            return false;
        }
        let bound: SmallVec<[(Atom, TypeId); 4]> = lambda
            .params
            .iter()
            .zip(&signature.params)
            .map(|(param, expected)| (param.name, param.ty.unwrap_or(expected.ty)))
            .collect();
        if signature.returns_void() {
            return true;
        }
        let returned = match lambda.return_type {
            Some(ty) if gates::lambda_explicit_return_type(self.version) => Some(ty),
            _ => self.infer_lambda_return(lambda, &scope.nested(&bound)),
        };
        returned.is_some_and(|ty| self.is_identity_convertible(ty, signature.return_type))
    }
}

#[cfg(test)]
#[path = "../../tests/betterness_tests.rs"]
mod tests;
