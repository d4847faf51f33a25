//! Natural function types of lambdas and method groups.
//!
//! A lambda whose parameters are all explicitly typed, or a method group
//! whose nearest scope yields one distinct signature, has a natural delegate
//! type. The delegate is chosen in a fixed order:
//!
//! 1. `Action`/`Func` when the signature is plain (no ref-kinds, no
//!    `params`) and every type can be a type argument
//! 2. the lowest-declared non-generic named delegate with an equal `Invoke`
//!    signature
//! 3. a synthesized delegate for the signature's shape
//!
//! Root-scope results are cached on the compilation per expression and
//! language version.

use coerce_common::diagnostics::{DiagnosticMessage, diagnostic_messages};
use coerce_common::gates;
use coerce_common::interner::Atom;
use coerce_common::limits::MAX_FUNC_ARITY;
use smallvec::SmallVec;
use std::fmt;
use tracing::debug;

use crate::compilation::DelegateInferenceResult;
use crate::conversion::{BindScope, ConversionClassifier, ConversionKind};
use crate::def::DefId;
use crate::delegate::signature::{
    DelegateSignature, SignatureParam, delegate_signature, method_signature, unsupported_modifier,
};
use crate::delegate::synthesized::{
    SynthesisError, SynthesizedDelegateId, check_type_arguments, synthesize_or_reuse,
};
use crate::expr::{Expr, ExprKind, LambdaBody, LambdaExpr, MethodGroupExpr, Receiver};
use crate::infer::InferenceArg;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::method::{MethodFlags, MethodId, MethodInfo, MethodKind};
use crate::query_trace;
use crate::types::{Accessibility, RefKind, TypeId};

/// Where an inferred delegate type came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DelegateSource {
    /// `Action` or `Func`.
    WellKnown(DefId),
    Named(DefId),
    Synthesized(SynthesizedDelegateId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferredDelegateType {
    pub ty: TypeId,
    pub source: DelegateSource,
    pub signature: DelegateSignature,
}

impl InferredDelegateType {
    pub fn is_synthesized(&self) -> bool {
        matches!(self.source, DelegateSource::Synthesized(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DelegateInferenceError {
    /// Only lambdas, anonymous methods and method groups have function types.
    NotAFunction,
    /// The language version predates inferred delegate types.
    FeatureNotAvailable,
    ImplicitlyTypedParameters,
    /// Returns disagree, or the body's type is unknown.
    CannotInferReturnType,
    NoCandidates,
    /// More than one distinct candidate signature.
    AmbiguousMethodGroup { candidates: Vec<MethodId> },
    /// A generic method whose type arguments are neither given nor inferable.
    OpenGenericMethod(MethodId),
    UnmanagedCallersOnly(MethodId),
    UnsupportedModifier { method: MethodId, modifier: Atom },
    UnsupportedSignature(SynthesisError),
}

impl DelegateInferenceError {
    pub fn diagnostic(&self) -> DiagnosticMessage {
        match self {
            Self::UnmanagedCallersOnly(_) => diagnostic_messages::UNMANAGED_CALLERS_ONLY_TO_DELEGATE,
            Self::UnsupportedModifier { .. } => diagnostic_messages::NOT_SUPPORTED_BY_LANGUAGE,
            Self::AmbiguousMethodGroup { .. } => diagnostic_messages::AMBIGUOUS_CALL,
            _ => diagnostic_messages::DELEGATE_TYPE_COULD_NOT_BE_INFERRED,
        }
    }
}

impl fmt::Display for DelegateInferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAFunction => f.write_str("expression is not a lambda or method group"),
            Self::FeatureNotAvailable => {
                f.write_str("inferred delegate types are not available in this language version")
            }
            Self::ImplicitlyTypedParameters => f.write_str("lambda has implicitly typed parameters"),
            Self::CannotInferReturnType => f.write_str("return type of the lambda cannot be inferred"),
            Self::NoCandidates => f.write_str("method group has no usable candidates"),
            Self::AmbiguousMethodGroup { candidates } => write!(
                f,
                "method group has {} candidates with different signatures",
                candidates.len()
            ),
            Self::OpenGenericMethod(method) => {
                write!(f, "type arguments of method {} cannot be determined", method.0)
            }
            Self::UnmanagedCallersOnly(method) => {
                write!(f, "method {} is only callable from unmanaged code", method.0)
            }
            Self::UnsupportedModifier { method, .. } => write!(
                f,
                "method {} has a required modifier the language does not support",
                method.0
            ),
            Self::UnsupportedSignature(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DelegateInferenceError {}

// =============================================================================
// Method group candidates
// =============================================================================

/// A method group's candidate scopes: its members, then for a value
/// receiver each extension scope, nearest first. The flag marks extension
/// scopes.
pub(crate) fn method_group_scopes(
    group: &MethodGroupExpr,
) -> impl Iterator<Item = (&[MethodId], bool)> + '_ {
    let extensions = matches!(group.receiver, Receiver::Value(_));
    std::iter::once((group.candidates.as_slice(), false)).chain(
        group
            .extension_scopes
            .iter()
            .filter(move |_| extensions)
            .map(|scope| (scope.as_slice(), true)),
    )
}

/// Whether a member is reachable through `receiver`: static members through
/// a type, instance members through a value, both through a simple name.
/// Qualified access only reaches internal and public members.
pub(crate) fn is_member_candidate(receiver: Receiver, method: &MethodInfo) -> bool {
    let reachable = match receiver {
        Receiver::None => true,
        Receiver::Type(_) => method.is_static(),
        Receiver::Value(_) => !method.is_static(),
    };
    reachable
        && method.kind == MethodKind::Ordinary
        && (receiver == Receiver::None || method.accessibility >= Accessibility::Internal)
}

pub(crate) enum GroupCandidate {
    NotApplicable,
    /// Generic, with type arguments that cannot be determined.
    Open,
    Closed(TypeSubstitution),
}

impl<'a> ConversionClassifier<'a> {
    /// Decide whether `method` takes part in `group` and close it over its
    /// type arguments: explicit ones, else inferred from the receiver (for
    /// extension methods) and the parameter types of `target`.
    pub(crate) fn method_group_candidate(
        &self,
        group: &MethodGroupExpr,
        id: MethodId,
        method: &MethodInfo,
        is_extension: bool,
        target: Option<&DelegateSignature>,
    ) -> GroupCandidate {
        let receiver = match group.receiver {
            Receiver::Value(ty) => Some(ty),
            Receiver::None | Receiver::Type(_) => None,
        };
        let receiver_param = if is_extension {
            let (Some(receiver), Some(first)) = (receiver, method.params.first()) else {
                return GroupCandidate::NotApplicable;
            };
            if !(method.is_extension() && method.is_static()) {
                return GroupCandidate::NotApplicable;
            }
            Some((receiver, first.ty))
        } else {
            if !is_member_candidate(group.receiver, method) {
                return GroupCandidate::NotApplicable;
            }
            None
        };

        let subst = if !method.is_generic() {
            TypeSubstitution::new()
        } else if !group.type_args.is_empty() {
            if group.type_args.len() != method.type_params.len() {
                return GroupCandidate::NotApplicable;
            }
            TypeSubstitution::from_args(&method.type_params, &group.type_args)
        } else {
            let mut params: SmallVec<[(TypeId, RefKind); 4]> = SmallVec::new();
            let mut args: SmallVec<[InferenceArg<'_>; 4]> = SmallVec::new();
            if let Some((receiver, first)) = receiver_param {
                params.push((first, RefKind::None));
                args.push(InferenceArg::Type {
                    ty: receiver,
                    ref_kind: RefKind::None,
                });
            }
            let rest = &method.params[usize::from(is_extension)..];
            if let Some(target) = target.filter(|t| t.params.len() == rest.len()) {
                for (param, expected) in rest.iter().zip(&target.params) {
                    params.push((param.ty, param.ref_kind));
                    args.push(InferenceArg::Type {
                        ty: expected.ty,
                        ref_kind: expected.ref_kind,
                    });
                }
            }
            match self.infer_type_args_core(id, method, &params, &args, &BindScope::EMPTY, None) {
                Ok(type_args) => TypeSubstitution::from_args(&method.type_params, &type_args),
                Err(_) => return GroupCandidate::Open,
            }
        };

        if let Some((receiver, first)) = receiver_param {
            let first = instantiate_type(self.comp.types(), first, &subst);
            let kind = self.classify_standard_implicit(receiver, first).kind();
            if !matches!(
                kind,
                ConversionKind::Identity | ConversionKind::ImplicitReference | ConversionKind::Boxing
            ) {
                return GroupCandidate::NotApplicable;
            }
        }
        GroupCandidate::Closed(subst)
    }

    // =========================================================================
    // Inference
    // =========================================================================

    /// The natural delegate type of a lambda, anonymous method or method
    /// group.
    pub fn infer_delegate_type(&self, expr: &Expr) -> Result<InferredDelegateType, DelegateInferenceError> {
        let traced = query_trace::enabled().then(|| {
            let qid = query_trace::next_query_id();
            query_trace::expr_start(qid, "infer_delegate_type", expr.id, self.version.as_str());
            qid
        });
        let cached = self.comp.cached_delegate_inference(expr.id, self.version);
        let cache_hit = cached.is_some();
        let result = match cached {
            Some(result) => result,
            None => self.infer_delegate_type_in(expr, &BindScope::EMPTY),
        };
        if let Some(qid) = traced {
            query_trace::type_end(
                qid,
                "infer_delegate_type",
                result.as_ref().ok().map(|inferred| inferred.ty),
                cache_hit,
            );
        }
        result
    }

    pub(crate) fn infer_delegate_type_in(&self, expr: &Expr, scope: &BindScope<'_>) -> DelegateInferenceResult {
        // A lambda nested in another may read the outer parameters.
        if !scope.is_root() {
            return self.compute_delegate_type(expr, scope);
        }
        if let Some(cached) = self.comp.cached_delegate_inference(expr.id, self.version) {
            return cached;
        }
        let result = self.compute_delegate_type(expr, scope);
        self.comp.cache_delegate_inference(expr.id, self.version, result)
    }

    fn compute_delegate_type(&self, expr: &Expr, scope: &BindScope<'_>) -> DelegateInferenceResult {
        if !gates::inferred_delegate_types(self.version) {
            return Err(DelegateInferenceError::FeatureNotAvailable);
        }
        let signature = match &expr.kind {
            ExprKind::Lambda(lambda) => self.lambda_signature(lambda, scope)?,
            ExprKind::MethodGroup(group) => self.method_group_signature(group)?,
            _ => return Err(DelegateInferenceError::NotAFunction),
        };
        let inferred = self.select_delegate(signature)?;
        debug!(
            expr = expr.id.0,
            ty = inferred.ty.0,
            source = ?inferred.source,
            "inferred delegate type"
        );
        Ok(inferred)
    }

    fn lambda_signature(
        &self,
        lambda: &LambdaExpr,
        scope: &BindScope<'_>,
    ) -> Result<DelegateSignature, DelegateInferenceError> {
        let mut bound: SmallVec<[(Atom, TypeId); 4]> = SmallVec::with_capacity(lambda.params.len());
        let mut params: SmallVec<[SignatureParam; 4]> = SmallVec::with_capacity(lambda.params.len());
        for param in &lambda.params {
            let ty = param
                .ty
                .ok_or(DelegateInferenceError::ImplicitlyTypedParameters)?;
            bound.push((param.name, ty));
            params.push(SignatureParam {
                ty,
                ref_kind: param.ref_kind,
                is_params: param.is_params,
            });
        }
        let return_type = match lambda.return_type {
            Some(ty) if gates::lambda_explicit_return_type(self.version) => ty,
            _ => self
                .infer_lambda_return(lambda, &scope.nested(&bound))
                .ok_or(DelegateInferenceError::CannotInferReturnType)?,
        };
        Ok(DelegateSignature::new(params, return_type, lambda.return_ref))
    }

    /// Expression bodies have their natural type (`void` for void calls);
    /// block bodies without value returns are `void`, otherwise the returned
    /// values' best common type.
    pub(crate) fn infer_lambda_return(&self, lambda: &LambdaExpr, inner: &BindScope<'_>) -> Option<TypeId> {
        match &lambda.body {
            LambdaBody::Expression(body) => match body.kind {
                ExprKind::Throw => None,
                _ => self.natural_type_in(body, inner),
            },
            LambdaBody::Block { returns } => {
                let values: SmallVec<[&Expr; 4]> = returns.iter().flatten().collect();
                if values.is_empty() {
                    Some(TypeId::VOID)
                } else if values.len() != returns.len() {
                    None
                } else {
                    self.best_common_type_in(&values, inner, None).ok()
                }
            }
        }
    }

    fn method_group_signature(
        &self,
        group: &MethodGroupExpr,
    ) -> Result<DelegateSignature, DelegateInferenceError> {
        for (methods, is_extension) in method_group_scopes(group) {
            let mut found: SmallVec<[(MethodId, DelegateSignature); 2]> = SmallVec::new();
            let mut open: SmallVec<[MethodId; 2]> = SmallVec::new();
            for &id in methods {
                let Some(method) = self.comp.methods().get(id) else {
                    continue;
                };
                match self.method_group_candidate(group, id, &method, is_extension, None) {
                    GroupCandidate::NotApplicable => {}
                    GroupCandidate::Open => open.push(id),
                    GroupCandidate::Closed(subst) => {
                        let signature = method_signature(self.comp, &method, &subst, is_extension);
                        if !found.iter().any(|(_, seen)| *seen == signature) {
                            found.push((id, signature));
                        }
                    }
                }
            }
            let first_open = open.first().copied();
            match (found.len(), first_open) {
                (0, None) => continue,
                (0, Some(id)) => return Err(DelegateInferenceError::OpenGenericMethod(id)),
                (1, None) => {}
                _ => {
                    let candidates = found.iter().map(|(id, _)| *id).chain(open).collect();
                    return Err(DelegateInferenceError::AmbiguousMethodGroup { candidates });
                }
            }
            let (id, signature) = found.swap_remove(0);
            let Some(method) = self.comp.methods().get(id) else {
                return Err(DelegateInferenceError::NoCandidates);
            };
            if method.flags.contains(MethodFlags::UNMANAGED_CALLERS_ONLY) {
                return Err(DelegateInferenceError::UnmanagedCallersOnly(id));
            }
            if let Some(modifier) = unsupported_modifier(self.comp, &method) {
                return Err(DelegateInferenceError::UnsupportedModifier {
                    method: id,
                    modifier,
                });
            }
            return Ok(signature);
        }
        Err(DelegateInferenceError::NoCandidates)
    }

    // =========================================================================
    // Delegate selection
    // =========================================================================

    fn select_delegate(&self, signature: DelegateSignature) -> DelegateInferenceResult {
        if let Some((def, ty)) = self.well_known_delegate(&signature) {
            return Ok(InferredDelegateType {
                ty,
                source: DelegateSource::WellKnown(def),
                signature,
            });
        }
        if let Some((def, ty)) = self.matching_named_delegate(&signature) {
            return Ok(InferredDelegateType {
                ty,
                source: DelegateSource::Named(def),
                signature,
            });
        }
        let (ty, info) = synthesize_or_reuse(self.comp, &signature)
            .map_err(DelegateInferenceError::UnsupportedSignature)?;
        Ok(InferredDelegateType {
            ty,
            source: DelegateSource::Synthesized(info.id),
            signature,
        })
    }

    fn well_known_delegate(&self, signature: &DelegateSignature) -> Option<(DefId, TypeId)> {
        let arity = signature.params.len();
        if !signature.is_plain()
            || arity > MAX_FUNC_ARITY
            || check_type_arguments(self.comp, signature).is_err()
        {
            return None;
        }
        let params: SmallVec<[TypeId; 4]> = signature.param_types().collect();
        let well_known = self.comp.well_known();
        if signature.returns_void() {
            Some((*well_known.action.get(arity)?, self.comp.action_of(&params)?))
        } else {
            Some((
                *well_known.func.get(arity)?,
                self.comp.func_of(&params, signature.return_type)?,
            ))
        }
    }

    fn matching_named_delegate(&self, signature: &DelegateSignature) -> Option<(DefId, TypeId)> {
        let well_known = self.comp.well_known();
        self.comp.defs().delegates().into_iter().find_map(|def| {
            if well_known.action.contains(&def) || well_known.func.contains(&def) {
                return None;
            }
            let info = self.comp.defs().get(def)?;
            if !info.type_params.is_empty() || info.accessibility == Accessibility::Private {
                return None;
            }
            let ty = self.comp.named(def);
            (delegate_signature(self.comp, ty)? == *signature).then_some((def, ty))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/delegate_infer_tests.rs"]
mod tests;
