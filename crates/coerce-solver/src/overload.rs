//! Overload judgment over already-gathered candidates.
//!
//! Candidate gathering (name lookup, accessibility, receiver filtering) is the
//! caller's job. Given the candidates and the argument expressions this
//! decides:
//! 1. applicability: argument count (normal or expanded `params` form), type
//!    argument inference for generic candidates, ref-kinds, and an implicit
//!    conversion for every argument
//! 2. the unique best applicable candidate, by better conversion from
//!    expression per argument, then the generic and `params` tie-breaks
//!
//! Ambiguity is reported with every applicable candidate listed.

use coerce_common::CancellationToken;
use coerce_common::cancel::CancellationPoller;
use coerce_common::diagnostics::{DiagnosticMessage, diagnostic_messages};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::conversion::betterness::Betterness;
use crate::conversion::{BindScope, Conversion, ConversionClassifier};
use crate::diagnostics::UseSiteDiagnostics;
use crate::expr::Argument;
use crate::infer::method_type_args::{InferenceArg, ParamList, param_forms};
use crate::infer::InferenceError;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::method::{MethodId, MethodInfo};
use crate::query_trace;
use crate::types::{RefKind, TypeArgs, TypeId};

/// Why a candidate was not applicable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    UnknownMethod,
    ArgumentCount,
    TypeArgumentCount { expected: usize, actual: usize },
    TypeInference(InferenceError),
    RefKindMismatch { arg: usize },
    NoConversion { arg: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedCandidate {
    pub method: MethodId,
    pub reason: RejectionReason,
}

#[derive(Clone, Debug)]
pub enum OverloadResolutionResult {
    Success {
        method: MethodId,
        type_args: TypeArgs,
        /// Argument to parameter conversions, in argument order.
        conversions: Vec<Conversion>,
    },
    /// More than one applicable candidate and none better than the rest.
    Ambiguous { candidates: Vec<MethodId> },
    NoApplicable { rejected: Vec<RejectedCandidate> },
    Cancelled,
}

impl OverloadResolutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn method(&self) -> Option<MethodId> {
        match self {
            Self::Success { method, .. } => Some(*method),
            _ => None,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Ambiguous { .. } => "ambiguous",
            Self::NoApplicable { .. } => "no_applicable",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn diagnostic(&self) -> Option<DiagnosticMessage> {
        match self {
            Self::Success { .. } => None,
            Self::Ambiguous { .. } => Some(diagnostic_messages::AMBIGUOUS_CALL),
            Self::NoApplicable { rejected } => match rejected.as_slice() {
                [RejectedCandidate {
                    reason: RejectionReason::TypeInference(_),
                    ..
                }] => Some(diagnostic_messages::TYPE_ARGUMENTS_CANNOT_BE_INFERRED),
                _ => Some(diagnostic_messages::CANNOT_CONVERT),
            },
            Self::Cancelled => Some(diagnostic_messages::OPERATION_CANCELLED),
        }
    }
}

impl fmt::Display for OverloadResolutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { method, .. } => write!(f, "resolved to method {}", method.0),
            Self::Ambiguous { candidates } => {
                write!(f, "call is ambiguous between {} candidates", candidates.len())
            }
            Self::NoApplicable { rejected } => {
                write!(f, "none of {} candidates is applicable", rejected.len())
            }
            Self::Cancelled => f.write_str("overload resolution was cancelled"),
        }
    }
}

/// An applicable candidate with its parameters instantiated.
struct Applicable {
    method: MethodId,
    info: Arc<MethodInfo>,
    type_args: TypeArgs,
    params: ParamList,
    expanded: bool,
    conversions: Vec<Conversion>,
}

/// Picks the best of a set of candidate methods for a call.
#[derive(Copy, Clone)]
pub struct OverloadJudge<'a> {
    classifier: ConversionClassifier<'a>,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> OverloadJudge<'a> {
    pub fn new(classifier: ConversionClassifier<'a>) -> Self {
        Self {
            classifier,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn resolve(
        &self,
        candidates: &[MethodId],
        args: &[Argument],
        explicit_type_args: &[TypeId],
    ) -> OverloadResolutionResult {
        let traced = query_trace::enabled().then(|| {
            let qid = query_trace::next_query_id();
            query_trace::method_start(
                qid,
                "resolve_overload",
                candidates.first().copied().unwrap_or(MethodId(0)),
                args.len(),
                self.classifier.version.as_str(),
            );
            qid
        });
        let result = self.resolve_in(candidates, args, explicit_type_args, &BindScope::EMPTY);
        if let Some(qid) = traced {
            query_trace::relation_end(qid, "resolve_overload", result.outcome(), result.is_success());
        }
        result
    }

    pub(crate) fn resolve_in(
        &self,
        candidates: &[MethodId],
        args: &[Argument],
        explicit_type_args: &[TypeId],
        scope: &BindScope<'_>,
    ) -> OverloadResolutionResult {
        let interval = self.classifier.comp.options().cancellation_check_interval;
        let mut poller = self.cancel.map(|token| CancellationPoller::new(token, interval));
        let inference_args: SmallVec<[InferenceArg<'_>; 4]> =
            args.iter().map(InferenceArg::from_argument).collect();

        let mut applicable: Vec<Applicable> = Vec::new();
        let mut rejected: Vec<RejectedCandidate> = Vec::new();
        for &method in candidates {
            if poller.as_mut().is_some_and(|p| p.tick()) {
                return OverloadResolutionResult::Cancelled;
            }
            match self.applicable(method, args, &inference_args, explicit_type_args, scope, poller.as_mut()) {
                Ok(candidate) => applicable.push(candidate),
                Err(RejectionReason::TypeInference(InferenceError::Cancelled)) => {
                    return OverloadResolutionResult::Cancelled;
                }
                Err(reason) => {
                    trace!(method = method.0, ?reason, "candidate not applicable");
                    rejected.push(RejectedCandidate { method, reason });
                }
            }
        }

        match applicable.len() {
            0 => OverloadResolutionResult::NoApplicable { rejected },
            1 => Self::success(applicable.swap_remove(0)),
            _ => match self.best(&applicable, args, scope) {
                Some(index) => Self::success(applicable.swap_remove(index)),
                None => {
                    debug!(candidates = applicable.len(), "ambiguous call");
                    OverloadResolutionResult::Ambiguous {
                        candidates: applicable.iter().map(|c| c.method).collect(),
                    }
                }
            },
        }
    }

    fn success(candidate: Applicable) -> OverloadResolutionResult {
        OverloadResolutionResult::Success {
            method: candidate.method,
            type_args: candidate.type_args,
            conversions: candidate.conversions,
        }
    }

    // -------------------------------------------------------------------------
    // Applicability
    // -------------------------------------------------------------------------

    fn applicable(
        &self,
        method: MethodId,
        args: &[Argument],
        inference_args: &[InferenceArg<'_>],
        explicit_type_args: &[TypeId],
        scope: &BindScope<'_>,
        mut poller: Option<&mut CancellationPoller<'_>>,
    ) -> Result<Applicable, RejectionReason> {
        let comp = self.classifier.comp;
        let info = comp.methods().get(method).ok_or(RejectionReason::UnknownMethod)?;
        if !explicit_type_args.is_empty() && explicit_type_args.len() != info.type_params.len() {
            return Err(RejectionReason::TypeArgumentCount {
                expected: info.type_params.len(),
                actual: explicit_type_args.len(),
            });
        }

        let forms = param_forms(comp, &info, args.len());
        if forms.is_empty() {
            return Err(RejectionReason::ArgumentCount);
        }
        let mut last = RejectionReason::ArgumentCount;
        for (index, form) in forms.into_iter().enumerate() {
            let expanded = index > 0 || info.params.len() != args.len();
            let type_args: TypeArgs = if !info.is_generic() {
                TypeArgs::new()
            } else if !explicit_type_args.is_empty() {
                explicit_type_args.iter().copied().collect()
            } else {
                match self.classifier.infer_type_args_core(
                    method,
                    &info,
                    &form,
                    inference_args,
                    scope,
                    poller.as_deref_mut(),
                ) {
                    Ok(type_args) => type_args,
                    Err(err) => {
                        last = RejectionReason::TypeInference(err);
                        if matches!(last, RejectionReason::TypeInference(InferenceError::Cancelled)) {
                            return Err(last);
                        }
                        continue;
                    }
                }
            };
            let subst = TypeSubstitution::from_args(&info.type_params, &type_args);
            let params: ParamList = form
                .iter()
                .map(|&(ty, ref_kind)| (instantiate_type(comp.types(), ty, &subst), ref_kind))
                .collect();
            match self.argument_conversions(args, &params, scope) {
                Ok(conversions) => {
                    return Ok(Applicable {
                        method,
                        info: Arc::clone(&info),
                        type_args,
                        params,
                        expanded,
                        conversions,
                    });
                }
                Err(reason) => last = reason,
            }
        }
        Err(last)
    }

    fn argument_conversions(
        &self,
        args: &[Argument],
        params: &[(TypeId, RefKind)],
        scope: &BindScope<'_>,
    ) -> Result<Vec<Conversion>, RejectionReason> {
        let mut conversions = Vec::with_capacity(args.len());
        // Problems inside arguments are reported when the chosen overload's
        // arguments are bound.
        let mut scratch = UseSiteDiagnostics::new();
        for (arg, (i, &(ty, ref_kind))) in args.iter().zip(params.iter().enumerate()) {
            let ref_matches = arg.ref_kind == ref_kind
                || (ref_kind == RefKind::In && arg.ref_kind == RefKind::None);
            if !ref_matches {
                return Err(RejectionReason::RefKindMismatch { arg: i });
            }
            let conversion = if arg.ref_kind.is_by_ref() {
                match self.classifier.natural_type_in(&arg.expr, scope) {
                    Some(source) if self.classifier.is_identity_convertible(source, ty) => {
                        Conversion::IDENTITY
                    }
                    _ => Conversion::NO_CONVERSION,
                }
            } else {
                self.classifier.classify_implicit_in(&arg.expr, ty, scope, &mut scratch)
            };
            if !conversion.exists() {
                return Err(RejectionReason::NoConversion { arg: i });
            }
            conversions.push(conversion);
        }
        Ok(conversions)
    }

    // -------------------------------------------------------------------------
    // Betterness
    // -------------------------------------------------------------------------

    /// Index of the candidate better than every other, if one exists.
    fn best(&self, applicable: &[Applicable], args: &[Argument], scope: &BindScope<'_>) -> Option<usize> {
        let mut best = 0;
        for i in 1..applicable.len() {
            if self.better_member(&applicable[i], &applicable[best], args, scope) == Betterness::Left {
                best = i;
            }
        }
        applicable
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != best)
            .all(|(_, other)| self.better_member(&applicable[best], other, args, scope) == Betterness::Left)
            .then_some(best)
    }

    fn better_member(&self, a: &Applicable, b: &Applicable, args: &[Argument], scope: &BindScope<'_>) -> Betterness {
        let mut a_better = false;
        let mut b_better = false;
        for (i, arg) in args.iter().enumerate() {
            let (ta, _) = a.params[i];
            let (tb, _) = b.params[i];
            match self.classifier.better_conversion_from_expression_in(
                &arg.expr,
                &a.conversions[i],
                ta,
                &b.conversions[i],
                tb,
                scope,
            ) {
                Betterness::Left => a_better = true,
                Betterness::Right => b_better = true,
                Betterness::Neither => {}
            }
        }
        match (a_better, b_better) {
            (true, false) => return Betterness::Left,
            (false, true) => return Betterness::Right,
            (true, true) => return Betterness::Neither,
            (false, false) => {}
        }
        // Tie-breaks apply only when the parameter lists are identical.
        let identical = a.params.len() == b.params.len()
            && a.params
                .iter()
                .zip(&b.params)
                .all(|(&(x, _), &(y, _))| self.classifier.is_identity_convertible(x, y));
        if !identical {
            return Betterness::Neither;
        }
        match (a.info.is_generic(), b.info.is_generic()) {
            (false, true) => return Betterness::Left,
            (true, false) => return Betterness::Right,
            _ => {}
        }
        match (a.expanded, b.expanded) {
            (false, true) => Betterness::Left,
            (true, false) => Betterness::Right,
            _ => Betterness::Neither,
        }
    }
}

#[cfg(test)]
#[path = "../tests/overload_tests.rs"]
mod tests;
