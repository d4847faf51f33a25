//! Best common type of a set of expressions.
//!
//! The candidates are the types of the typed expressions. A candidate wins
//! when every expression converts to it and it is unique (up to identity
//! conversion). When only lambdas and method groups are present and
//! inferred delegate types are available, their natural types must all be
//! the same type; near misses (different parameter types, ref-kinds or tuple
//! names) are failures, never silently unified.

use coerce_common::CancellationToken;
use coerce_common::cancel::CancellationPoller;
use coerce_common::diagnostics::{DiagnosticMessage, diagnostic_messages};
use coerce_common::gates;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::fmt;
use tracing::debug;

use crate::conversion::{BindScope, ConversionClassifier};
use crate::diagnostics::UseSiteDiagnostics;
use crate::expr::{Expr, ExprId};
use crate::query_trace;
use crate::types::TypeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BestTypeFailure {
    /// No unique type every expression converts to. `candidates` lists the
    /// types considered.
    NoBestType { candidates: Vec<TypeId> },
    Cancelled,
}

impl BestTypeFailure {
    pub fn diagnostic(&self) -> DiagnosticMessage {
        match self {
            Self::NoBestType { .. } => diagnostic_messages::NO_BEST_TYPE_FOR_IMPLICIT_ARRAY,
            Self::Cancelled => diagnostic_messages::OPERATION_CANCELLED,
        }
    }
}

impl fmt::Display for BestTypeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBestType { candidates } => {
                write!(f, "no best type among {} candidates", candidates.len())
            }
            Self::Cancelled => f.write_str("best common type inference was cancelled"),
        }
    }
}

impl std::error::Error for BestTypeFailure {}

type TypeSet = IndexSet<TypeId, FxBuildHasher>;

impl<'a> ConversionClassifier<'a> {
    pub fn best_common_type(
        &self,
        exprs: &[Expr],
        cancel: &CancellationToken,
    ) -> Result<TypeId, BestTypeFailure> {
        let traced = query_trace::enabled().then(|| {
            let qid = query_trace::next_query_id();
            let first = exprs.first().map_or(ExprId(0), |e| e.id);
            query_trace::expr_start(qid, "best_common_type", first, self.version.as_str());
            qid
        });
        let refs: SmallVec<[&Expr; 8]> = exprs.iter().collect();
        let mut poller =
            CancellationPoller::new(cancel, self.comp.options().cancellation_check_interval);
        let result = self.best_common_type_in(&refs, &BindScope::EMPTY, Some(&mut poller));
        if let Some(qid) = traced {
            query_trace::type_end(qid, "best_common_type", result.as_ref().ok().copied(), false);
        }
        result
    }

    pub(crate) fn best_common_type_in(
        &self,
        exprs: &[&Expr],
        scope: &BindScope<'_>,
        mut poller: Option<&mut CancellationPoller<'_>>,
    ) -> Result<TypeId, BestTypeFailure> {
        let candidates: TypeSet = exprs
            .iter()
            .filter(|e| !e.is_function())
            .filter_map(|e| self.natural_type_in(e, scope))
            .filter(|ty| !ty.is_error())
            .collect();
        if candidates.is_empty() {
            return self.best_function_type(exprs, scope, poller);
        }

        let mut scratch = UseSiteDiagnostics::new();
        let mut winners: SmallVec<[TypeId; 2]> = SmallVec::new();
        for &candidate in &candidates {
            let mut all_convert = true;
            for expr in exprs {
                if poller.as_mut().is_some_and(|p| p.tick()) {
                    return Err(BestTypeFailure::Cancelled);
                }
                if !self
                    .classify_implicit_in(expr, candidate, scope, &mut scratch)
                    .exists()
                {
                    all_convert = false;
                    break;
                }
            }
            if all_convert {
                winners.push(candidate);
            }
        }

        match winners.as_slice() {
            [best] => Ok(*best),
            [first, rest @ ..]
                if rest.iter().all(|&other| self.is_identity_convertible(*first, other)) =>
            {
                Ok(*first)
            }
            _ => {
                debug!(
                    candidates = candidates.len(),
                    winners = winners.len(),
                    "no best common type"
                );
                Err(BestTypeFailure::NoBestType {
                    candidates: candidates.into_iter().collect(),
                })
            }
        }
    }

    /// Every expression is a lambda or method group: their natural types
    /// must coincide.
    fn best_function_type(
        &self,
        exprs: &[&Expr],
        scope: &BindScope<'_>,
        mut poller: Option<&mut CancellationPoller<'_>>,
    ) -> Result<TypeId, BestTypeFailure> {
        let mut inferred = TypeSet::default();
        if !gates::inferred_delegate_types(self.version) {
            return Err(BestTypeFailure::NoBestType { candidates: Vec::new() });
        }
        for expr in exprs {
            if poller.as_mut().is_some_and(|p| p.tick()) {
                return Err(BestTypeFailure::Cancelled);
            }
            if !expr.is_function() {
                return Err(BestTypeFailure::NoBestType {
                    candidates: inferred.into_iter().collect(),
                });
            }
            match self.infer_delegate_type_in(expr, scope) {
                Ok(function) => {
                    inferred.insert(function.ty);
                }
                Err(err) => {
                    debug!(expr = expr.id.0, %err, "function type unavailable for best common type");
                    return Err(BestTypeFailure::NoBestType {
                        candidates: inferred.into_iter().collect(),
                    });
                }
            }
        }
        match inferred.len() {
            1 => Ok(inferred[0]),
            _ => Err(BestTypeFailure::NoBestType {
                candidates: inferred.into_iter().collect(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/best_common_type_tests.rs"]
mod tests;
