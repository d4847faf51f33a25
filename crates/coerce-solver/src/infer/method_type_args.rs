//! Method type argument inference.
//!
//! Each method type parameter gets an inference variable in an `ena`
//! unification table; fixing a variable records its type as the variable's
//! value. Inference runs in two phases:
//!
//! 1. Every argument with a type contributes bounds: exact bounds from `ref`
//!    and `out` positions, lower bounds from by-value positions. Lambdas and
//!    method groups aimed at delegate-typed parameters are set aside, except
//!    that explicit lambda parameter types give exact bounds right away.
//! 2. Rounds alternate output inference (set-aside functions whose input
//!    types are now fixed contribute their return types) with fixing
//!    variables that no pending function still produces.
//!
//! A lambda or method group passed to a bare type parameter contributes its
//! natural delegate type as an exact bound where the language version allows
//! it, so two functions with differing signatures never agree on one type
//! argument.

use coerce_common::CancellationToken;
use coerce_common::cancel::CancellationPoller;
use coerce_common::diagnostics::{DiagnosticMessage, diagnostic_messages};
use coerce_common::gates;
use coerce_common::interner::Atom;
use coerce_common::limits::MAX_CONVERSION_DEPTH;
use ena::unify::{InPlaceUnificationTable, NoError, UnifyKey, UnifyValue};
use fixedbitset::FixedBitSet;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::fmt;
use tracing::{debug, trace};

use crate::compilation::Compilation;
use crate::conversion::{BindScope, ConversionClassifier};
use crate::def::DefId;
use crate::delegate::infer::{GroupCandidate, method_group_scopes};
use crate::delegate::signature::{DelegateSignature, SignatureParam, delegate_signature, method_signature};
use crate::expr::{Argument, Expr, ExprKind, LambdaExpr, MethodGroupExpr};
use crate::inheritance;
use crate::instantiate::{TypeSubstitution, instantiate_type, mentions_any};
use crate::method::{MethodId, MethodInfo};
use crate::query_trace;
use crate::type_queries;
use crate::types::{RefKind, TypeArgs, TypeData, TypeId, TypeParamId, Variance};

// =============================================================================
// Unification keys
// =============================================================================

/// An inference variable standing for one method type parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InferenceVar(pub u32);

/// Wrapper for the fixed type of a variable (orphan rule).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InferenceValue(pub Option<TypeId>);

impl UnifyKey for InferenceVar {
    type Value = InferenceValue;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        InferenceVar(u)
    }

    fn tag() -> &'static str {
        "InferenceVar"
    }
}

impl UnifyValue for InferenceValue {
    type Error = NoError;

    fn unify_values(a: &Self, b: &Self) -> Result<Self, Self::Error> {
        match (a.0, b.0) {
            (None, None) => Ok(InferenceValue(None)),
            (Some(t), None) | (None, Some(t)) => Ok(InferenceValue(Some(t))),
            // A variable is fixed once; keep the first value.
            (Some(a), Some(_)) => Ok(InferenceValue(Some(a))),
        }
    }
}

// =============================================================================
// Arguments and errors
// =============================================================================

/// One argument as inference sees it: an expression, or a bare type (a
/// receiver, or a delegate parameter type a method group is matched
/// against).
#[derive(Copy, Clone, Debug)]
pub enum InferenceArg<'e> {
    Expr { expr: &'e Expr, ref_kind: RefKind },
    Type { ty: TypeId, ref_kind: RefKind },
}

impl<'e> InferenceArg<'e> {
    pub fn from_argument(arg: &'e Argument) -> Self {
        Self::Expr {
            expr: &arg.expr,
            ref_kind: arg.ref_kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceError {
    UnknownMethod(MethodId),
    ArgumentCountMismatch { expected: usize, actual: usize },
    /// Some type parameters received no usable bounds.
    CannotInfer {
        method: MethodId,
        unfixed: Vec<TypeParamId>,
    },
    /// The bounds of `param` admit no single type.
    NoUniqueCandidate {
        param: TypeParamId,
        candidates: Vec<TypeId>,
    },
    Cancelled,
    RoundLimit,
}

impl InferenceError {
    pub fn diagnostic(&self) -> DiagnosticMessage {
        match self {
            Self::Cancelled => diagnostic_messages::OPERATION_CANCELLED,
            _ => diagnostic_messages::TYPE_ARGUMENTS_CANNOT_BE_INFERRED,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Self::UnknownMethod(_) => "unknown_method",
            Self::ArgumentCountMismatch { .. } => "argument_count_mismatch",
            Self::CannotInfer { .. } => "cannot_infer",
            Self::NoUniqueCandidate { .. } => "no_unique_candidate",
            Self::Cancelled => "cancelled",
            Self::RoundLimit => "round_limit",
        }
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMethod(method) => write!(f, "method {} is not declared", method.0),
            Self::ArgumentCountMismatch { expected, actual } => {
                write!(f, "expected {expected} arguments, found {actual}")
            }
            Self::CannotInfer { method, unfixed } => write!(
                f,
                "type arguments of method {} cannot be inferred ({} unfixed)",
                method.0,
                unfixed.len()
            ),
            Self::NoUniqueCandidate { param, candidates } => write!(
                f,
                "no unique type for type parameter {} among {} candidates",
                param.0,
                candidates.len()
            ),
            Self::Cancelled => f.write_str("type argument inference was cancelled"),
            Self::RoundLimit => f.write_str("type argument inference did not converge"),
        }
    }
}

impl std::error::Error for InferenceError {}

pub(crate) type ParamList = SmallVec<[(TypeId, RefKind); 4]>;

/// The parameter lists `method` can be matched against with `arg_count`
/// arguments: the declared list when the counts agree, then the expanded
/// form of a trailing `params T[]`.
pub(crate) fn param_forms(comp: &Compilation, method: &MethodInfo, arg_count: usize) -> SmallVec<[ParamList; 2]> {
    let mut forms = SmallVec::new();
    let normal: ParamList = method.params.iter().map(|p| (p.ty, p.ref_kind)).collect();
    if normal.len() == arg_count {
        forms.push(normal.clone());
    }
    let Some(last) = method.params.last().filter(|p| p.is_params) else {
        return forms;
    };
    let Some((element, 1)) = type_queries::array_info(comp, last.ty) else {
        return forms;
    };
    if arg_count + 1 >= normal.len() {
        let mut expanded: ParamList = normal[..normal.len() - 1].iter().copied().collect();
        expanded.extend(std::iter::repeat_n((element, RefKind::None), arg_count + 1 - normal.len()));
        forms.push(expanded);
    }
    forms
}

// =============================================================================
// Entry points
// =============================================================================

impl<'a> ConversionClassifier<'a> {
    /// Infer the type arguments of generic `method` called with `args`.
    pub fn infer_method_type_args(
        &self,
        method: MethodId,
        args: &[Argument],
        cancel: &CancellationToken,
    ) -> Result<TypeArgs, InferenceError> {
        let traced = query_trace::enabled().then(|| {
            let qid = query_trace::next_query_id();
            query_trace::method_start(
                qid,
                "infer_method_type_args",
                method,
                args.len(),
                self.version.as_str(),
            );
            qid
        });
        let mut poller =
            CancellationPoller::new(cancel, self.comp.options().cancellation_check_interval);
        let result = self.infer_method_type_args_in(method, args, &BindScope::EMPTY, Some(&mut poller));
        if let Some(qid) = traced {
            let outcome = result.as_ref().map_or_else(InferenceError::outcome, |_| "inferred");
            query_trace::relation_end(qid, "infer_method_type_args", outcome, result.is_ok());
        }
        result
    }

    pub(crate) fn infer_method_type_args_in(
        &self,
        id: MethodId,
        args: &[Argument],
        scope: &BindScope<'_>,
        mut poller: Option<&mut CancellationPoller<'_>>,
    ) -> Result<TypeArgs, InferenceError> {
        let method = self
            .comp
            .methods()
            .get(id)
            .ok_or(InferenceError::UnknownMethod(id))?;
        let inference_args: SmallVec<[InferenceArg<'_>; 4]> =
            args.iter().map(InferenceArg::from_argument).collect();
        let mut last = InferenceError::ArgumentCountMismatch {
            expected: method.params.len(),
            actual: args.len(),
        };
        for params in param_forms(self.comp, &method, args.len()) {
            match self.infer_type_args_core(
                id,
                &method,
                &params,
                &inference_args,
                scope,
                poller.as_deref_mut(),
            ) {
                Ok(type_args) => return Ok(type_args),
                Err(InferenceError::Cancelled) => return Err(InferenceError::Cancelled),
                Err(err) => last = err,
            }
        }
        Err(last)
    }

    /// Infer against an explicit parameter list (already expanded, or a
    /// subset such as an extension receiver alone).
    pub(crate) fn infer_type_args_core(
        &self,
        id: MethodId,
        method: &MethodInfo,
        params: &[(TypeId, RefKind)],
        args: &[InferenceArg<'_>],
        scope: &BindScope<'_>,
        poller: Option<&mut CancellationPoller<'_>>,
    ) -> Result<TypeArgs, InferenceError> {
        if !method.is_generic() {
            return Ok(TypeArgs::new());
        }
        if params.len() != args.len() {
            return Err(InferenceError::ArgumentCountMismatch {
                expected: params.len(),
                actual: args.len(),
            });
        }
        TypeArgInference::new(*self, id, &method.type_params, scope).run(params, args, poller)
    }
}

// =============================================================================
// Engine
// =============================================================================

type TypeSet = IndexSet<TypeId, FxBuildHasher>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BoundKind {
    Exact,
    Lower,
    Upper,
}

#[derive(Default)]
struct Bounds {
    exact: TypeSet,
    lower: TypeSet,
    upper: TypeSet,
    /// Natural function types bound directly to the variable. These must
    /// agree by `TypeId`, tuple element names included.
    functions: TypeSet,
}

impl Bounds {
    fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.lower.is_empty() && self.upper.is_empty()
    }
}

/// A lambda or method group waiting for the input types of `delegate`.
struct PendingArg<'e> {
    expr: &'e Expr,
    delegate: TypeId,
}

struct TypeArgInference<'c, 'e> {
    classifier: ConversionClassifier<'c>,
    method: MethodId,
    type_params: &'e [TypeParamId],
    scope: &'e BindScope<'e>,
    table: InPlaceUnificationTable<InferenceVar>,
    vars: SmallVec<[InferenceVar; 4]>,
    bounds: Vec<Bounds>,
    fixed: FixedBitSet,
    pending: Vec<PendingArg<'e>>,
}

impl<'c, 'e> TypeArgInference<'c, 'e> {
    fn new(
        classifier: ConversionClassifier<'c>,
        method: MethodId,
        type_params: &'e [TypeParamId],
        scope: &'e BindScope<'e>,
    ) -> Self {
        let mut table = InPlaceUnificationTable::new();
        let vars = type_params
            .iter()
            .map(|_| table.new_key(InferenceValue(None)))
            .collect();
        Self {
            classifier,
            method,
            type_params,
            scope,
            table,
            vars,
            bounds: type_params.iter().map(|_| Bounds::default()).collect(),
            fixed: FixedBitSet::with_capacity(type_params.len()),
            pending: Vec::new(),
        }
    }

    #[inline]
    fn comp(&self) -> &'c Compilation {
        self.classifier.comp
    }

    fn run(
        mut self,
        params: &[(TypeId, RefKind)],
        args: &[InferenceArg<'e>],
        mut poller: Option<&mut CancellationPoller<'_>>,
    ) -> Result<TypeArgs, InferenceError> {
        for (&(param, ref_kind), &arg) in params.iter().zip(args) {
            if poller.as_mut().is_some_and(|p| p.tick()) {
                return Err(InferenceError::Cancelled);
            }
            match arg {
                InferenceArg::Type { ty, .. } => self.infer_from_type(ty, param, ref_kind),
                InferenceArg::Expr { expr, .. } => self.infer_from_expr(expr, param, ref_kind, 0),
            }
        }

        let max_rounds = self.comp().options().max_inference_rounds;
        let mut rounds = 0;
        while self.fixed.count_ones(..) < self.vars.len() {
            if rounds >= max_rounds {
                debug!(method = self.method.0, rounds, "type inference round limit");
                return Err(InferenceError::RoundLimit);
            }
            rounds += 1;
            if poller.as_mut().is_some_and(|p| p.tick()) {
                return Err(InferenceError::Cancelled);
            }

            let mut progressed = false;
            for arg in std::mem::take(&mut self.pending) {
                if self.inputs_fixed(&arg) {
                    self.output_inference(&arg);
                    progressed = true;
                } else {
                    self.pending.push(arg);
                }
            }

            let blocked = self.blocked_vars();
            let mut ready: SmallVec<[usize; 4]> = (0..self.vars.len())
                .filter(|&i| !self.fixed.contains(i) && !blocked.contains(i) && !self.bounds[i].is_empty())
                .collect();
            if ready.is_empty() && !progressed {
                // Every candidate waits on a pending function: break the
                // cycle with the first variable that has bounds.
                ready = (0..self.vars.len())
                    .filter(|&i| !self.fixed.contains(i) && !self.bounds[i].is_empty())
                    .take(1)
                    .collect();
            }
            for i in ready {
                self.fix(i)?;
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        let unfixed = self.unfixed_params();
        if !unfixed.is_empty() {
            debug!(method = self.method.0, unfixed = unfixed.len(), "type arguments not inferred");
            return Err(InferenceError::CannotInfer {
                method: self.method,
                unfixed: unfixed.into_vec(),
            });
        }
        let vars = self.vars.clone();
        Ok(vars
            .into_iter()
            .map(|var| self.table.probe_value(var).0.unwrap_or(TypeId::ERROR))
            .collect())
    }

    // -------------------------------------------------------------------------
    // Variables
    // -------------------------------------------------------------------------

    fn var_of(&self, ty: TypeId) -> Option<usize> {
        match self.comp().types().lookup(ty)? {
            TypeData::TypeParameter(id) => self.type_params.iter().position(|&p| p == id),
            _ => None,
        }
    }

    fn mentions_vars(&self, ty: TypeId) -> bool {
        mentions_any(self.comp().types(), ty, self.type_params)
    }

    fn unfixed_params(&self) -> SmallVec<[TypeParamId; 4]> {
        self.type_params
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.fixed.contains(*i))
            .map(|(_, &p)| p)
            .collect()
    }

    fn add_bound(&mut self, i: usize, kind: BoundKind, ty: TypeId) {
        if self.fixed.contains(i) || ty.is_error() {
            return;
        }
        let bounds = &mut self.bounds[i];
        let set = match kind {
            BoundKind::Exact => &mut bounds.exact,
            BoundKind::Lower => &mut bounds.lower,
            BoundKind::Upper => &mut bounds.upper,
        };
        if set.insert(ty) {
            trace!(param = self.type_params[i].0, ?kind, ty = ty.0, "inference bound");
        }
    }

    fn add_function_bound(&mut self, param: TypeId, ty: TypeId) {
        if let Some(i) = self.var_of(param)
            && !self.fixed.contains(i)
            && !ty.is_error()
        {
            self.bounds[i].functions.insert(ty);
        }
    }

    fn current_substitution(&mut self) -> TypeSubstitution {
        let mut subst = TypeSubstitution::new();
        for (i, &param) in self.type_params.iter().enumerate() {
            if self.fixed.contains(i)
                && let Some(ty) = self.table.probe_value(self.vars[i]).0
            {
                subst.insert(param, ty);
            }
        }
        subst
    }

    // -------------------------------------------------------------------------
    // Phase one
    // -------------------------------------------------------------------------

    fn infer_from_type(&mut self, ty: TypeId, param: TypeId, ref_kind: RefKind) {
        if ref_kind.is_by_ref() {
            self.exact_inference(ty, param, 0);
        } else {
            self.lower_bound_inference(ty, param, 0);
        }
    }

    fn infer_from_expr(&mut self, expr: &'e Expr, param: TypeId, ref_kind: RefKind, depth: u32) {
        if expr.is_function() {
            self.infer_from_function(expr, param);
            return;
        }
        if let Some(ty) = self.classifier.natural_type_in(expr, self.scope) {
            self.infer_from_type(ty, param, ref_kind);
            return;
        }
        // `(1, null)` has no natural type but its elements still inform a
        // tuple-typed parameter.
        if let ExprKind::TupleLiteral(elements) = &expr.kind
            && depth < MAX_CONVERSION_DEPTH
            && let Some(targets) = type_queries::tuple_elements(self.comp(), param)
            && targets.len() == elements.len()
        {
            for (element, target) in elements.iter().zip(&targets) {
                self.infer_from_expr(&element.expr, target.ty, RefKind::None, depth + 1);
            }
        }
    }

    fn infer_from_function(&mut self, expr: &'e Expr, param: TypeId) {
        if self.var_of(param).is_some() {
            if self.natural_function_types()
                && let Ok(inferred) = self.classifier.infer_delegate_type_in(expr, self.scope)
            {
                self.add_function_bound(param, inferred.ty);
                self.exact_inference(inferred.ty, param, 0);
            }
            return;
        }
        let comp = self.comp();
        let delegate = type_queries::expression_tree_delegate(comp, param).unwrap_or(param);
        let Some(signature) = delegate_signature(comp, delegate) else {
            return;
        };
        if let Some(lambda) = expr.as_lambda()
            && lambda.params.len() == signature.params.len()
        {
            for (lambda_param, expected) in lambda.params.iter().zip(&signature.params) {
                if let Some(ty) = lambda_param.ty {
                    self.exact_inference(ty, expected.ty, 0);
                }
            }
        }
        self.pending.push(PendingArg { expr, delegate });
    }

    fn natural_function_types(&self) -> bool {
        gates::natural_function_type_in_generic_inference(self.classifier.version)
    }

    // -------------------------------------------------------------------------
    // Phase two
    // -------------------------------------------------------------------------

    /// Explicitly typed lambdas have no input types; other functions wait
    /// until every delegate parameter type is fixed.
    fn inputs_fixed(&self, arg: &PendingArg<'e>) -> bool {
        if arg
            .expr
            .as_lambda()
            .is_some_and(|lambda| !lambda.has_implicit_params())
        {
            return true;
        }
        let Some(signature) = delegate_signature(self.comp(), arg.delegate) else {
            return true;
        };
        let unfixed = self.unfixed_params();
        signature
            .params
            .iter()
            .all(|p| !mentions_any(self.comp().types(), p.ty, &unfixed))
    }

    /// Variables occurring in the return type of a function still pending.
    fn blocked_vars(&self) -> FixedBitSet {
        let mut blocked = FixedBitSet::with_capacity(self.vars.len());
        let types = self.comp().types();
        for arg in &self.pending {
            let Some(signature) = delegate_signature(self.comp(), arg.delegate) else {
                continue;
            };
            for (i, param) in self.type_params.iter().enumerate() {
                if mentions_any(types, signature.return_type, std::slice::from_ref(param)) {
                    blocked.insert(i);
                }
            }
        }
        blocked
    }

    fn output_inference(&mut self, arg: &PendingArg<'e>) {
        let comp = self.comp();
        let Some(signature) = delegate_signature(comp, arg.delegate) else {
            return;
        };
        if signature.returns_void() {
            return;
        }
        let subst = self.current_substitution();
        let target = DelegateSignature::new(
            signature.params.iter().map(|p| SignatureParam {
                ty: instantiate_type(comp.types(), p.ty, &subst),
                ..*p
            }),
            signature.return_type,
            signature.return_ref,
        );
        let inferred = match &arg.expr.kind {
            ExprKind::Lambda(lambda) => self.lambda_return(lambda, &target),
            ExprKind::MethodGroup(group) => self.method_group_return(group, &target),
            _ => None,
        };
        let Some(inferred) = inferred.filter(|&ty| ty != TypeId::VOID) else {
            return;
        };
        trace!(expr = arg.expr.id.0, ty = inferred.0, "output type inference");
        if signature.return_ref.is_by_ref() {
            self.exact_inference(inferred, signature.return_type, 0);
        } else {
            self.lower_bound_inference(inferred, signature.return_type, 0);
        }
    }

    fn lambda_return(&self, lambda: &LambdaExpr, target: &DelegateSignature) -> Option<TypeId> {
        if let Some(explicit) = lambda.return_type
            && gates::lambda_explicit_return_type(self.classifier.version)
        {
            return Some(explicit);
        }
        if lambda.params.len() != target.params.len() {
            return None;
        }
        let bound: SmallVec<[(Atom, TypeId); 4]> = lambda
            .params
            .iter()
            .zip(&target.params)
            .map(|(p, expected)| (p.name, p.ty.unwrap_or(expected.ty)))
            .collect();
        let inner = self.scope.nested(&bound);
        self.classifier.infer_lambda_return(lambda, &inner)
    }

    /// Return type of the method a group binds to for the (fixed) parameter
    /// types of `target`: unique within the nearest scope that has any
    /// compatible candidate.
    fn method_group_return(&self, group: &MethodGroupExpr, target: &DelegateSignature) -> Option<TypeId> {
        let comp = self.comp();
        for (methods, is_extension) in method_group_scopes(group) {
            let mut returns = TypeSet::default();
            for &id in methods {
                let Some(method) = comp.methods().get(id) else {
                    continue;
                };
                let GroupCandidate::Closed(subst) =
                    self.classifier
                        .method_group_candidate(group, id, &method, is_extension, Some(target))
                else {
                    continue;
                };
                let candidate = method_signature(comp, &method, &subst, is_extension);
                let probe = DelegateSignature {
                    params: target.params.clone(),
                    return_type: candidate.return_type,
                    return_ref: candidate.return_ref,
                };
                if self
                    .classifier
                    .method_signature_compatibility(&candidate, &probe)
                    .is_some()
                {
                    returns.insert(candidate.return_type);
                }
            }
            match returns.len() {
                0 => continue,
                1 => return returns.first().copied(),
                _ => return None,
            }
        }
        None
    }

    // -------------------------------------------------------------------------
    // Fixing
    // -------------------------------------------------------------------------

    fn converts(&self, from: TypeId, to: TypeId) -> bool {
        self.classifier.is_identity_convertible(from, to)
            || self.classifier.classify_standard_implicit(from, to).exists()
    }

    fn satisfies(&self, candidate: TypeId, bounds: &Bounds) -> bool {
        bounds
            .exact
            .iter()
            .all(|&e| self.classifier.is_identity_convertible(candidate, e))
            && bounds.lower.iter().all(|&l| self.converts(l, candidate))
            && bounds.upper.iter().all(|&u| self.converts(candidate, u))
    }

    /// Fix variable `i` to the unique candidate bound satisfying every
    /// bound, preferring the one every other survivor converts to.
    fn fix(&mut self, i: usize) -> Result<(), InferenceError> {
        let bounds = &self.bounds[i];
        if bounds.functions.len() > 1 {
            debug!(
                param = self.type_params[i].0,
                functions = bounds.functions.len(),
                "function types disagree"
            );
            return Err(InferenceError::NoUniqueCandidate {
                param: self.type_params[i],
                candidates: bounds.functions.iter().copied().collect(),
            });
        }
        let candidates: TypeSet = bounds
            .exact
            .iter()
            .chain(&bounds.lower)
            .chain(&bounds.upper)
            .copied()
            .collect();
        let survivors: SmallVec<[TypeId; 4]> = candidates
            .iter()
            .copied()
            .filter(|&c| self.satisfies(c, bounds))
            .collect();
        let mut general = survivors
            .iter()
            .copied()
            .filter(|&c| survivors.iter().all(|&other| self.converts(other, c)));
        let chosen = match (general.next(), general.next()) {
            (Some(ty), None) => ty,
            (Some(ty), Some(other)) if self.classifier.is_identity_convertible(ty, other) => ty,
            _ => {
                debug!(
                    param = self.type_params[i].0,
                    candidates = candidates.len(),
                    survivors = survivors.len(),
                    "no unique type argument"
                );
                return Err(InferenceError::NoUniqueCandidate {
                    param: self.type_params[i],
                    candidates: candidates.into_iter().collect(),
                });
            }
        };
        self.table.union_value(self.vars[i], InferenceValue(Some(chosen)));
        self.fixed.insert(i);
        trace!(param = self.type_params[i].0, ty = chosen.0, "fixed type argument");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Bound inference
    // -------------------------------------------------------------------------

    fn exact_inference(&mut self, source: TypeId, param: TypeId, depth: u32) {
        if depth >= MAX_CONVERSION_DEPTH || source.is_error() {
            return;
        }
        if let Some(i) = self.var_of(param) {
            self.add_bound(i, BoundKind::Exact, source);
            return;
        }
        if !self.mentions_vars(param) {
            return;
        }
        let types = self.comp().types();
        match (types.lookup(source), types.lookup(param)) {
            (
                Some(TypeData::Array { element: s, rank: sr }),
                Some(TypeData::Array { element: p, rank: pr }),
            ) if sr == pr => self.exact_inference(s, p, depth + 1),
            (Some(TypeData::Nullable(s)), Some(TypeData::Nullable(p))) => {
                self.exact_inference(s, p, depth + 1);
            }
            (Some(TypeData::Tuple(s)), Some(TypeData::Tuple(p))) if s.len() == p.len() => {
                for (s, p) in s.iter().zip(&p) {
                    self.exact_inference(s.ty, p.ty, depth + 1);
                }
            }
            (Some(TypeData::Named { def: sd, args: sa }), Some(TypeData::Named { def: pd, args: pa }))
                if sd == pd && sa.len() == pa.len() =>
            {
                for (&s, &p) in sa.iter().zip(&pa) {
                    self.exact_inference(s, p, depth + 1);
                }
            }
            (
                Some(TypeData::Synthesized { delegate: sd, args: sa }),
                Some(TypeData::Synthesized { delegate: pd, args: pa }),
            ) if sd == pd && sa.len() == pa.len() => {
                for (&s, &p) in sa.iter().zip(&pa) {
                    self.exact_inference(s, p, depth + 1);
                }
            }
            _ => {}
        }
    }

    /// `source` converts to `param`.
    fn lower_bound_inference(&mut self, source: TypeId, param: TypeId, depth: u32) {
        if depth >= MAX_CONVERSION_DEPTH || source.is_error() {
            return;
        }
        if let Some(i) = self.var_of(param) {
            self.add_bound(i, BoundKind::Lower, source);
            return;
        }
        if !self.mentions_vars(param) {
            return;
        }
        let comp = self.comp();
        let types = comp.types();
        match (types.lookup(source), types.lookup(param)) {
            (
                Some(TypeData::Array { element: s, rank: sr }),
                Some(TypeData::Array { element: p, rank: pr }),
            ) if sr == pr => self.element_inference(s, p, BoundKind::Lower, depth + 1),
            (Some(TypeData::Array { element: s, rank: 1 }), Some(TypeData::Named { def, args }))
                if args.len() == 1 && comp.well_known().array_interfaces().contains(&def) =>
            {
                self.element_inference(s, args[0], BoundKind::Lower, depth + 1);
            }
            (Some(TypeData::Nullable(s)), Some(TypeData::Nullable(p))) => {
                self.lower_bound_inference(s, p, depth + 1);
            }
            (_, Some(TypeData::Nullable(p))) => self.lower_bound_inference(source, p, depth + 1),
            (Some(TypeData::Tuple(s)), Some(TypeData::Tuple(p))) if s.len() == p.len() => {
                for (s, p) in s.iter().zip(&p) {
                    self.lower_bound_inference(s.ty, p.ty, depth + 1);
                }
            }
            (
                Some(TypeData::Synthesized { delegate: sd, args: sa }),
                Some(TypeData::Synthesized { delegate: pd, args: pa }),
            ) if sd == pd && sa.len() == pa.len() => {
                for (&s, &p) in sa.iter().zip(&pa) {
                    self.exact_inference(s, p, depth + 1);
                }
            }
            (_, Some(TypeData::Named { def, args })) => {
                // The unique supertype of the argument built from the same
                // generic definition.
                let Some(matching) = self.unique_with_def(source, def) else {
                    return;
                };
                if let Some(TypeData::Named { args: source_args, .. }) = types.lookup(matching) {
                    self.variant_args(&source_args, &args, def, BoundKind::Lower, depth + 1);
                }
            }
            _ => {}
        }
    }

    /// `param` converts to `target`.
    fn upper_bound_inference(&mut self, target: TypeId, param: TypeId, depth: u32) {
        if depth >= MAX_CONVERSION_DEPTH || target.is_error() {
            return;
        }
        if let Some(i) = self.var_of(param) {
            self.add_bound(i, BoundKind::Upper, target);
            return;
        }
        if !self.mentions_vars(param) {
            return;
        }
        let comp = self.comp();
        let types = comp.types();
        match (types.lookup(target), types.lookup(param)) {
            (
                Some(TypeData::Array { element: t, rank: tr }),
                Some(TypeData::Array { element: p, rank: pr }),
            ) if tr == pr => self.element_inference(t, p, BoundKind::Upper, depth + 1),
            (Some(TypeData::Named { def, args }), Some(TypeData::Array { element: p, rank: 1 }))
                if args.len() == 1 && comp.well_known().array_interfaces().contains(&def) =>
            {
                self.element_inference(args[0], p, BoundKind::Upper, depth + 1);
            }
            (Some(TypeData::Nullable(t)), Some(TypeData::Nullable(p))) => {
                self.upper_bound_inference(t, p, depth + 1);
            }
            (Some(TypeData::Tuple(t)), Some(TypeData::Tuple(p))) if t.len() == p.len() => {
                for (t, p) in t.iter().zip(&p) {
                    self.upper_bound_inference(t.ty, p.ty, depth + 1);
                }
            }
            (
                Some(TypeData::Synthesized { delegate: td, args: ta }),
                Some(TypeData::Synthesized { delegate: pd, args: pa }),
            ) if td == pd && ta.len() == pa.len() => {
                for (&t, &p) in ta.iter().zip(&pa) {
                    self.exact_inference(t, p, depth + 1);
                }
            }
            (Some(TypeData::Named { def, args }), _) => {
                let Some(matching) = self.unique_with_def(param, def) else {
                    return;
                };
                if let Some(TypeData::Named { args: param_args, .. }) = types.lookup(matching) {
                    self.variant_args(&args, &param_args, def, BoundKind::Upper, depth + 1);
                }
            }
            _ => {}
        }
    }

    /// Array element bounds keep their direction only for reference
    /// elements; value-type elements must match exactly.
    fn element_inference(&mut self, source: TypeId, param: TypeId, kind: BoundKind, depth: u32) {
        match kind {
            BoundKind::Lower if type_queries::is_reference_type(self.comp(), source) => {
                self.lower_bound_inference(source, param, depth);
            }
            BoundKind::Upper if type_queries::is_reference_type(self.comp(), source) => {
                self.upper_bound_inference(source, param, depth);
            }
            _ => self.exact_inference(source, param, depth),
        }
    }

    /// `ty` itself or the one supertype of `ty` constructed from `def`.
    fn unique_with_def(&self, ty: TypeId, def: DefId) -> Option<TypeId> {
        let comp = self.comp();
        let matching: TypeSet = std::iter::once(ty)
            .chain(inheritance::supertypes(comp, ty))
            .filter(|&t| matches!(comp.types().lookup(t), Some(TypeData::Named { def: d, .. }) if d == def))
            .collect();
        (matching.len() == 1).then(|| matching[0])
    }

    /// Type arguments of two constructions of `def`, `concrete` on the
    /// argument side and `open` on the parameter side, bounded according to
    /// the declared variance of each type parameter.
    fn variant_args(&mut self, concrete: &[TypeId], open: &[TypeId], def: DefId, kind: BoundKind, depth: u32) {
        let comp = self.comp();
        let Some(info) = comp.defs().get(def) else {
            return;
        };
        for (i, (&c, &o)) in concrete.iter().zip(open).enumerate() {
            let variance = info
                .type_params
                .get(i)
                .and_then(|&p| comp.types().type_param_info(p))
                .map_or(Variance::Invariant, |p| p.variance);
            let reference = type_queries::is_reference_type(comp, c);
            match (variance, kind, reference) {
                (Variance::Out, BoundKind::Lower, true) | (Variance::In, BoundKind::Upper, true) => {
                    self.lower_bound_inference(c, o, depth);
                }
                (Variance::In, BoundKind::Lower, true) | (Variance::Out, BoundKind::Upper, true) => {
                    self.upper_bound_inference(c, o, depth);
                }
                _ => self.exact_inference(c, o, depth),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/method_type_args_tests.rs"]
mod tests;
