//! User-defined conversion operator resolution.
//!
//! Operators are gathered from the source and target types and their base
//! classes (for type parameters, from their constraints). Applicable
//! operators are those whose parameter is reachable from the source, and
//! whose result reaches the target, by standard conversions. The unique
//! operator converting from the most specific source type to the most
//! specific target type wins.
//!
//! Resolution never fails; every outcome is a [`UserDefinedConversionResult`].

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use std::fmt;
use tracing::{debug, trace};

use super::{Conversion, ConversionClassifier, ConversionKind};
use crate::def::DefKind;
use crate::inheritance;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::method::{MethodId, MethodKind};
use crate::query_trace;
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::type_queries;
use crate::types::{TypeData, TypeId};

/// One applicable operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserDefinedConversionAnalysis {
    pub operator: MethodId,
    /// Conversion from the source to the operator's parameter type.
    pub source_conversion: Conversion,
    /// Conversion from the operator's result to the target.
    pub target_conversion: Conversion,
    /// The operator's parameter type (nullable for lifted forms).
    pub from_type: TypeId,
    /// The operator's result type (nullable for lifted forms).
    pub to_type: TypeId,
    pub lifted: bool,
    /// The type parameter through whose constraint the operator was found.
    pub constrained_to: Option<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserDefinedConversionResult {
    Valid {
        best: usize,
        candidates: Vec<UserDefinedConversionAnalysis>,
    },
    Ambiguous {
        candidates: Vec<UserDefinedConversionAnalysis>,
    },
    NoBestSourceType {
        candidates: Vec<UserDefinedConversionAnalysis>,
    },
    NoBestTargetType {
        candidates: Vec<UserDefinedConversionAnalysis>,
    },
    NoApplicableOperators {
        candidates: Vec<UserDefinedConversionAnalysis>,
    },
}

impl UserDefinedConversionResult {
    pub fn candidates(&self) -> &[UserDefinedConversionAnalysis] {
        match self {
            Self::Valid { candidates, .. }
            | Self::Ambiguous { candidates }
            | Self::NoBestSourceType { candidates }
            | Self::NoBestTargetType { candidates }
            | Self::NoApplicableOperators { candidates } => candidates,
        }
    }

    pub fn best(&self) -> Option<&UserDefinedConversionAnalysis> {
        match self {
            Self::Valid { best, candidates } => candidates.get(*best),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.best().is_some()
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Valid { .. } => "valid",
            Self::Ambiguous { .. } => "ambiguous",
            Self::NoBestSourceType { .. } => "no-best-source-type",
            Self::NoBestTargetType { .. } => "no-best-target-type",
            Self::NoApplicableOperators { .. } => "no-applicable-operators",
        }
    }
}

impl fmt::Display for UserDefinedConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.best() {
            Some(best) => write!(f, "valid (operator {})", best.operator.0),
            None => write!(
                f,
                "{} ({} candidates)",
                self.outcome(),
                self.candidates().len()
            ),
        }
    }
}

/// A type operators are declared on, and the type parameter it was reached
/// through.
#[derive(Copy, Clone)]
struct DeclaringType {
    ty: TypeId,
    constrained_to: Option<TypeId>,
}

struct OperatorCandidate {
    operator: MethodId,
    from: TypeId,
    to: TypeId,
    constrained_to: Option<TypeId>,
}

impl<'a> ConversionClassifier<'a> {
    /// Resolve a user-defined conversion from `source` to `target`.
    /// `implicit_only` restricts the search to implicit operators and
    /// standard implicit pre/post conversions.
    pub fn resolve_user_defined_conversion(
        &self,
        source: TypeId,
        target: TypeId,
        implicit_only: bool,
    ) -> UserDefinedConversionResult {
        let traced = query_trace::enabled().then(|| {
            let qid = query_trace::next_query_id();
            query_trace::relation_start(
                qid,
                "resolve_user_defined_conversion",
                Some(source),
                target,
                self.version.as_str(),
            );
            qid
        });
        let result = self.resolve_user_defined(source, target, implicit_only);
        if let Some(qid) = traced {
            query_trace::relation_end(
                qid,
                "resolve_user_defined_conversion",
                result.outcome(),
                result.is_valid(),
            );
        }
        result
    }

    /// The user-defined conversion, or `NoConversion` when no operator
    /// applies. Ambiguous outcomes still produce a (non-valid) user-defined
    /// conversion so callers can report the candidates.
    pub(crate) fn classify_user_defined(
        &self,
        source: TypeId,
        target: TypeId,
        implicit_only: bool,
    ) -> Conversion {
        let result = self.resolve_user_defined(source, target, implicit_only);
        if matches!(result, UserDefinedConversionResult::NoApplicableOperators { .. }) {
            return Conversion::NO_CONVERSION;
        }
        let kind = if implicit_only {
            ConversionKind::ImplicitUserDefined
        } else {
            ConversionKind::ExplicitUserDefined
        };
        Conversion::user_defined(kind, result)
    }

    fn resolve_user_defined(
        &self,
        source: TypeId,
        target: TypeId,
        implicit_only: bool,
    ) -> UserDefinedConversionResult {
        let operators = self.gather_operators(source, target, implicit_only);
        let applicable: Vec<UserDefinedConversionAnalysis> = operators
            .iter()
            .flat_map(|op| self.analyze_operator(op, source, target, implicit_only))
            .collect();
        if applicable.is_empty() {
            return UserDefinedConversionResult::NoApplicableOperators {
                candidates: applicable,
            };
        }

        let froms: Vec<TypeId> = applicable.iter().map(|c| c.from_type).collect();
        let tos: Vec<TypeId> = applicable.iter().map(|c| c.to_type).collect();
        let best_source = self.most_specific_source(source, &froms, implicit_only);
        let best_target = self.most_specific_target(target, &tos, implicit_only);

        let result = match (best_source, best_target) {
            (None, None) => UserDefinedConversionResult::Ambiguous {
                candidates: applicable,
            },
            (None, Some(_)) => UserDefinedConversionResult::NoBestSourceType {
                candidates: applicable,
            },
            (Some(_), None) => UserDefinedConversionResult::NoBestTargetType {
                candidates: applicable,
            },
            (Some(sx), Some(tx)) => {
                let matching: Vec<usize> = applicable
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.from_type == sx && c.to_type == tx)
                    .map(|(i, _)| i)
                    .collect();
                let unlifted: Vec<usize> = matching
                    .iter()
                    .copied()
                    .filter(|&i| !applicable[i].lifted)
                    .collect();
                match (matching.as_slice(), unlifted.as_slice()) {
                    ([best], _) | (_, [best]) => UserDefinedConversionResult::Valid {
                        best: *best,
                        candidates: applicable,
                    },
                    _ => UserDefinedConversionResult::Ambiguous {
                        candidates: applicable,
                    },
                }
            }
        };
        debug!(
            source = source.0,
            target = target.0,
            implicit_only,
            outcome = result.outcome(),
            candidates = result.candidates().len(),
            "user-defined conversion resolved"
        );
        result
    }

    // -------------------------------------------------------------------------
    // Gathering
    // -------------------------------------------------------------------------

    fn gather_operators(
        &self,
        source: TypeId,
        target: TypeId,
        implicit_only: bool,
    ) -> Vec<OperatorCandidate> {
        let mut declaring: Vec<DeclaringType> = Vec::new();
        let mut seen = IndexSet::<TypeId, FxBuildHasher>::default();
        let mut guard = RecursionGuard::with_profile(RecursionProfile::UserDefinedSearch);
        for ty in [source, target] {
            let ty = type_queries::strip_nullable(self.comp, ty);
            self.collect_declaring_types(ty, None, &mut declaring, &mut seen, &mut guard);
        }

        let mut operators = Vec::new();
        for declaring_type in declaring {
            let Some(named) = type_queries::named_type(self.comp, declaring_type.ty) else {
                continue;
            };
            let subst = TypeSubstitution::from_args(&named.info.type_params, &named.args);
            for &operator in &named.info.conversion_operators {
                let Some(method) = self.comp.methods().get(operator) else {
                    continue;
                };
                let wanted = match method.kind {
                    MethodKind::ImplicitConversion => true,
                    MethodKind::ExplicitConversion => !implicit_only,
                    MethodKind::Ordinary | MethodKind::DelegateInvoke => false,
                };
                let Some(param) = method.params.first() else {
                    continue;
                };
                if wanted {
                    operators.push(OperatorCandidate {
                        operator,
                        from: instantiate_type(self.comp.types(), param.ty, &subst),
                        to: instantiate_type(self.comp.types(), method.return_type, &subst),
                        constrained_to: declaring_type.constrained_to,
                    });
                }
            }
        }
        operators
    }

    /// Classes and structs whose operators are in scope for `ty`: the type
    /// itself and its base classes, or for a type parameter, those of its
    /// constraints.
    fn collect_declaring_types(
        &self,
        ty: TypeId,
        constrained_to: Option<TypeId>,
        out: &mut Vec<DeclaringType>,
        seen: &mut IndexSet<TypeId, FxBuildHasher>,
        guard: &mut RecursionGuard<TypeId>,
    ) {
        let walked = guard.scope(ty, |guard| match self.comp.types().lookup(ty) {
            Some(TypeData::TypeParameter(id)) => {
                let constraints = self
                    .comp
                    .types()
                    .type_param_info(id)
                    .map(|info| info.constraint_types)
                    .unwrap_or_default();
                for constraint in constraints {
                    self.collect_declaring_types(constraint, Some(ty), out, seen, guard);
                }
            }
            Some(TypeData::Named { .. }) => {
                if matches!(
                    type_queries::def_kind(self.comp, ty),
                    Some(DefKind::Class | DefKind::Struct)
                ) && seen.insert(ty)
                {
                    out.push(DeclaringType { ty, constrained_to });
                }
                if let Some(base) = inheritance::base_type(self.comp, ty) {
                    self.collect_declaring_types(base, constrained_to, out, seen, guard);
                }
            }
            _ => {}
        });
        match walked {
            Ok(()) => {}
            Err(reason) if reason.is_exceeded() => {
                debug!(ty = ty.0, ?reason, "operator search truncated");
            }
            Err(_) => trace!(ty = ty.0, "operator search revisited a type"),
        }
    }

    // -------------------------------------------------------------------------
    // Applicability
    // -------------------------------------------------------------------------

    /// The applicable forms (normal and lifted) of one operator.
    fn analyze_operator(
        &self,
        op: &OperatorCandidate,
        source: TypeId,
        target: TypeId,
        implicit_only: bool,
    ) -> Vec<UserDefinedConversionAnalysis> {
        let mut forms = vec![(op.from, op.to, false)];
        let source_is_nullable = type_queries::nullable_underlying(self.comp, source).is_some();
        if source_is_nullable
            && type_queries::is_non_nullable_value_type(self.comp, op.from)
            && type_queries::is_non_nullable_value_type(self.comp, op.to)
        {
            let types = self.comp.types();
            forms.push((types.nullable(op.from), types.nullable(op.to), true));
        }

        forms
            .into_iter()
            .filter_map(|(from, to, lifted)| {
                let source_conversion = self.pre_post_conversion(source, from, implicit_only)?;
                let target_conversion = self.pre_post_conversion(to, target, implicit_only)?;
                Some(UserDefinedConversionAnalysis {
                    operator: op.operator,
                    source_conversion,
                    target_conversion,
                    from_type: from,
                    to_type: to,
                    lifted,
                    constrained_to: op.constrained_to,
                })
            })
            .collect()
    }

    /// Standard implicit conversion, or for explicit resolution a standard
    /// conversion in either direction (applied as an explicit conversion).
    fn pre_post_conversion(&self, from: TypeId, to: TypeId, implicit_only: bool) -> Option<Conversion> {
        let implicit = self.classify_standard_implicit(from, to);
        if implicit.exists() {
            return Some(implicit);
        }
        if implicit_only || !self.classify_standard_implicit(to, from).exists() {
            return None;
        }
        let explicit = self.explicit_type_core(from, to, false);
        explicit.exists().then_some(explicit)
    }

    // -------------------------------------------------------------------------
    // Most specific types
    // -------------------------------------------------------------------------

    fn encompasses(&self, outer: TypeId, inner: TypeId) -> bool {
        outer == inner || self.classify_standard_implicit(inner, outer).exists()
    }

    /// The unique type in `types` that every other converts from.
    fn most_encompassed(&self, types: &[TypeId]) -> Option<TypeId> {
        unique(types, |x| types.iter().all(|&y| self.encompasses(y, x)))
    }

    /// The unique type in `types` that every other converts to.
    fn most_encompassing(&self, types: &[TypeId]) -> Option<TypeId> {
        unique(types, |x| types.iter().all(|&y| self.encompasses(x, y)))
    }

    fn most_specific_source(&self, source: TypeId, froms: &[TypeId], implicit_only: bool) -> Option<TypeId> {
        if froms.contains(&source) {
            return Some(source);
        }
        if implicit_only {
            return self.most_encompassed(froms);
        }
        let encompassing_source: Vec<TypeId> = froms
            .iter()
            .copied()
            .filter(|&from| self.encompasses(from, source))
            .collect();
        if encompassing_source.is_empty() {
            self.most_encompassing(froms)
        } else {
            self.most_encompassed(&encompassing_source)
        }
    }

    fn most_specific_target(&self, target: TypeId, tos: &[TypeId], implicit_only: bool) -> Option<TypeId> {
        if tos.contains(&target) {
            return Some(target);
        }
        if implicit_only {
            return self.most_encompassing(tos);
        }
        let encompassed_by_target: Vec<TypeId> = tos
            .iter()
            .copied()
            .filter(|&to| self.encompasses(target, to))
            .collect();
        if encompassed_by_target.is_empty() {
            self.most_encompassed(tos)
        } else {
            self.most_encompassing(&encompassed_by_target)
        }
    }
}

/// The single distinct type satisfying `pred`.
fn unique(types: &[TypeId], pred: impl Fn(TypeId) -> bool) -> Option<TypeId> {
    let distinct: IndexSet<TypeId, FxBuildHasher> = types.iter().copied().collect();
    let mut matching = distinct.into_iter().filter(|&t| pred(t));
    let first = matching.next()?;
    matching.next().is_none().then_some(first)
}

#[cfg(test)]
#[path = "../../tests/user_defined_tests.rs"]
mod tests;
