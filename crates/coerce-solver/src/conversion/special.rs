//! Deconstruction and `fixed` initializer conversions.

use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

use super::{Conversion, ConversionClassifier, ConversionKind, DeconstructionInfo};
use crate::inheritance;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::method::{MethodId, MethodInfo};
use crate::type_queries;
use crate::types::{RefKind, TypeId};

impl<'a> ConversionClassifier<'a> {
    /// Conversion of `source` into the positional `targets` of a
    /// deconstruction, as in `var (a, b) = source;`.
    ///
    /// Tuple-typed sources deconstruct element-wise. Other sources need a
    /// unique non-generic `Deconstruct` method on the type or one of its base
    /// classes with exactly `targets.len()` `out` parameters.
    pub fn classify_deconstruction(&self, source: TypeId, targets: &[TypeId]) -> Conversion {
        if source.is_error() || targets.is_empty() {
            return Conversion::NO_CONVERSION;
        }
        if let Some(elements) = type_queries::tuple_elements(self.comp, source) {
            if elements.len() != targets.len() {
                return Conversion::NO_CONVERSION;
            }
            let outputs: SmallVec<[TypeId; 4]> = elements.iter().map(|e| e.ty).collect();
            return self.deconstruct_into(&outputs, targets, None);
        }

        let mut matches: SmallVec<[(MethodId, SmallVec<[TypeId; 4]>); 2]> = SmallVec::new();
        let mut owners = vec![source];
        owners.extend(inheritance::base_chain(self.comp, source));
        for owner in owners {
            let Some(named) = type_queries::named_type(self.comp, owner) else {
                continue;
            };
            let subst = TypeSubstitution::from_args(&named.info.type_params, &named.args);
            for &id in &named.info.deconstructors {
                let Some(method) = self.comp.methods().get(id) else {
                    continue;
                };
                if let Some(outputs) = self.deconstructor_outputs(&method, &subst, targets.len()) {
                    matches.push((id, outputs));
                }
            }
            // Nearer declarations hide those of base classes.
            if !matches.is_empty() {
                break;
            }
        }
        match matches.as_slice() {
            [(method, outputs)] => self.deconstruct_into(outputs, targets, Some(*method)),
            [] => Conversion::NO_CONVERSION,
            _ => {
                debug!(source = source.0, candidates = matches.len(), "ambiguous Deconstruct");
                Conversion::NO_CONVERSION
            }
        }
    }

    fn deconstructor_outputs(
        &self,
        method: &MethodInfo,
        subst: &TypeSubstitution,
        arity: usize,
    ) -> Option<SmallVec<[TypeId; 4]>> {
        if method.is_generic() || method.params.len() != arity {
            return None;
        }
        method
            .params
            .iter()
            .map(|p| (p.ref_kind == RefKind::Out).then(|| instantiate_type(self.comp.types(), p.ty, subst)))
            .collect()
    }

    fn deconstruct_into(&self, outputs: &[TypeId], targets: &[TypeId], method: Option<MethodId>) -> Conversion {
        let mut nested = Vec::with_capacity(targets.len());
        for (&output, &target) in outputs.iter().zip(targets) {
            let conversion = self.classify_implicit_type(output, target);
            if !conversion.exists() {
                return Conversion::NO_CONVERSION;
            }
            nested.push(conversion);
        }
        Conversion::deconstruction(
            Arc::from(nested),
            DeconstructionInfo {
                method,
                arity: targets.len(),
            },
        )
    }

    /// Conversion of a `fixed` statement initializer: an array or `string`
    /// pinned to a pointer to its element type.
    pub fn classify_fixed_initializer(&self, source: TypeId, target: TypeId) -> Conversion {
        if !self.comp.options().allow_unsafe {
            return Conversion::NO_CONVERSION;
        }
        let Some(pointee) = type_queries::pointee(self.comp, target) else {
            return Conversion::NO_CONVERSION;
        };
        let element = if source == TypeId::STRING {
            Some(TypeId::CHAR)
        } else {
            type_queries::array_info(self.comp, source).map(|(element, _)| element)
        };
        match element {
            Some(element) if pointee == TypeId::VOID || self.is_identity_convertible(element, pointee) => {
                Conversion::new(ConversionKind::PinnedObjectToPointer)
            }
            _ => Conversion::NO_CONVERSION,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/special_tests.rs"]
mod tests;
