//! Invocation signatures of delegates, methods and lambdas.

use coerce_common::interner::Atom;
use smallvec::SmallVec;

use crate::compilation::Compilation;
use crate::delegate::synthesized::{ParamShape, ReturnShape, SignatureKey};
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::method::{KNOWN_REQUIRED_MODIFIERS, MethodInfo};
use crate::type_queries;
use crate::types::{RefKind, TypeArgs, TypeData, TypeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignatureParam {
    pub ty: TypeId,
    pub ref_kind: RefKind,
    pub is_params: bool,
}

impl SignatureParam {
    pub fn value(ty: TypeId) -> Self {
        Self {
            ty,
            ref_kind: RefKind::None,
            is_params: false,
        }
    }
}

/// A closed invocation signature. Two signatures are equal only if every
/// parameter type, ref-kind and `params` flag and the return type and
/// ref-kind are identical (tuple element names included). Custom modifiers
/// are not part of a signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DelegateSignature {
    pub params: SmallVec<[SignatureParam; 4]>,
    pub return_type: TypeId,
    pub return_ref: RefKind,
}

impl DelegateSignature {
    pub fn new(
        params: impl IntoIterator<Item = SignatureParam>,
        return_type: TypeId,
        return_ref: RefKind,
    ) -> Self {
        Self {
            params: params.into_iter().collect(),
            return_type,
            return_ref,
        }
    }

    pub fn returns_void(&self) -> bool {
        self.return_type == TypeId::VOID
    }

    pub fn param_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.params.iter().map(|p| p.ty)
    }

    /// The shape of this signature, ignoring types.
    pub fn key(&self) -> SignatureKey {
        let returns = if self.returns_void() {
            ReturnShape::Void
        } else {
            ReturnShape::Value(self.return_ref)
        };
        SignatureKey::new(
            self.params.iter().map(|p| ParamShape {
                ref_kind: p.ref_kind,
                is_params: p.is_params,
            }),
            returns,
        )
    }

    /// Type arguments of a generic delegate with this signature: the
    /// parameter types followed by the return type unless it is `void`.
    pub fn type_args(&self) -> TypeArgs {
        let mut args: TypeArgs = self.param_types().collect();
        if !self.returns_void() {
            args.push(self.return_type);
        }
        args
    }

    /// Whether this is the signature of some `Action`/`Func`: every
    /// parameter and the return passed by value, no `params`.
    pub fn is_plain(&self) -> bool {
        self.return_ref == RefKind::None
            && self
                .params
                .iter()
                .all(|p| p.ref_kind == RefKind::None && !p.is_params)
    }
}

/// The signature of `method` with `subst` applied. With `skip_receiver`
/// (an extension method used through a receiver) the first parameter is
/// dropped.
pub fn method_signature(
    comp: &Compilation,
    method: &MethodInfo,
    subst: &TypeSubstitution,
    skip_receiver: bool,
) -> DelegateSignature {
    let skip = usize::from(skip_receiver && !method.params.is_empty());
    DelegateSignature::new(
        method.params.iter().skip(skip).map(|p| SignatureParam {
            ty: instantiate_type(comp.types(), p.ty, subst),
            ref_kind: p.ref_kind,
            is_params: p.is_params,
        }),
        instantiate_type(comp.types(), method.return_type, subst),
        method.return_ref,
    )
}

/// The `Invoke` signature of a delegate type (named or synthesized),
/// instantiated with the type's arguments.
pub fn delegate_signature(comp: &Compilation, ty: TypeId) -> Option<DelegateSignature> {
    match comp.types().lookup(ty)? {
        TypeData::Named { .. } => {
            let named = type_queries::named_type(comp, ty)?;
            let invoke = comp.methods().get(named.info.invoke?)?;
            let subst = TypeSubstitution::from_args(&named.info.type_params, &named.args);
            Some(method_signature(comp, &invoke, &subst, false))
        }
        TypeData::Synthesized { delegate, args } => {
            Some(comp.synthesized().get(delegate)?.signature(&args))
        }
        _ => None,
    }
}

/// The first required custom modifier on `method` that the language does not
/// understand. Optional modifiers are ignored.
pub fn unsupported_modifier(comp: &Compilation, method: &MethodInfo) -> Option<Atom> {
    method
        .required_modifiers()
        .find(|&modifier| !KNOWN_REQUIRED_MODIFIERS.contains(&&*comp.name_of(modifier)))
}

#[cfg(test)]
#[path = "../../tests/signature_tests.rs"]
mod tests;
