//! Structural delegate types synthesized on demand.
//!
//! When no named delegate fits an inferred signature, the compilation
//! fabricates one. Synthesized delegates are generic over their parameter
//! and return types and are identified by the *shape* of the signature: the
//! ref-kind and `params` flag of each parameter plus the return ref-kind (or
//! `void`). Every request for an equal [`SignatureKey`] within one
//! compilation yields the same [`SynthesizedDelegateId`], so two lambdas with
//! the same shape and types get the same `TypeId`.
//!
//! The cache is the only shared mutable state in the solver. Concurrent
//! first requests race on an insert-if-absent; the loser drops its candidate
//! and adopts the published one.
//!
//! Nothing is registered for emission eagerly. [`collect_for_emit`] walks
//! the types of retained expressions and returns only the synthesized
//! delegates they reference.

use coerce_common::limits::MAX_SYNTHESIZED_DELEGATE_PARAMS;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

use crate::compilation::Compilation;
use crate::delegate::signature::{DelegateSignature, SignatureParam};
use crate::type_queries;
use crate::types::{Accessibility, RefKind, TypeData, TypeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SynthesizedDelegateId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamShape {
    pub ref_kind: RefKind,
    pub is_params: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReturnShape {
    Void,
    Value(RefKind),
}

/// Canonical shape of a synthesized delegate signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureKey {
    params: SmallVec<[ParamShape; 4]>,
    returns: ReturnShape,
}

impl SignatureKey {
    pub fn new(params: impl IntoIterator<Item = ParamShape>, returns: ReturnShape) -> Self {
        let params: SmallVec<[ParamShape; 4]> = params.into_iter().collect();
        assert!(
            params.len() <= MAX_SYNTHESIZED_DELEGATE_PARAMS,
            "signature key with {} parameters exceeds the encodable maximum",
            params.len()
        );
        Self { params, returns }
    }

    pub fn params(&self) -> &[ParamShape] {
        &self.params
    }

    pub fn returns(&self) -> ReturnShape {
        self.returns
    }

    /// Type parameter count: one per parameter plus one for a non-void
    /// return.
    pub fn arity(&self) -> usize {
        self.params.len() + usize::from(self.returns != ReturnShape::Void)
    }

    /// Compact encoding: bits 0-1 hold the return ref-kind, then three bits
    /// per parameter (two for the ref-kind, one for `params`). Together with
    /// [`arity`](Self::arity) and the void/value return prefix of the name it
    /// determines the key.
    pub fn encode(&self) -> u64 {
        let mut bits = match self.returns {
            ReturnShape::Void => 0,
            ReturnShape::Value(ref_kind) => ref_kind.bits(),
        };
        for (i, param) in self.params.iter().enumerate() {
            let shape = param.ref_kind.bits() | (u64::from(param.is_params) << 2);
            bits |= shape << (2 + 3 * i);
        }
        bits
    }

    /// `<>F{00000001}` for value-returning shapes, `<>A{...}` for `void`.
    pub fn name(&self) -> String {
        let prefix = match self.returns {
            ReturnShape::Void => "<>A",
            ReturnShape::Value(_) => "<>F",
        };
        format!("{prefix}{{{:08x}}}", self.encode())
    }

    /// The name with its generic arity suffix, as it would appear in
    /// metadata.
    pub fn metadata_name(&self) -> String {
        match self.arity() {
            0 => self.name(),
            arity => format!("{}`{arity}", self.name()),
        }
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.metadata_name())
    }
}

/// A synthesized delegate definition. Its type parameters are positional:
/// one per parameter, then the return type.
#[derive(Clone, Debug)]
pub struct SynthesizedDelegateInfo {
    pub id: SynthesizedDelegateId,
    pub key: SignatureKey,
    pub name: Arc<str>,
    pub accessibility: Accessibility,
}

impl SynthesizedDelegateInfo {
    /// The `Invoke` signature for an instantiation with `args`.
    pub fn signature(&self, args: &[TypeId]) -> DelegateSignature {
        debug_assert_eq!(args.len(), self.key.arity(), "synthesized delegate arity mismatch");
        let params = self
            .key
            .params
            .iter()
            .zip(args)
            .map(|(shape, &ty)| SignatureParam {
                ty,
                ref_kind: shape.ref_kind,
                is_params: shape.is_params,
            });
        let (return_type, return_ref) = match self.key.returns {
            ReturnShape::Void => (TypeId::VOID, RefKind::None),
            ReturnShape::Value(ref_kind) => (
                args.get(self.key.params.len()).copied().unwrap_or(TypeId::ERROR),
                ref_kind,
            ),
        };
        DelegateSignature::new(params, return_type, return_ref)
    }
}

// =============================================================================
// Cache
// =============================================================================

pub struct SynthesizedDelegateCache {
    by_key: DashMap<SignatureKey, Arc<SynthesizedDelegateInfo>, FxBuildHasher>,
    by_id: DashMap<SynthesizedDelegateId, Arc<SynthesizedDelegateInfo>, FxBuildHasher>,
    next_id: AtomicU32,
}

impl Default for SynthesizedDelegateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthesizedDelegateCache {
    pub fn new() -> Self {
        Self {
            by_key: DashMap::with_hasher(FxBuildHasher),
            by_id: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU32::new(1),
        }
    }

    /// The canonical delegate for `key`, creating it on first request.
    pub fn get_or_create(&self, key: SignatureKey) -> Arc<SynthesizedDelegateInfo> {
        if let Some(existing) = self.by_key.get(&key) {
            return Arc::clone(existing.value());
        }

        let id = SynthesizedDelegateId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let candidate = Arc::new(SynthesizedDelegateInfo {
            id,
            name: Arc::from(key.name()),
            key: key.clone(),
            accessibility: Accessibility::Internal,
        });

        match self.by_key.entry(key) {
            Entry::Occupied(winner) => {
                debug!(
                    discarded = id.0,
                    adopted = winner.get().id.0,
                    "synthesized delegate: lost insert race"
                );
                Arc::clone(winner.get())
            }
            Entry::Vacant(slot) => {
                // Resolvable by id before it becomes reachable by key.
                self.by_id.insert(id, Arc::clone(&candidate));
                slot.insert(Arc::clone(&candidate));
                debug!(id = id.0, name = %candidate.name, "synthesized delegate created");
                candidate
            }
        }
    }

    pub fn get(&self, id: SynthesizedDelegateId) -> Option<Arc<SynthesizedDelegateInfo>> {
        self.by_id.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn lookup(&self, key: &SignatureKey) -> Option<Arc<SynthesizedDelegateInfo>> {
        self.by_key.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

// =============================================================================
// Synthesis
// =============================================================================

/// Why a signature cannot be given a synthesized delegate type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SynthesisError {
    /// A pointer or function pointer type cannot be a type argument.
    PointerType(TypeId),
    /// A ref-like (stack-only) type cannot be a type argument.
    RefLikeType(TypeId),
    VoidParameter,
    TooManyParameters(usize),
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointerType(ty) => write!(f, "pointer type {} cannot be a type argument", ty.0),
            Self::RefLikeType(ty) => write!(f, "ref-like type {} cannot be a type argument", ty.0),
            Self::VoidParameter => f.write_str("a parameter cannot have type void"),
            Self::TooManyParameters(count) => write!(
                f,
                "{count} parameters exceed the synthesized delegate maximum of {MAX_SYNTHESIZED_DELEGATE_PARAMS}"
            ),
        }
    }
}

impl std::error::Error for SynthesisError {}

/// Check that every type in `signature` can be a type argument.
pub(crate) fn check_type_arguments(
    comp: &Compilation,
    signature: &DelegateSignature,
) -> Result<(), SynthesisError> {
    for ty in signature.param_types() {
        if ty == TypeId::VOID {
            return Err(SynthesisError::VoidParameter);
        }
        check_type_argument(comp, ty)?;
    }
    if !signature.returns_void() {
        check_type_argument(comp, signature.return_type)?;
    }
    Ok(())
}

fn check_type_argument(comp: &Compilation, ty: TypeId) -> Result<(), SynthesisError> {
    if type_queries::is_pointer_like(comp, ty) {
        return Err(SynthesisError::PointerType(ty));
    }
    if type_queries::is_ref_like(comp, ty) {
        return Err(SynthesisError::RefLikeType(ty));
    }
    Ok(())
}

/// The synthesized delegate type for `signature`, reusing the cached
/// definition for its shape.
pub fn synthesize_or_reuse(
    comp: &Compilation,
    signature: &DelegateSignature,
) -> Result<(TypeId, Arc<SynthesizedDelegateInfo>), SynthesisError> {
    if signature.params.len() > MAX_SYNTHESIZED_DELEGATE_PARAMS {
        return Err(SynthesisError::TooManyParameters(signature.params.len()));
    }
    check_type_arguments(comp, signature)?;
    let info = comp.synthesized().get_or_create(signature.key());
    let ty = comp.types().synthesized(info.id, signature.type_args());
    Ok((ty, info))
}

// =============================================================================
// Emit liveness
// =============================================================================

/// Synthesized delegates referenced by the types of retained expressions,
/// ordered by signature key.
pub fn collect_for_emit(
    comp: &Compilation,
    retained: impl IntoIterator<Item = TypeId>,
) -> Vec<Arc<SynthesizedDelegateInfo>> {
    let mut seen_types = IndexSet::<TypeId, FxBuildHasher>::default();
    let mut live = IndexSet::<SynthesizedDelegateId, FxBuildHasher>::default();
    let mut stack: Vec<TypeId> = retained.into_iter().collect();
    while let Some(ty) = stack.pop() {
        if ty.is_intrinsic() || !seen_types.insert(ty) {
            continue;
        }
        let Some(data) = comp.types().lookup(ty) else {
            continue;
        };
        match data {
            TypeData::Synthesized { delegate, args } => {
                live.insert(delegate);
                stack.extend(args);
            }
            TypeData::Named { args, .. } => stack.extend(args),
            TypeData::Array { element, .. } => stack.push(element),
            TypeData::Pointer(inner) | TypeData::Nullable(inner) => stack.push(inner),
            TypeData::FunctionPointer {
                params,
                return_type,
                ..
            } => {
                stack.extend(params.iter().map(|p| p.ty));
                stack.push(return_type);
            }
            TypeData::Tuple(elements) => stack.extend(elements.iter().map(|e| e.ty)),
            TypeData::Error | TypeData::Intrinsic(_) | TypeData::TypeParameter(_) => {}
        }
    }
    let mut infos: Vec<_> = live
        .into_iter()
        .filter_map(|id| comp.synthesized().get(id))
        .collect();
    infos.sort_by(|a, b| a.key.cmp(&b.key));
    debug!(count = infos.len(), "synthesized delegates retained for emit");
    infos
}

#[cfg(test)]
#[path = "../../tests/synthesized_tests.rs"]
mod tests;
