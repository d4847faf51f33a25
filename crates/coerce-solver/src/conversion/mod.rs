//! Conversion classification.
//!
//! A [`Conversion`] is an immutable value describing whether a conversion
//! exists between a source (a type or an untyped expression) and a target
//! type, and by what mechanism. [`ConversionClassifier`] produces them; it is
//! total and always returns a `Conversion`, using
//! [`ConversionKind::NoConversion`] rather than failing.
//!
//! Submodules:
//! - `kind`: the closed kind taxonomy and its predicates
//! - `compose`: nullable / tuple / stackalloc / switch / conditional
//!   composition over already-classified conversions
//! - `numeric`: numeric, constant and `IntPtr` tables
//! - `classify`: type-to-type implicit classification
//! - `expression`: expression-to-type classification and natural types
//! - `explicit`: explicit (cast) classification
//! - `user_defined`: user-defined operator resolution
//! - `special`: deconstruction and `fixed` initializer conversions
//! - `betterness`: better conversion target / from expression

pub mod betterness;
mod classify;
pub mod compose;
mod explicit;
mod expression;
pub mod kind;
pub mod numeric;
mod special;
pub mod user_defined;

use coerce_common::LanguageVersion;
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::compilation::Compilation;
use crate::expr::Expr;
use crate::method::MethodId;
use crate::types::TypeId;

pub use expression::BindScope;
pub use kind::ConversionKind;
pub use user_defined::{UserDefinedConversionAnalysis, UserDefinedConversionResult};

// =============================================================================
// Conversion
// =============================================================================

/// Deconstruction payload: the `Deconstruct` method used (absent for
/// tuple-typed sources) and the number of outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeconstructionInfo {
    pub method: Option<MethodId>,
    pub arity: usize,
}

/// Payload for non-trivial conversion kinds.
#[derive(Clone, Debug, Default)]
pub struct UncommonData {
    pub is_extension_method: bool,
    pub is_array_index: bool,
    pub method: Option<MethodId>,
    pub nested: Option<Arc<[Conversion]>>,
    pub user_defined: Option<Arc<UserDefinedConversionResult>>,
    pub deconstruction: Option<DeconstructionInfo>,
}

/// A classified conversion.
///
/// Cheap to clone: trivial kinds carry no payload and the payload of the
/// others is shared. Equality and hashing consider only the kind and the
/// resolved method.
#[derive(Clone, Debug)]
pub struct Conversion {
    kind: ConversionKind,
    uncommon: Option<Arc<UncommonData>>,
}

impl Conversion {
    pub const UNSET: Self = Self::trivial(ConversionKind::Unset);
    pub const NO_CONVERSION: Self = Self::trivial(ConversionKind::NoConversion);
    pub const IDENTITY: Self = Self::trivial(ConversionKind::Identity);
    pub const IMPLICIT_NUMERIC: Self = Self::trivial(ConversionKind::ImplicitNumeric);
    pub const IMPLICIT_REFERENCE: Self = Self::trivial(ConversionKind::ImplicitReference);
    pub const BOXING: Self = Self::trivial(ConversionKind::Boxing);

    const fn trivial(kind: ConversionKind) -> Self {
        Self {
            kind,
            uncommon: None,
        }
    }

    /// A conversion of a trivial kind.
    pub fn new(kind: ConversionKind) -> Self {
        debug_assert!(
            !kind.requires_payload(),
            "{kind} requires uncommon data and cannot be constructed bare"
        );
        Self::trivial(kind)
    }

    fn with_uncommon(kind: ConversionKind, data: UncommonData) -> Self {
        debug_assert!(
            kind.requires_payload(),
            "{kind} is trivial and must not carry uncommon data"
        );
        Self {
            kind,
            uncommon: Some(Arc::new(data)),
        }
    }

    /// A composite conversion over nested conversions.
    pub fn with_nested(kind: ConversionKind, nested: Arc<[Conversion]>) -> Self {
        debug_assert!(kind.has_nested(), "{kind} does not carry nested conversions");
        debug_assert!(!nested.is_empty(), "{kind} requires at least one nested conversion");
        Self::with_uncommon(
            kind,
            UncommonData {
                nested: Some(nested),
                ..UncommonData::default()
            },
        )
    }

    pub fn method_group(method: MethodId, is_extension_method: bool) -> Self {
        Self::with_uncommon(
            ConversionKind::MethodGroup,
            UncommonData {
                method: Some(method),
                is_extension_method,
                ..UncommonData::default()
            },
        )
    }

    /// A user-defined conversion carrying the full resolution outcome. The
    /// method is set only when resolution produced a unique operator.
    pub fn user_defined(kind: ConversionKind, result: UserDefinedConversionResult) -> Self {
        debug_assert!(kind.is_user_defined(), "{kind} is not a user-defined kind");
        let method = result.best().map(|best| best.operator);
        Self::with_uncommon(
            kind,
            UncommonData {
                method,
                user_defined: Some(Arc::new(result)),
                ..UncommonData::default()
            },
        )
    }

    pub fn deconstruction(nested: Arc<[Conversion]>, info: DeconstructionInfo) -> Self {
        debug_assert!(
            !nested.is_empty(),
            "deconstruction info requires nested conversions"
        );
        debug_assert_eq!(nested.len(), info.arity, "deconstruction arity mismatch");
        Self::with_uncommon(
            ConversionKind::Deconstruction,
            UncommonData {
                method: info.method,
                nested: Some(nested),
                deconstruction: Some(info),
                ..UncommonData::default()
            },
        )
    }

    /// Mark a method-bearing conversion as going through an array index.
    pub fn with_array_index(self) -> Self {
        debug_assert!(self.kind.allows_array_index());
        let mut data = self.uncommon.as_deref().cloned().unwrap_or_default();
        data.is_array_index = true;
        Self::with_uncommon(self.kind, data)
    }

    /// A copy of this conversion with the resolved method replaced, used
    /// after generic substitution rewrites the method.
    pub fn with_method(&self, method: MethodId) -> Self {
        debug_assert!(
            self.kind.is_method_group() || self.kind.is_user_defined(),
            "{} has no method to patch",
            self.kind
        );
        let mut data = self.uncommon.as_deref().cloned().unwrap_or_default();
        data.method = Some(method);
        Self::with_uncommon(self.kind, data)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline]
    pub fn kind(&self) -> ConversionKind {
        self.kind
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.kind.exists()
    }

    #[inline]
    pub fn is_implicit(&self) -> bool {
        self.kind.is_implicit()
    }

    #[inline]
    pub fn is_explicit(&self) -> bool {
        self.kind.is_explicit()
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.kind.is_identity()
    }

    #[inline]
    pub fn is_user_defined(&self) -> bool {
        self.kind.is_user_defined()
    }

    pub fn method(&self) -> Option<MethodId> {
        self.uncommon.as_ref().and_then(|u| u.method)
    }

    pub fn is_extension_method(&self) -> bool {
        self.uncommon.as_ref().is_some_and(|u| u.is_extension_method)
    }

    pub fn is_array_index(&self) -> bool {
        self.uncommon.as_ref().is_some_and(|u| u.is_array_index)
    }

    /// Nested conversions (empty for kinds without them).
    pub fn nested(&self) -> &[Conversion] {
        self.uncommon
            .as_ref()
            .and_then(|u| u.nested.as_deref())
            .unwrap_or(&[])
    }

    pub(crate) fn nested_arc(&self) -> Option<&Arc<[Conversion]>> {
        self.uncommon.as_ref().and_then(|u| u.nested.as_ref())
    }

    pub fn user_defined_result(&self) -> Option<&UserDefinedConversionResult> {
        self.uncommon
            .as_ref()
            .and_then(|u| u.user_defined.as_deref())
    }

    pub fn deconstruction_info(&self) -> Option<&DeconstructionInfo> {
        self.uncommon
            .as_ref()
            .and_then(|u| u.deconstruction.as_ref())
    }

    /// `true` iff the conversion exists, every nested conversion is valid,
    /// and a method was resolved where one is required.
    pub fn is_valid(&self) -> bool {
        if !self.exists() {
            return false;
        }
        if !self.nested().iter().all(Conversion::is_valid) {
            return false;
        }
        if self.kind.is_user_defined() {
            return self.method().is_some()
                && self.user_defined_result().is_some_and(|r| r.is_valid());
        }
        if self.kind.is_method_group() {
            return self.method().is_some();
        }
        true
    }
}

impl PartialEq for Conversion {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.method() == other.method()
    }
}

impl Eq for Conversion {}

impl Hash for Conversion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.method().hash(state);
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())?;
        let nested = self.nested();
        if !nested.is_empty() {
            f.write_str("(")?;
            for (i, n) in nested.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{n}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

// =============================================================================
// ConversionClassifier
// =============================================================================

/// Source of a classification query.
#[derive(Copy, Clone, Debug)]
pub enum ConversionSource<'e> {
    Type(TypeId),
    Expr(&'e Expr),
}

/// Classifies conversions for one language version.
///
/// Cheap to copy; holds only a shared reference to the compilation.
#[derive(Copy, Clone)]
pub struct ConversionClassifier<'a> {
    pub(crate) comp: &'a Compilation,
    pub(crate) version: LanguageVersion,
}

impl<'a> ConversionClassifier<'a> {
    pub fn new(comp: &'a Compilation) -> Self {
        Self {
            comp,
            version: comp.options().language_version,
        }
    }

    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.version = version;
        self
    }

    pub fn compilation(&self) -> &'a Compilation {
        self.comp
    }

    pub fn language_version(&self) -> LanguageVersion {
        self.version
    }

    /// Classify an implicit conversion from `source` to `target`.
    pub fn classify(
        &self,
        source: ConversionSource<'_>,
        target: TypeId,
        diagnostics: &mut crate::diagnostics::UseSiteDiagnostics,
    ) -> Conversion {
        match source {
            ConversionSource::Type(ty) => self.classify_implicit_type(ty, target),
            ConversionSource::Expr(expr) => self.classify_implicit(expr, target, diagnostics),
        }
    }
}

pub(crate) type NestedBuffer = SmallVec<[Conversion; 4]>;

#[cfg(test)]
#[path = "../../tests/conversion_tests.rs"]
mod tests;
