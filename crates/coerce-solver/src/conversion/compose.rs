//! Composite conversions built from already-classified conversions.
//!
//! Composition is pure. An invalid nested conversion always yields an invalid
//! composite; nothing here upgrades validity. Single-element nested lists for
//! the common trivial underlying kinds are shared, lazily-initialized
//! singletons.

use once_cell::sync::Lazy;
use std::sync::Arc;

use super::{Conversion, ConversionKind, NestedBuffer};

static IDENTITY_UNDERLYING: Lazy<Arc<[Conversion]>> =
    Lazy::new(|| Arc::from([Conversion::IDENTITY]));
static IMPLICIT_NUMERIC_UNDERLYING: Lazy<Arc<[Conversion]>> =
    Lazy::new(|| Arc::from([Conversion::IMPLICIT_NUMERIC]));
static EXPLICIT_NUMERIC_UNDERLYING: Lazy<Arc<[Conversion]>> =
    Lazy::new(|| Arc::from([Conversion::new(ConversionKind::ExplicitNumeric)]));
static EXPLICIT_ENUMERATION_UNDERLYING: Lazy<Arc<[Conversion]>> =
    Lazy::new(|| Arc::from([Conversion::new(ConversionKind::ExplicitEnumeration)]));
static POINTER_TO_INTEGER_UNDERLYING: Lazy<Arc<[Conversion]>> =
    Lazy::new(|| Arc::from([Conversion::new(ConversionKind::ExplicitPointerToInteger)]));

/// A one-element nested list, shared for trivial common kinds.
pub fn single_nested(underlying: Conversion) -> Arc<[Conversion]> {
    let shared = match underlying.kind() {
        ConversionKind::Identity => Some(&IDENTITY_UNDERLYING),
        ConversionKind::ImplicitNumeric => Some(&IMPLICIT_NUMERIC_UNDERLYING),
        ConversionKind::ExplicitNumeric => Some(&EXPLICIT_NUMERIC_UNDERLYING),
        ConversionKind::ExplicitEnumeration => Some(&EXPLICIT_ENUMERATION_UNDERLYING),
        ConversionKind::ExplicitPointerToInteger => Some(&POINTER_TO_INTEGER_UNDERLYING),
        _ => None,
    };
    match shared {
        Some(list) => Arc::clone(list),
        None => Arc::from([underlying]),
    }
}

/// Wrap `underlying` (a conversion between the non-nullable types) as an
/// implicit or explicit nullable conversion.
pub fn lift_over_nullable(kind: ConversionKind, underlying: Conversion) -> Conversion {
    debug_assert!(kind.is_nullable(), "{kind} is not a nullable kind");
    Conversion::with_nested(kind, single_nested(underlying))
}

/// Combine per-arm conversions of a switch or conditional expression.
pub fn compose_switch_or_conditional(
    kind: ConversionKind,
    arms: impl IntoIterator<Item = Conversion>,
) -> Conversion {
    debug_assert!(
        matches!(
            kind,
            ConversionKind::SwitchExpression | ConversionKind::ConditionalExpression
        ),
        "{kind} is not a switch or conditional kind"
    );
    let arms: NestedBuffer = arms.into_iter().collect();
    if arms.is_empty() {
        return Conversion::NO_CONVERSION;
    }
    Conversion::with_nested(kind, Arc::from(arms.into_vec()))
}

/// Wrap the conversion from a stackalloc's natural type to the target.
pub fn compose_stackalloc(kind: ConversionKind, underlying: Conversion) -> Conversion {
    debug_assert!(kind.is_stackalloc(), "{kind} is not a stackalloc kind");
    Conversion::with_nested(kind, single_nested(underlying))
}

/// Combine element-wise tuple conversions.
pub fn compose_tuple(
    kind: ConversionKind,
    elements: impl IntoIterator<Item = Conversion>,
) -> Conversion {
    debug_assert!(kind.is_tuple(), "{kind} is not a tuple kind");
    let elements: NestedBuffer = elements.into_iter().collect();
    if elements.is_empty() {
        return Conversion::NO_CONVERSION;
    }
    Conversion::with_nested(kind, Arc::from(elements.into_vec()))
}

#[cfg(test)]
#[path = "../../tests/compose_tests.rs"]
mod tests;
