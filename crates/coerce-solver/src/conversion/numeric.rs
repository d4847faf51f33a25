//! Numeric conversion tables.

use crate::types::{IntrinsicKind, TypeId};

use IntrinsicKind::*;

/// Implicit numeric conversion between two numeric intrinsics (`char`
/// included). Identity is not an implicit numeric conversion.
pub fn is_implicit_numeric(source: IntrinsicKind, target: IntrinsicKind) -> bool {
    match source {
        SByte => matches!(target, Short | Int | Long | Float | Double | Decimal | NInt),
        Byte => matches!(
            target,
            Short | UShort | Int | UInt | Long | ULong | Float | Double | Decimal | NInt | NUInt
        ),
        Short => matches!(target, Int | Long | Float | Double | Decimal | NInt),
        UShort => matches!(
            target,
            Int | UInt | Long | ULong | Float | Double | Decimal | NInt | NUInt
        ),
        Int => matches!(target, Long | Float | Double | Decimal | NInt),
        UInt => matches!(target, Long | ULong | Float | Double | Decimal | NUInt),
        Long | ULong => matches!(target, Float | Double | Decimal),
        Char => matches!(
            target,
            UShort | Int | UInt | Long | ULong | Float | Double | Decimal | NInt | NUInt
        ),
        Float => matches!(target, Double),
        NInt => matches!(target, Long | Float | Double | Decimal),
        NUInt => matches!(target, ULong | Float | Double | Decimal),
        _ => false,
    }
}

/// Explicit numeric conversion: any pair of distinct numeric types that is
/// not an implicit numeric conversion.
pub fn is_explicit_numeric(source: IntrinsicKind, target: IntrinsicKind) -> bool {
    source != target
        && source.is_numeric()
        && target.is_numeric()
        && !is_implicit_numeric(source, target)
}

/// Whether an integral constant `value` is representable in `target`.
pub fn constant_fits(value: i128, target: IntrinsicKind) -> bool {
    let (min, max): (i128, i128) = match target {
        SByte => (i8::MIN.into(), i8::MAX.into()),
        Byte => (u8::MIN.into(), u8::MAX.into()),
        Short => (i16::MIN.into(), i16::MAX.into()),
        UShort => (u16::MIN.into(), u16::MAX.into()),
        Int => (i32::MIN.into(), i32::MAX.into()),
        UInt => (u32::MIN.into(), u32::MAX.into()),
        Long => (i64::MIN.into(), i64::MAX.into()),
        ULong => (u64::MIN.into(), u64::MAX.into()),
        // Native sizes are only known to fit in their 32-bit range.
        NInt => (i32::MIN.into(), i32::MAX.into()),
        NUInt => (u32::MIN.into(), u32::MAX.into()),
        _ => return false,
    };
    (min..=max).contains(&value)
}

/// Implicit constant expression conversion. `int` constants convert to
/// smaller and unsigned integral types when in range; `long` constants
/// convert to `ulong` when non-negative.
pub fn is_implicit_constant(source: IntrinsicKind, value: i128, target: IntrinsicKind) -> bool {
    match source {
        Int => {
            matches!(target, SByte | Byte | Short | UShort | UInt | ULong | NUInt)
                && constant_fits(value, target)
        }
        Long => target == ULong && value >= 0,
        _ => false,
    }
}

/// Integral types that take part in pointer/integer conversions.
pub fn is_pointer_integral(kind: IntrinsicKind) -> bool {
    matches!(
        kind,
        SByte | Byte | Short | UShort | Int | UInt | Long | ULong | NInt | NUInt
    )
}

/// Legacy explicit conversions involving `IntPtr`/`UIntPtr` when those are
/// not numeric types: between the pointer-sized struct and the integral
/// types it declares operators for.
pub fn is_legacy_int_ptr(source: IntrinsicKind, target: IntrinsicKind) -> bool {
    let legacy_partner = |k: IntrinsicKind, is_signed: bool| {
        if is_signed {
            matches!(k, Int | Long)
        } else {
            matches!(k, UInt | ULong)
        }
    };
    match (source, target) {
        (IntPtr, other) | (other, IntPtr) => legacy_partner(other, true),
        (UIntPtr, other) | (other, UIntPtr) => legacy_partner(other, false),
        _ => false,
    }
}

/// `IntPtr`/`UIntPtr` viewed as `nint`/`nuint`.
pub fn native_alias(ty: TypeId) -> TypeId {
    match ty {
        TypeId::INTPTR => TypeId::NINT,
        TypeId::UINTPTR => TypeId::NUINT,
        other => other,
    }
}

#[cfg(test)]
#[path = "../../tests/numeric_tests.rs"]
mod tests;
