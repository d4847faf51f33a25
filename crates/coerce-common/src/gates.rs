//! Language-version feature gates.
//!
//! Each behavior that differs across language versions has exactly one named
//! gate here. Classification and inference code never compares versions
//! inline; it calls the gate, so every version boundary can be audited and
//! tested in isolation.
//!
//! | Gate | First version |
//! |------|---------------|
//! | [`default_literal`] | 7.1 |
//! | [`stackalloc_to_span`] | 7.2 |
//! | [`switch_expressions`] | 8 |
//! | [`target_typed_conditional`] | 9 |
//! | [`target_typed_new`] | 9 |
//! | [`inferred_delegate_types`] | 10 |
//! | [`natural_function_type_in_generic_inference`] | 10 |
//! | [`function_type_conversion_is_worse`] | 10 |
//! | [`lambda_explicit_return_type`] | 10 |
//! | [`interpolated_string_handlers`] | 10 |
//! | [`numeric_intptr`] | 11 |

use crate::version::LanguageVersion;

/// `default` without a type (`T x = default;`).
pub fn default_literal(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V7_1
}

/// `stackalloc T[n]` converting to `Span<T>` / `ReadOnlySpan<T>`.
pub fn stackalloc_to_span(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V7_2
}

/// `e switch { ... }` expressions and their target-typed conversion.
pub fn switch_expressions(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V8
}

/// `c ? a : b` converting to a target when the arms have no natural type.
pub fn target_typed_conditional(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V9
}

/// `new(...)` without a type name.
pub fn target_typed_new(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V9
}

/// Lambdas and method groups have a natural (function) type, which allows
/// `var d = M;` and conversions to `Delegate`, `MulticastDelegate`, `object`,
/// `Expression` and `LambdaExpression`.
pub fn inferred_delegate_types(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V10
}

/// A lambda or method group passed for a bare method type parameter
/// contributes its natural function type as a lower bound during generic
/// method type inference. Before this version such arguments contribute
/// nothing, which leaves the type parameter unfixed.
pub fn natural_function_type_in_generic_inference(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V10
}

/// Overload betterness: a conversion that is not a function type conversion is
/// better than one that is.
pub fn function_type_conversion_is_worse(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V10
}

/// Explicit lambda return types (`int (x) => x`).
pub fn lambda_explicit_return_type(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V10
}

/// Interpolated strings converting to user-declared handler types.
pub fn interpolated_string_handlers(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V10
}

/// `IntPtr`/`UIntPtr` are identical to `nint`/`nuint` (also requires runtime
/// support, see [`crate::AnalysisOptions::numeric_int_ptr_runtime`]).
pub fn numeric_intptr(version: LanguageVersion) -> bool {
    version >= LanguageVersion::V11
}

#[cfg(test)]
#[path = "../tests/gates_tests.rs"]
mod tests;
