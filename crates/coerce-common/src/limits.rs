//! Centralized limits and thresholds.
//!
//! Recursion limits for hierarchy walks and nested classification live in
//! `coerce_solver::recursion::RecursionProfile`; the values here bound the
//! inference engine and the shapes the solver is willing to build.

// =============================================================================
// Inference
// =============================================================================

/// Maximum number of phase-two rounds in method type inference.
///
/// Each round fixes at least one type parameter or performs at least one
/// output type inference, so a method with N type parameters and M arguments
/// needs at most N + M rounds. The cap only matters for malformed input.
pub const MAX_INFERENCE_ROUNDS: u32 = 256;

/// Units of inference work between two cancellation polls.
///
/// A unit is one candidate expression examined by best-common-type or one
/// argument visited by method type inference.
pub const CANCELLATION_CHECK_INTERVAL: u32 = 64;

// =============================================================================
// Shapes
// =============================================================================

/// Largest parameter count of the well-known `Action`/`Func` families.
pub const MAX_FUNC_ARITY: usize = 16;

/// Largest parameter count a synthesized delegate signature key can encode.
///
/// The key packs two bits for the return ref-kind plus three bits per
/// parameter into a `u64`.
pub const MAX_SYNTHESIZED_DELEGATE_PARAMS: usize = 20;

/// Maximum nesting depth for recursive classification (tuples of tuples,
/// conditional arms holding switch expressions, nested lambdas).
pub const MAX_CONVERSION_DEPTH: u32 = 64;

/// Maximum depth of a base-type / interface hierarchy walk.
pub const MAX_HIERARCHY_DEPTH: u32 = 64;
