//! Conversion classification and type inference core.
//!
//! Decides, for two types or for an untyped expression and a type, whether a
//! conversion exists and by what mechanism, and infers the types the
//! surrounding binder needs:
//!
//! - **Conversions**: implicit, explicit, user-defined, deconstruction and
//!   `fixed` classification over a closed [`ConversionKind`] taxonomy
//! - **Delegate inference**: the natural delegate type of lambdas and method
//!   groups, synthesizing structural delegate types when no declared one fits
//! - **Type inference**: best common type and bounds-based method type
//!   argument inference, both cancellable
//! - **Overload judgment**: applicability and betterness over gathered
//!   candidates
//!
//! Every query is pure with respect to its inputs and the language version in
//! effect. A [`Compilation`] owns the interned types, the declarations and
//! the shared caches; it is `Send + Sync` and any number of threads may query
//! it at once.
pub mod compilation;
pub mod conversion;
pub mod def;
pub mod delegate;
pub mod diagnostics;
pub mod expr;
mod format;
pub mod infer;
pub mod inheritance;
mod instantiate;
mod intern;
pub mod method;
pub mod overload;
mod query_trace;
pub mod recursion;
pub mod type_queries;
pub mod types;
mod well_known;

pub use coerce_common::{AnalysisOptions, CancellationToken, LanguageVersion};
pub use compilation::Compilation;
pub use conversion::betterness::Betterness;
pub use conversion::{
    BindScope, Conversion, ConversionClassifier, ConversionKind, ConversionSource,
    DeconstructionInfo, UserDefinedConversionAnalysis, UserDefinedConversionResult,
};
pub use def::{DefId, DefKind, DefinitionInfo, DefinitionStore};
pub use delegate::{
    DelegateInferenceError, DelegateSignature, DelegateSource, InferredDelegateType,
    SignatureKey, SignatureParam, SynthesisError, SynthesizedDelegateCache,
    SynthesizedDelegateId, SynthesizedDelegateInfo, collect_for_emit,
};
pub use diagnostics::{UseSiteDiagnostic, UseSiteDiagnostics};
pub use expr::{
    Argument, Expr, ExprId, ExprKind, FunctionFlavor, LambdaBody, LambdaExpr, LambdaParam,
    MethodGroupExpr, Receiver, TupleArg,
};
pub use format::TypeFormatter;
pub use infer::{BestTypeFailure, InferenceArg, InferenceError};
pub use instantiate::{TypeSubstitution, instantiate_type};
pub use intern::TypeInterner;
pub use method::{MethodId, MethodInfo, MethodKind, MethodStore, ParamInfo};
pub use overload::{OverloadJudge, OverloadResolutionResult, RejectedCandidate, RejectionReason};
pub use types::{
    Accessibility, IntrinsicKind, RefKind, TupleElement, TypeArgs, TypeData, TypeId, TypeParamId,
    Variance,
};
pub use well_known::WellKnownTypes;

// Most test modules are loaded by their source files via #[path] declarations.
#[cfg(test)]
#[path = "../tests/fixture.rs"]
pub(crate) mod fixture;
#[cfg(test)]
#[path = "../tests/scenario_tests.rs"]
mod scenario_tests;
#[cfg(test)]
#[path = "../tests/concurrency_tests.rs"]
mod concurrency_tests;
