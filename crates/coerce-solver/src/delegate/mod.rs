//! Delegate types of lambdas and method groups.
//!
//! - `signature`: closed invocation signatures of delegates, methods and
//!   lambdas
//! - `infer`: the natural delegate type of a lambda or method group
//! - `synthesized`: structural delegate types created when no `Action`/`Func`
//!   or declared delegate fits, deduplicated per compilation

pub mod infer;
pub mod signature;
pub mod synthesized;

pub use infer::{DelegateInferenceError, DelegateSource, InferredDelegateType};
pub use signature::{DelegateSignature, SignatureParam};
pub use synthesized::{
    SignatureKey, SynthesisError, SynthesizedDelegateCache, SynthesizedDelegateId,
    SynthesizedDelegateInfo, collect_for_emit,
};
