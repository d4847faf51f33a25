//! Type inference over sets of expressions.
//!
//! - `best_common_type`: the single type representing array elements,
//!   conditional branches and switch arms
//! - `method_type_args`: bounds-based inference of generic method type
//!   arguments
//!
//! Both accept a caller-supplied cancellation token and poll it every
//! `cancellation_check_interval` units of work.

pub mod best_common_type;
pub mod method_type_args;

pub use best_common_type::BestTypeFailure;
pub use method_type_args::{InferenceArg, InferenceError, InferenceValue, InferenceVar};
