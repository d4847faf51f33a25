//! Analysis options.
//!
//! Options are plain data, deserializable from a JSON document with camelCase
//! keys. Every field has a default, so `{}` is a valid configuration.
//!
//! ```json
//! {
//!   "languageVersion": "10",
//!   "allowUnsafe": true,
//!   "numericIntPtrRuntime": true
//! }
//! ```

use crate::limits;
use crate::version::LanguageVersion;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    /// Version used by classifiers created without an explicit override.
    pub language_version: LanguageVersion,

    /// Pointer, stackalloc-to-pointer and `fixed` conversions require unsafe
    /// code to be allowed.
    pub allow_unsafe: bool,

    /// The target runtime treats `IntPtr`/`UIntPtr` as numeric types.
    pub numeric_int_ptr_runtime: bool,

    /// Upper bound on method type inference phase-two rounds.
    pub max_inference_rounds: u32,

    /// Units of inference work between cancellation checks.
    pub cancellation_check_interval: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            language_version: LanguageVersion::default(),
            allow_unsafe: false,
            numeric_int_ptr_runtime: true,
            max_inference_rounds: limits::MAX_INFERENCE_ROUNDS,
            cancellation_check_interval: limits::CANCELLATION_CHECK_INTERVAL,
        }
    }
}

impl AnalysisOptions {
    /// Parse options from a JSON document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = version;
        self
    }

    pub fn with_allow_unsafe(mut self, allow: bool) -> Self {
        self.allow_unsafe = allow;
        self
    }

    pub fn with_numeric_int_ptr_runtime(mut self, numeric: bool) -> Self {
        self.numeric_int_ptr_runtime = numeric;
        self
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod tests;
