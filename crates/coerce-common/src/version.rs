//! Language versions.
//!
//! Behavior that changed between language versions is keyed by a
//! `LanguageVersion` threaded through every classification and inference entry
//! point. The version set is closed and totally ordered so feature gates can be
//! written as simple comparisons (see [`crate::gates`]).
//!
//! Parsing never fails: an unrecognized version string maps to
//! [`LanguageVersion::OLDEST`], the most conservative behavior.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A language version, ordered from oldest to newest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LanguageVersion {
    V7,
    V7_1,
    V7_2,
    V7_3,
    V8,
    V9,
    V10,
    V11,
    V12,
}

impl LanguageVersion {
    /// The oldest supported version; also the fallback for unknown strings.
    pub const OLDEST: Self = Self::V7;

    /// The newest supported version.
    pub const LATEST: Self = Self::V12;

    /// Every version, oldest first.
    pub const ALL: [Self; 9] = [
        Self::V7,
        Self::V7_1,
        Self::V7_2,
        Self::V7_3,
        Self::V8,
        Self::V9,
        Self::V10,
        Self::V11,
        Self::V12,
    ];

    /// Parse a version string such as `"10"`, `"7.3"`, `"latest"`.
    ///
    /// Unrecognized input yields [`Self::OLDEST`].
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "7" | "7.0" => Self::V7,
            "7.1" => Self::V7_1,
            "7.2" => Self::V7_2,
            "7.3" => Self::V7_3,
            "8" | "8.0" => Self::V8,
            "9" | "9.0" => Self::V9,
            "10" | "10.0" => Self::V10,
            "11" | "11.0" => Self::V11,
            "12" | "12.0" => Self::V12,
            "latest" | "latestmajor" | "preview" | "default" => Self::LATEST,
            _ => Self::OLDEST,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V7 => "7",
            Self::V7_1 => "7.1",
            Self::V7_2 => "7.2",
            Self::V7_3 => "7.3",
            Self::V8 => "8",
            Self::V9 => "9",
            Self::V10 => "10",
            Self::V11 => "11",
            Self::V12 => "12",
        }
    }
}

impl Default for LanguageVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageVersion {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for LanguageVersion {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<LanguageVersion> for String {
    fn from(value: LanguageVersion) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
#[path = "../tests/version_tests.rs"]
mod tests;
