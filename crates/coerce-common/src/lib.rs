//! Common types and utilities for the coerce conversion and inference core.
//!
//! This crate provides foundational types shared by every coerce crate:
//! - String interning (`Atom`, `Interner`)
//! - Language versions and the feature gates keyed by them
//! - Analysis options (the configuration surface)
//! - Cooperative cancellation
//! - Centralized limits and thresholds
//! - The diagnostic message table

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Language versions and per-boundary feature gates
pub mod version;
pub use version::LanguageVersion;
pub mod gates;

// Configuration
pub mod options;
pub use options::AnalysisOptions;

// Cooperative cancellation for long-running inference
pub mod cancel;
pub use cancel::CancellationToken;

// Centralized limits and thresholds
pub mod limits;

// Diagnostic codes and message templates
pub mod diagnostics;
pub use diagnostics::{DiagnosticCategory, DiagnosticMessage};
