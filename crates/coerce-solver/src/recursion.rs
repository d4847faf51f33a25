//! Recursion guard for cycle detection, depth limiting and iteration
//! bounding in recursive conversion computations.
//!
//! Two walks in the conversion core recurse over caller-supplied data:
//! base-class / interface hierarchy walks (which may be cyclic when fed
//! malformed declarations), and nested classification (tuple elements,
//! conditional and switch arms, lambda bodies). Both are bounded here.
//!
//! # Profiles
//!
//! [`RecursionProfile`] names the limits used at each call site:
//!
//! ```ignore
//! let mut guard = RecursionGuard::with_profile(RecursionProfile::HierarchyWalk);
//! ```
//!
//! # Safety
//!
//! - **Debug leak detection**: in debug builds, dropping a guard with active
//!   entries panics, catching forgotten `leave()` calls.
//! - **Debug double-leave detection**: leaving a key that is not being visited
//!   panics in debug builds.
//! - **Overflow protection**: iteration counting saturates.

use coerce_common::limits::{MAX_CONVERSION_DEPTH, MAX_HIERARCHY_DEPTH};
use rustc_hash::FxHashSet;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Base-class and interface hierarchy walks.
    ///
    /// depth = `MAX_HIERARCHY_DEPTH`, iterations = 10,000
    HierarchyWalk,

    /// Nested classification: tuple elements, conditional/switch arms,
    /// lambda bodies.
    ///
    /// depth = `MAX_CONVERSION_DEPTH`
    NestedConversion,

    /// Gathering user-defined operators from the types involved.
    ///
    /// depth = 32, iterations = 10,000
    UserDefinedSearch,

    /// Custom limits for one-off or test scenarios.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::HierarchyWalk => MAX_HIERARCHY_DEPTH,
            Self::NestedConversion => MAX_CONVERSION_DEPTH,
            Self::UserDefinedSearch => 32,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::HierarchyWalk => 10_000,
            Self::NestedConversion => 100_000,
            Self::UserDefinedSearch => 10_000,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed with the computation.
    Entered,
    /// This key is already being visited.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Tracks recursion state for cycle detection, depth limiting and iteration
/// bounding.
///
/// ```ignore
/// match guard.enter(def) {
///     RecursionResult::Entered => {
///         let found = walk_bases(def);
///         guard.leave(def);
///         found
///     }
///     RecursionResult::Cycle => false,
///     RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => false,
/// }
/// ```
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a recursive computation for `key`.
    ///
    /// On [`RecursionResult::Entered`] the caller must call
    /// [`leave`](Self::leave) with the same key when done.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        if self.visiting.contains(&key) {
            return RecursionResult::Cycle;
        }

        self.visiting.insert(key);
        self.depth += 1;
        RecursionResult::Entered
    }

    /// Leave a recursive computation for `key`.
    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);

        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );

        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` inside a guarded scope. Returns `Err(reason)` if entry was
    /// denied.
    pub fn scope<T>(&mut self, key: K, f: impl FnOnce(&mut Self) -> T) -> Result<T, RecursionResult> {
        match self.enter(key) {
            RecursionResult::Entered => {
                let result = f(self);
                self.leave(key);
                Ok(result)
            }
            denied => Err(denied),
        }
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.visiting.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Sticky: stays `true` once any limit was hit.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.visiting.is_empty() {
            panic!(
                "RecursionGuard dropped with {} active entries still in the visiting set",
                self.visiting.len(),
            );
        }
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
